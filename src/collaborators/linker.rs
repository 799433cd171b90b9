//! Symlink creation for READMEs and source files.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::core::errors::{GoContextError, Result};

/// What happened at a link target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    /// A new link was made
    Created,
    /// Something already occupied the target and was left alone
    AlreadyPresent,
}

/// Places links in the sync directory.
pub trait FilesystemLinker {
    /// Make `link` point at `source`. An existing entry at `link` is kept.
    fn link(&self, source: &Path, link: &Path) -> Result<LinkOutcome>;
}

/// Symbolic links on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkLinker;

impl FilesystemLinker for SymlinkLinker {
    fn link(&self, source: &Path, link: &Path) -> Result<LinkOutcome> {
        match fs::symlink_metadata(link) {
            Ok(_) => return Ok(LinkOutcome::AlreadyPresent),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(GoContextError::io_at(
                    format!("Failed to inspect {}", link.display()),
                    link,
                    err,
                ))
            }
        }

        create_symlink(source, link).map_err(|e| {
            GoContextError::io_at(
                format!("Failed to link {} -> {}", link.display(), source.display()),
                link,
                e,
            )
        })?;
        Ok(LinkOutcome::Created)
    }
}

#[cfg(unix)]
fn create_symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn create_symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, link)
}
