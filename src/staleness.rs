//! Incremental-update policy for extracted package documentation.
//!
//! The decision is a fixed table evaluated top to bottom, where the first
//! row that applies wins:
//!
//! 1. no marker file in the package directory: skip
//! 2. no doc file in the sync directory: update
//! 3. project not under version control: update
//! 4. uncommitted changes under the package directory: update
//! 5. last commit time unknown: update
//! 6. doc file older than the last commit: update, otherwise up to date
//!
//! [`StalenessRecord::decide`] is the pure table. [`StalenessOracle`] gathers
//! the record lazily so version control is only queried when an earlier row
//! has not decided.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::collaborators::vcs::VersionControl;
use crate::core::errors::{GoContextError, Result};
use crate::core::naming::doc_file_name;

/// Why a package was or was not scheduled for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UpdateReason {
    /// The package has no marker file and never gets documentation
    NoDocSource {
        /// Marker file name that was looked for
        marker: String,
    },
    /// No doc file exists yet
    MissingOutput,
    /// The project is not under version control
    NotVersionControlled,
    /// The package directory has uncommitted changes
    UncommittedChanges,
    /// No commit time could be determined for the package directory
    UnknownCommitTime,
    /// The doc file exists but its modification time is unknown
    UnknownDocTime,
    /// The doc file predates the newest commit touching the package
    OutputOlderThanCommit,
    /// The doc file is at least as new as the newest commit
    UpToDate,
}

impl fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDocSource { marker } => write!(f, "no {marker}"),
            Self::MissingOutput => f.write_str("doc file missing"),
            Self::NotVersionControlled => f.write_str("not version controlled"),
            Self::UncommittedChanges => f.write_str("uncommitted changes"),
            Self::UnknownCommitTime => f.write_str("last commit time unknown"),
            Self::UnknownDocTime => f.write_str("doc modification time unknown"),
            Self::OutputOlderThanCommit => f.write_str("doc older than last commit"),
            Self::UpToDate => f.write_str("up to date"),
        }
    }
}

/// Outcome of the decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateDecision {
    /// Whether documentation should be extracted
    pub update: bool,
    /// Table row that decided
    pub reason: UpdateReason,
}

impl UpdateDecision {
    fn update(reason: UpdateReason) -> Self {
        Self {
            update: true,
            reason,
        }
    }

    fn keep(reason: UpdateReason) -> Self {
        Self {
            update: false,
            reason,
        }
    }
}

/// Facts about one package, as far as they were needed to decide.
///
/// Fields left `None` were never queried because an earlier row decided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StalenessRecord {
    /// Marker file present in the package directory
    pub has_doc_source: bool,
    /// Doc file present in the sync directory
    pub doc_exists: bool,
    /// Project lives inside a repository
    pub is_version_controlled: Option<bool>,
    /// Uncommitted changes at or below the package directory
    pub has_uncommitted_changes: Option<bool>,
    /// Newest commit touching the package directory
    pub last_commit_time: Option<DateTime<Utc>>,
    /// Modification time of the existing doc file
    pub doc_modified: Option<DateTime<Utc>>,
}

impl StalenessRecord {
    /// Apply the decision table to fully gathered facts.
    pub fn decide(&self, marker: &str) -> UpdateDecision {
        if !self.has_doc_source {
            return UpdateDecision::keep(UpdateReason::NoDocSource {
                marker: marker.to_string(),
            });
        }
        if !self.doc_exists {
            return UpdateDecision::update(UpdateReason::MissingOutput);
        }
        if self.is_version_controlled != Some(true) {
            return UpdateDecision::update(UpdateReason::NotVersionControlled);
        }
        if self.has_uncommitted_changes == Some(true) {
            return UpdateDecision::update(UpdateReason::UncommittedChanges);
        }
        let Some(committed) = self.last_commit_time else {
            return UpdateDecision::update(UpdateReason::UnknownCommitTime);
        };
        match self.doc_modified {
            None => UpdateDecision::update(UpdateReason::UnknownDocTime),
            Some(modified) if modified < committed => {
                UpdateDecision::update(UpdateReason::OutputOlderThanCommit)
            }
            Some(_) => UpdateDecision::keep(UpdateReason::UpToDate),
        }
    }
}

/// Decision plus the facts it was based on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    /// Table outcome
    pub decision: UpdateDecision,
    /// Facts gathered on the way
    pub record: StalenessRecord,
}

/// Decides whether a package's documentation needs regenerating.
pub struct StalenessOracle<'a> {
    vcs: &'a dyn VersionControl,
    doc_marker: &'a str,
}

impl<'a> StalenessOracle<'a> {
    /// Create an oracle over a version-control handle and a marker file name.
    pub fn new(vcs: &'a dyn VersionControl, doc_marker: &'a str) -> Self {
        Self { vcs, doc_marker }
    }

    /// Evaluate the table for `package` located at `package_dir`.
    ///
    /// Errors are limited to filesystem failures other than "not found" while
    /// probing the marker or the doc file. Version-control failures degrade
    /// towards updating.
    pub fn needs_update(
        &self,
        package: &str,
        package_dir: &Path,
        output_dir: &Path,
    ) -> Result<Assessment> {
        let mut record = StalenessRecord {
            has_doc_source: probe(&package_dir.join(self.doc_marker))?.is_some(),
            ..StalenessRecord::default()
        };
        if !record.has_doc_source {
            return Ok(self.finish(package, record));
        }

        let doc_meta = probe(&output_dir.join(doc_file_name(package)))?;
        record.doc_exists = doc_meta.is_some();
        let Some(doc_meta) = doc_meta else {
            return Ok(self.finish(package, record));
        };

        let versioned = self.vcs.is_repository();
        record.is_version_controlled = Some(versioned);
        if !versioned {
            return Ok(self.finish(package, record));
        }

        let dirty = match self.vcs.has_uncommitted_changes(package_dir) {
            Ok(dirty) => dirty,
            Err(err) => {
                warn!(package, error = %err, "Failed to query uncommitted changes");
                false
            }
        };
        record.has_uncommitted_changes = Some(dirty);
        if dirty {
            return Ok(self.finish(package, record));
        }

        record.last_commit_time = match self.vcs.last_commit_time(package_dir) {
            Ok(time) => time,
            Err(err) => {
                warn!(package, error = %err, "Failed to query last commit time");
                None
            }
        };
        if record.last_commit_time.is_none() {
            return Ok(self.finish(package, record));
        }

        record.doc_modified = doc_meta.modified().ok().map(DateTime::<Utc>::from);
        Ok(self.finish(package, record))
    }

    fn finish(&self, package: &str, record: StalenessRecord) -> Assessment {
        let decision = record.decide(self.doc_marker);
        debug!(package, update = decision.update, reason = %decision.reason, "Staleness decided");
        Assessment { decision, record }
    }
}

fn probe(path: &Path) -> Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(GoContextError::io_at(
            format!("Failed to stat {}", path.display()),
            path,
            err,
        )),
    }
}

#[cfg(test)]
#[path = "staleness_tests.rs"]
mod tests;
