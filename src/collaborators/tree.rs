//! Directory listing through the external `tree` tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::core::errors::{GoContextError, Result};

/// File name of the listing inside the sync directory.
pub const DIRECTORY_STRUCTURE_FILE: &str = "directory_structure.txt";

/// Inputs for one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRequest {
    /// Directory to list
    pub project_root: PathBuf,
    /// File the listing is written to
    pub output_file: PathBuf,
    /// Entry names left out of the listing
    pub ignore_patterns: Vec<String>,
    /// Apply `.gitignore` rules
    pub respect_gitignore: bool,
}

/// Renders a textual directory listing into a file.
pub trait TreeRenderer {
    /// Write the listing described by `request`.
    fn render(&self, request: &TreeRequest) -> Result<()>;
}

/// `tree` command line wrapper.
#[derive(Debug, Clone)]
pub struct TreeCommand {
    program: OsString,
}

impl Default for TreeCommand {
    fn default() -> Self {
        Self::new("tree")
    }
}

impl TreeCommand {
    /// Use `program` as the tree binary.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn ensure_available(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                GoContextError::tool(
                    self.program_name(),
                    &["--version"],
                    format!("tree command not found, install it to get a directory listing: {e}"),
                    None,
                )
            })?;
        if !status.success() {
            return Err(GoContextError::tool(
                self.program_name(),
                &["--version"],
                "tree command is not usable",
                Some(status),
            ));
        }
        Ok(())
    }
}

impl TreeRenderer for TreeCommand {
    fn render(&self, request: &TreeRequest) -> Result<()> {
        self.ensure_available()?;

        let args = tree_args(request);
        debug!(?args, "Rendering directory structure");
        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&request.project_root)
            .output()
            .map_err(|e| GoContextError::tool(self.program_name(), &display_args(&args), e.to_string(), None))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GoContextError::tool(
                self.program_name(),
                &display_args(&args),
                format!("error running tree command: {stderr}"),
                Some(output.status),
            ));
        }
        Ok(())
    }
}

/// Arguments passed to `tree` for a request.
pub fn tree_args(request: &TreeRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--dirsfirst".into(),
        "--noreport".into(),
        "-o".into(),
        request.output_file.clone().into_os_string(),
    ];
    if request.respect_gitignore {
        args.push("--gitignore".into());
    }
    if !request.ignore_patterns.is_empty() {
        args.push("-I".into());
        args.push(request.ignore_patterns.join("|").into());
    }
    args
}

/// Names `tree` should skip: the last segment of every excluded directory,
/// plus the sync directory's name when it sits inside the project.
pub fn ignore_patterns(excluded_dirs: &[String], project_root: &Path, output_dir: &Path) -> Vec<String> {
    let mut patterns: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !name.is_empty() && name != "." && !patterns.iter().any(|p| p == name) {
            patterns.push(name.to_string());
        }
    };

    for dir in excluded_dirs {
        if let Some(name) = dir.trim_end_matches('/').rsplit('/').next() {
            push(name);
        }
    }
    if output_dir.starts_with(project_root) && output_dir != project_root {
        if let Some(name) = output_dir.file_name().and_then(|n| n.to_str()) {
            push(name);
        }
    }
    patterns
}

fn display_args(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(patterns: &[&str], gitignore: bool) -> TreeRequest {
        TreeRequest {
            project_root: PathBuf::from("/work/app"),
            output_file: PathBuf::from("/out/directory_structure.txt"),
            ignore_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            respect_gitignore: gitignore,
        }
    }

    #[test]
    fn args_join_patterns_into_one_flag() {
        let args = display_args(&tree_args(&request(&["internal", "vendor"], true)));
        assert_eq!(
            args,
            vec![
                "--dirsfirst",
                "--noreport",
                "-o",
                "/out/directory_structure.txt",
                "--gitignore",
                "-I",
                "internal|vendor",
            ]
        );
    }

    #[test]
    fn args_without_patterns_or_gitignore() {
        let args = display_args(&tree_args(&request(&[], false)));
        assert_eq!(args, vec!["--dirsfirst", "--noreport", "-o", "/out/directory_structure.txt"]);
    }

    #[test]
    fn patterns_use_last_segment_and_inner_output_dir() {
        let root = Path::new("/work/app");
        let patterns = ignore_patterns(
            &["internal/db".to_string(), "vendor/".to_string(), ".".to_string()],
            root,
            &root.join("ctx"),
        );
        assert_eq!(patterns, vec!["db", "vendor", "ctx"]);

        let outside = ignore_patterns(&[], root, Path::new("/home/me/.gocontext/app"));
        assert!(outside.is_empty());
    }

    #[test]
    fn missing_tree_binary_is_a_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(&[], false);
        req.project_root = dir.path().to_path_buf();
        req.output_file = dir.path().join(DIRECTORY_STRUCTURE_FILE);

        let err = TreeCommand::new("gocontext-no-such-tree").render(&req).unwrap_err();
        assert!(matches!(err, GoContextError::Tool { .. }));
        assert!(err.to_string().contains("tree command not found"));
    }
}
