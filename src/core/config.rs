//! Configuration types for a sync run.
//!
//! A [`SyncConfig`] is built in layers: defaults, then an optional YAML file,
//! then command-line overrides. The library only consumes the final value.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{GoContextError, Result};

/// Name of the directory under the user's home that holds default sync directories.
pub const DEFAULT_OUTPUT_ROOT: &str = ".gocontext";

/// File whose presence in a package directory marks it for doc extraction.
pub const DEFAULT_DOC_MARKER: &str = "doc.go";

/// Extensions linked from explicitly included packages and directories.
pub const DEFAULT_SOURCE_EXTENSIONS: [&str; 4] = ["go", "proto", "tmpl", "txt"];

/// README file names, compared case-insensitively.
pub const DEFAULT_README_NAMES: [&str; 1] = ["readme.md"];

/// Implicit configuration files looked up in the working directory.
pub const IMPLICIT_CONFIG_FILES: [&str; 2] = [".gocontext.yml", ".gocontext.yaml"];

/// Settings for one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Go project to sync; the working directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<PathBuf>,

    /// Sync directory; `~/.gocontext/<module>` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Packages or directories whose source files are linked
    pub include: Vec<String>,

    /// Packages or directories left out of docs, READMEs and sources
    pub exclude: Vec<String>,

    /// Remove the sync directory before populating it
    pub clean: bool,

    /// Evaluate selection and staleness without touching the sync directory
    pub dry_run: bool,

    /// Render `directory_structure.txt` with the `tree` tool
    pub directory_tree: bool,

    /// Marker file that enables doc extraction for a package
    pub doc_marker: String,

    /// README file names (case-insensitive)
    pub readme_names: Vec<String>,

    /// Source file extensions, without the leading dot
    pub source_extensions: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            project: None,
            output: None,
            include: Vec::new(),
            exclude: Vec::new(),
            clean: false,
            dry_run: false,
            directory_tree: true,
            doc_marker: DEFAULT_DOC_MARKER.to_string(),
            readme_names: DEFAULT_README_NAMES.iter().map(|s| s.to_string()).collect(),
            source_extensions: DEFAULT_SOURCE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            GoContextError::io_at(
                format!("Failed to read config file: {}", path.display()),
                &path,
                e,
            )
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config.normalized())
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            GoContextError::io_at(
                format!("Failed to write config file: {}", path.display()),
                &path,
                e,
            )
        })
    }

    /// Trim tokens, drop empty ones and strip leading dots from extensions.
    pub fn normalized(mut self) -> Self {
        self.include = clean_tokens(self.include);
        self.exclude = clean_tokens(self.exclude);
        self.readme_names = clean_tokens(self.readme_names);
        self.source_extensions = clean_tokens(self.source_extensions)
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        self.doc_marker = self.doc_marker.trim().to_string();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.doc_marker.is_empty() {
            return Err(GoContextError::config_field(
                "doc_marker must not be empty",
                "doc_marker",
            ));
        }
        if self.doc_marker.contains(['/', '\\']) {
            return Err(GoContextError::config_field(
                "doc_marker must be a bare file name",
                "doc_marker",
            ));
        }
        if self.readme_names.is_empty() {
            return Err(GoContextError::config_field(
                "readme_names must list at least one file name",
                "readme_names",
            ));
        }
        if self.source_extensions.is_empty() {
            return Err(GoContextError::config_field(
                "source_extensions must list at least one extension",
                "source_extensions",
            ));
        }
        Ok(())
    }

    /// Whether `file_name` is one of the configured README names.
    pub fn is_readme_name(&self, file_name: &str) -> bool {
        self.readme_names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(file_name))
    }

    /// Whether files with this extension are linked as sources.
    pub fn is_source_extension(&self, extension: &str) -> bool {
        self.source_extensions.iter().any(|ext| ext == extension)
    }
}

/// Split a comma-separated list, trimming each element and dropping empties.
pub fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_tokens(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}
