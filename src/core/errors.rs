//! Error types for the gocontext library.
//!
//! Errors are split by where they come from: the local filesystem, the
//! configuration layer, project resolution, external tools (`go`, `tree`),
//! and version control. The orchestrator decides which of them are fatal;
//! this module only describes them.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Main result type for gocontext operations.
pub type Result<T> = std::result::Result<T, GoContextError>;

/// Error type for all gocontext operations.
#[derive(Error, Debug)]
pub enum GoContextError {
    /// I/O related errors (file operations, directory creation, links)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Path involved in the failed operation
        path: Option<PathBuf>,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Project root or module resolution errors
    #[error("Project error: {message}")]
    Project {
        /// Error description
        message: String,
        /// Project path being resolved
        path: Option<PathBuf>,
    },

    /// An external tool could not be started or exited unsuccessfully
    #[error("{program} failed: {message}")]
    Tool {
        /// Program name (`go`, `tree`, ...)
        program: String,
        /// Arguments passed to the program
        args: Vec<String>,
        /// Error description, usually trimmed stderr
        message: String,
        /// Exit status when the process ran to completion
        status: Option<ExitStatus>,
    },

    /// Version control errors
    #[error("Version control error: {message}")]
    Vcs {
        /// Error description
        message: String,
        /// Underlying git error
        #[source]
        source: Option<git2::Error>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },
}

impl GoContextError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
            source,
        }
    }

    /// Create a new I/O error carrying the path that failed
    pub fn io_at(message: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new project resolution error
    pub fn project(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Project {
            message: message.into(),
            path,
        }
    }

    /// Create a new external tool error
    pub fn tool<S: AsRef<str>>(
        program: impl Into<String>,
        args: &[S],
        message: impl Into<String>,
        status: Option<ExitStatus>,
    ) -> Self {
        Self::Tool {
            program: program.into(),
            args: args.iter().map(|arg| arg.as_ref().to_string()).collect(),
            message: message.into(),
            status,
        }
    }

    /// Create a new version control error without an underlying git error
    pub fn vcs(message: impl Into<String>) -> Self {
        Self::Vcs {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new validation error with field context
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Prefix the error message with additional context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            Self::Io { message, .. }
            | Self::Config { message, .. }
            | Self::Project { message, .. }
            | Self::Tool { message, .. }
            | Self::Vcs { message, .. }
            | Self::Serialization { message, .. }
            | Self::Validation { message, .. } => {
                *message = format!("{context}: {message}");
            }
        }
        self
    }
}

impl From<io::Error> for GoContextError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<git2::Error> for GoContextError {
    fn from(err: git2::Error) -> Self {
        Self::Vcs {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for GoContextError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for GoContextError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<GoContextError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = GoContextError::config("Invalid configuration");
        assert!(matches!(err, GoContextError::Config { .. }));

        let err = GoContextError::project("not a Go project", None);
        assert!(matches!(err, GoContextError::Project { .. }));
    }

    #[test]
    fn test_io_error_creation() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "Access denied");
        let err = GoContextError::io_at("Failed to create sync directory", "/tmp/out", io_err);

        if let GoContextError::Io {
            message,
            path,
            source,
        } = &err
        {
            assert_eq!(message, "Failed to create sync directory");
            assert_eq!(path.as_deref(), Some(std::path::Path::new("/tmp/out")));
            assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
        } else {
            panic!("Expected Io error");
        }
    }

    #[test]
    fn test_tool_error_display() {
        let err = GoContextError::tool("go", &["list", "./..."], "exit status 1", None);
        let display = err.to_string();
        assert!(display.starts_with("go failed"));
        assert!(display.contains("exit status 1"));

        if let GoContextError::Tool { args, .. } = err {
            assert_eq!(args, vec!["list".to_string(), "./...".to_string()]);
        } else {
            panic!("Expected Tool error");
        }
    }

    #[test]
    fn test_with_context_prefixes_message() {
        let err = GoContextError::validation("empty token").with_context("include list");
        if let GoContextError::Validation { message, .. } = err {
            assert_eq!(message, "include list: empty token");
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_result_ext_with_context() {
        let result: std::result::Result<i32, io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "File not found"));

        let err = result
            .with_context(|| "Reading go.mod".to_string())
            .unwrap_err();
        assert!(matches!(err, GoContextError::Io { .. }));
        assert!(err.to_string().contains("Reading go.mod"));
    }

    #[test]
    fn test_from_git_error() {
        let git_err = git2::Error::from_str("reference 'HEAD' not found");
        let err: GoContextError = git_err.into();
        assert!(matches!(err, GoContextError::Vcs { source: Some(_), .. }));
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<i32>("invalid: yaml: content").unwrap_err();
        let err: GoContextError = yaml_err.into();

        if let GoContextError::Serialization { data_type, .. } = err {
            assert_eq!(data_type, Some("YAML".to_string()));
        } else {
            panic!("Expected Serialization error");
        }
    }
}
