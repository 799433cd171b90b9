//! Project root, Go module and sync directory resolution.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::collaborators::go::PackageLister;
use crate::core::config::{SyncConfig, DEFAULT_OUTPUT_ROOT};
use crate::core::errors::{GoContextError, Result, ResultExt};

/// Module definition file at the root of a Go module.
pub const GO_MOD_FILE: &str = "go.mod";

/// Where a sync run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    /// Canonical project root
    pub root: PathBuf,
    /// Module path from go.mod, empty when unknown
    pub module: String,
    /// Absolute sync directory
    pub output_dir: PathBuf,
    /// Problems that did not stop resolution
    pub warnings: Vec<String>,
}

impl ProjectContext {
    /// Resolve the project, its module and the sync directory.
    ///
    /// Fails when the project path is unusable or does not hold a Go project.
    pub fn resolve(config: &SyncConfig, lister: &dyn PackageLister) -> Result<Self> {
        let requested = config
            .project
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let root = resolve_project_root(&requested)?;

        if !is_go_project(&root, lister) {
            return Err(GoContextError::project(
                format!("{} is not a Go project", root.display()),
                Some(root),
            ));
        }

        let mut warnings = Vec::new();
        let module = match module_name(&root) {
            Ok(module) => module,
            Err(err) => {
                warn!(error = %err, "Couldn't determine module name");
                warnings.push(format!("Couldn't determine module name: {err}"));
                String::new()
            }
        };

        let output_dir = match &config.output {
            Some(path) => absolute_path(path)?,
            None => default_output_dir(&module, &root)?,
        };
        debug!(root = %root.display(), module = %module, output = %output_dir.display(), "Project resolved");

        Ok(Self {
            root,
            module,
            output_dir,
            warnings,
        })
    }
}

/// Resolve the project directory to an absolute, canonical directory path.
pub fn resolve_project_root(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(GoContextError::project(
            format!("Project path does not exist: {}", path.display()),
            Some(path.to_path_buf()),
        ));
    }

    let root = fs::canonicalize(path).map_err(|e| {
        GoContextError::io_at(
            format!("Failed to resolve project path {}", path.display()),
            path,
            e,
        )
    })?;

    if !root.is_dir() {
        return Err(GoContextError::project(
            format!("Project path must be a directory: {}", root.display()),
            Some(root),
        ));
    }

    Ok(root)
}

/// Whether `root` holds a Go project: a `go.mod`, or a package the toolchain
/// can name.
pub fn is_go_project(root: &Path, lister: &dyn PackageLister) -> bool {
    if root.join(GO_MOD_FILE).is_file() {
        return true;
    }
    match lister.import_path(root) {
        Ok(path) => !path.is_empty(),
        Err(err) => {
            debug!(error = %err, "go list could not name the project package");
            false
        }
    }
}

/// Read the module path from `root/go.mod`.
pub fn module_name(root: &Path) -> Result<String> {
    let path = root.join(GO_MOD_FILE);
    let content = fs::read_to_string(&path)
        .map_err(|e| GoContextError::io_at(format!("Failed to read {}", path.display()), &path, e))?;

    parse_module_directive(&content).ok_or_else(|| {
        GoContextError::project(
            format!("module declaration not found in {}", path.display()),
            Some(path),
        )
    })
}

/// Extract the module path from go.mod contents.
pub fn parse_module_directive(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        let rest = rest.split("//").next().unwrap_or_default().trim();
        let name = rest.trim_matches('"').trim_matches('`').trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Directory name for the default sync directory of a project.
pub fn output_dir_name(module: &str, root: &Path) -> String {
    if module.is_empty() {
        return root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_string());
    }
    module.replace(['/', '.'], "_")
}

/// `~/.gocontext/<name>` for a project.
pub fn default_output_dir(module: &str, root: &Path) -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GoContextError::config("Could not determine the home directory"))?;
    Ok(home
        .join(DEFAULT_OUTPUT_ROOT)
        .join(output_dir_name(module, root)))
}

/// Make `path` absolute against the working directory and fold `.` and `..`
/// without touching the filesystem.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    Ok(normalize_path(&cwd.join(path)))
}

/// Lexically fold `.` and `..` components.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let climbs = matches!(
                    normalized.components().next_back(),
                    None | Some(Component::ParentDir)
                );
                if climbs {
                    normalized.push("..");
                } else if matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}
