//! Go toolchain access: package discovery and documentation extraction.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::core::errors::{GoContextError, Result};

/// Doc output at or below this many bytes counts as empty.
const EMPTY_DOC_THRESHOLD: usize = 1;

/// Discovers packages and where they live.
pub trait PackageLister {
    /// Import path of the package rooted at `root` (`go list -f {{.ImportPath}} .`).
    fn import_path(&self, root: &Path) -> Result<String>;

    /// Every package below `root`, in the order the tool reports them.
    fn list_packages(&self, root: &Path) -> Result<Vec<String>>;

    /// Directory holding `package`.
    fn package_dir(&self, root: &Path, package: &str) -> Result<PathBuf>;
}

/// Produces documentation text for a package.
pub trait DocExtractor {
    /// Extract documentation for `package`, which lives in `package_dir`.
    fn extract(&self, root: &Path, package: &str, package_dir: &Path) -> Result<String>;
}

/// `go` command line wrapper.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: OsString,
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl GoToolchain {
    /// Use `program` as the go binary.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, root: &Path, args: &[&str]) -> Result<String> {
        let program = self.program.to_string_lossy().into_owned();
        debug!(program = %program, ?args, dir = %root.display(), "Running");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(root)
            .output()
            .map_err(|e| GoContextError::tool(&program, args, format!("failed to start: {e}"), None))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(GoContextError::tool(&program, args, message, Some(output.status)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PackageLister for GoToolchain {
    fn import_path(&self, root: &Path) -> Result<String> {
        let stdout = self.run(root, &["list", "-f", "{{.ImportPath}}", "."])?;
        Ok(stdout.trim().to_string())
    }

    fn list_packages(&self, root: &Path) -> Result<Vec<String>> {
        let stdout = self.run(root, &["list", "./..."])?;
        Ok(parse_lines(&stdout))
    }

    fn package_dir(&self, root: &Path, package: &str) -> Result<PathBuf> {
        let stdout = self.run(root, &["list", "-f", "{{.Dir}}", package])?;
        let dir = stdout.trim();
        if dir.is_empty() {
            return Err(GoContextError::tool(
                self.program.to_string_lossy(),
                &["list", "-f", "{{.Dir}}", package],
                "no directory reported",
                None,
            ));
        }
        Ok(PathBuf::from(dir))
    }
}

impl DocExtractor for GoToolchain {
    fn extract(&self, root: &Path, package: &str, package_dir: &Path) -> Result<String> {
        let target = doc_target(root, package, package_dir);
        let args = ["doc", "-short", "-all", target.as_str()];
        let doc = self.run(root, &args)?;
        if doc.len() <= EMPTY_DOC_THRESHOLD {
            return Err(GoContextError::tool(
                self.program.to_string_lossy(),
                &args,
                "doc is empty",
                None,
            ));
        }
        Ok(doc)
    }
}

/// Argument naming a package for `go doc`.
///
/// Packages inside the project are addressed by relative directory so the
/// root package becomes `.`; anything else falls back to its identifier.
pub fn doc_target(root: &Path, package: &str, package_dir: &Path) -> String {
    let Ok(relative) = package_dir.strip_prefix(root) else {
        return package.to_string();
    };
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        ".".to_string()
    } else {
        format!("./{}", segments.join("/"))
    }
}

fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Package to directory resolutions for one sync run.
#[derive(Debug, Default)]
pub struct PackageDirCache {
    dirs: HashMap<String, PathBuf>,
}

impl PackageDirCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory of `package`, asking `lister` only on the first request.
    pub fn resolve(
        &mut self,
        lister: &dyn PackageLister,
        root: &Path,
        package: &str,
    ) -> Result<PathBuf> {
        if let Some(dir) = self.dirs.get(package) {
            return Ok(dir.clone());
        }
        let dir = lister.package_dir(root, package)?;
        self.dirs.insert(package.to_string(), dir.clone());
        Ok(dir)
    }

    /// Number of memoized packages.
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// True when nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingLister {
        calls: Cell<usize>,
    }

    impl PackageLister for CountingLister {
        fn import_path(&self, _root: &Path) -> Result<String> {
            Ok("example.com/app".to_string())
        }

        fn list_packages(&self, _root: &Path) -> Result<Vec<String>> {
            Ok(vec!["example.com/app".to_string()])
        }

        fn package_dir(&self, root: &Path, package: &str) -> Result<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            match package.strip_prefix("example.com/app/") {
                Some(rel) => Ok(root.join(rel)),
                None => Err(GoContextError::tool("go", &["list"], "unknown package", None)),
            }
        }
    }

    #[test]
    fn doc_target_uses_relative_directories() {
        let root = Path::new("/work/app");
        assert_eq!(doc_target(root, "example.com/app", root), ".");
        assert_eq!(
            doc_target(root, "example.com/app/internal/db", &root.join("internal/db")),
            "./internal/db"
        );
        assert_eq!(
            doc_target(root, "example.com/vendored", Path::new("/elsewhere/vendored")),
            "example.com/vendored"
        );
    }

    #[test]
    fn parse_lines_drops_blank_lines() {
        assert_eq!(
            parse_lines("example.com/app\n\n  example.com/app/api \n"),
            vec!["example.com/app".to_string(), "example.com/app/api".to_string()]
        );
    }

    #[test]
    fn cache_resolves_each_package_once() {
        let lister = CountingLister {
            calls: Cell::new(0),
        };
        let root = Path::new("/work/app");
        let mut cache = PackageDirCache::new();

        let first = cache.resolve(&lister, root, "example.com/app/api").unwrap();
        let second = cache.resolve(&lister, root, "example.com/app/api").unwrap();
        assert_eq!(first, root.join("api"));
        assert_eq!(first, second);
        assert_eq!(lister.calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_does_not_memoize_failures() {
        let lister = CountingLister {
            calls: Cell::new(0),
        };
        let mut cache = PackageDirCache::new();
        assert!(cache.resolve(&lister, Path::new("/w"), "other.org/x").is_err());
        assert!(cache.resolve(&lister, Path::new("/w"), "other.org/x").is_err());
        assert_eq!(lister.calls.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_program_is_a_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let go = GoToolchain::new("gocontext-no-such-go-binary");
        let err = go.list_packages(dir.path()).unwrap_err();
        match err {
            GoContextError::Tool {
                program,
                args,
                status,
                ..
            } => {
                assert_eq!(program, "gocontext-no-such-go-binary");
                assert_eq!(args, vec!["list".to_string(), "./...".to_string()]);
                assert!(status.is_none());
            }
            other => panic!("Expected Tool error, got {other:?}"),
        }
    }
}
