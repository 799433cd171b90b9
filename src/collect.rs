//! README and source file collection.
//!
//! Each filesystem node gets an explicit [`NodeVisit`] verdict from
//! [`TraversalRules`]; the drivers ([`collect_readmes`], [`collect_sources`])
//! only act on it. Nothing here touches the sync directory: the result is a
//! list of planned links that the orchestrator executes.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::collaborators::vcs::VersionControl;
use crate::core::config::SyncConfig;
use crate::core::naming::{readme_file_name, source_file_name, OutputCategory};

const GIT_DIR: &str = ".git";

/// Verdict for one node during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeVisit {
    /// Directory whose subtree is left out
    Pruned,
    /// Node ignored without affecting anything below it
    Skipped,
    /// Directory to walk into
    Descend,
    /// File to link into the sync directory
    Link,
}

/// A link the orchestrator should create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkPlan {
    /// README or source
    pub category: OutputCategory,
    /// Absolute path of the file being linked
    pub source: PathBuf,
    /// Path relative to the project root
    pub relative: PathBuf,
    /// Name of the link inside the sync directory
    pub file_name: String,
}

/// A node that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionIssue {
    /// Path involved
    pub path: PathBuf,
    /// What went wrong
    pub message: String,
}

/// Result of one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Collection {
    /// Links to create, in traversal order
    pub links: Vec<LinkPlan>,
    /// Directories left out, relative to the project root
    pub pruned: Vec<PathBuf>,
    /// Per-node failures
    pub issues: Vec<CollectionIssue>,
}

impl Collection {
    fn issue(&mut self, path: &Path, message: impl Into<String>) {
        let message = message.into();
        warn!(path = %path.display(), %message, "Collection problem");
        self.issues.push(CollectionIssue {
            path: path.to_path_buf(),
            message,
        });
    }
}

/// Predicates shared by both traversals.
pub struct TraversalRules<'a> {
    root: &'a Path,
    output_dir: &'a Path,
    excluded: Vec<PathBuf>,
    vcs: &'a dyn VersionControl,
    config: &'a SyncConfig,
}

impl<'a> TraversalRules<'a> {
    /// Build rules for a project.
    ///
    /// `excluded_dirs` are relative to `root`; `.` excludes everything.
    pub fn new(
        root: &'a Path,
        output_dir: &'a Path,
        excluded_dirs: &[String],
        vcs: &'a dyn VersionControl,
        config: &'a SyncConfig,
    ) -> Self {
        let excluded = excluded_dirs
            .iter()
            .map(|dir| {
                if dir == "." {
                    root.to_path_buf()
                } else {
                    root.join(dir)
                }
            })
            .collect();
        Self {
            root,
            output_dir,
            excluded,
            vcs,
            config,
        }
    }

    /// Whether `path` is an excluded directory or lies below one.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|dir| path.starts_with(dir))
    }

    fn is_ignored(&self, path: &Path) -> bool {
        match self.vcs.is_ignored(path) {
            Ok(ignored) => ignored,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to check ignore rules");
                false
            }
        }
    }

    fn prunes_directory(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| name == GIT_DIR)
            || (path != self.root && path == self.output_dir)
            || self.is_excluded(path)
            || self.is_ignored(path)
    }

    /// Verdict for a node met while looking for READMEs.
    pub fn visit_readme_node(&self, path: &Path, is_dir: bool) -> NodeVisit {
        if is_dir {
            return if self.prunes_directory(path) {
                NodeVisit::Pruned
            } else {
                NodeVisit::Descend
            };
        }
        let is_readme = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.config.is_readme_name(name));
        if !is_readme || self.is_excluded(path) || self.is_ignored(path) {
            return NodeVisit::Skipped;
        }
        NodeVisit::Link
    }

    /// Verdict for a node met while collecting sources from one directory.
    pub fn visit_source_node(&self, path: &Path, is_dir: bool) -> NodeVisit {
        if is_dir {
            return if self.prunes_directory(path) {
                NodeVisit::Pruned
            } else {
                NodeVisit::Skipped
            };
        }
        let allowed = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.is_source_extension(ext));
        if !allowed || self.is_excluded(path) || self.is_ignored(path) {
            return NodeVisit::Skipped;
        }
        NodeVisit::Link
    }

    fn relative<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        path.strip_prefix(self.root).ok()
    }
}

/// Walk the whole project for README files.
pub fn collect_readmes(rules: &TraversalRules<'_>) -> Collection {
    let mut collection = Collection::default();
    let mut walker = WalkDir::new(rules.root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(rules.root).to_path_buf();
                collection.issue(&path, err.to_string());
                continue;
            }
        };

        let path = entry.path();
        match rules.visit_readme_node(path, entry.file_type().is_dir()) {
            NodeVisit::Pruned => {
                debug!(path = %path.display(), "Pruned");
                if let Some(rel) = rules.relative(path) {
                    collection.pruned.push(rel.to_path_buf());
                }
                walker.skip_current_dir();
            }
            NodeVisit::Descend | NodeVisit::Skipped => {}
            NodeVisit::Link => match rules.relative(path) {
                Some(rel) => collection.links.push(LinkPlan {
                    category: OutputCategory::Readme,
                    source: path.to_path_buf(),
                    relative: rel.to_path_buf(),
                    file_name: readme_file_name(rel),
                }),
                None => collection.issue(path, "outside the project root"),
            },
        }
    }

    collection
}

/// Collect the immediate source files of each directory.
///
/// Directories are deduplicated by canonical path, and an excluded directory
/// contributes nothing even when it was asked for.
pub fn collect_sources(rules: &TraversalRules<'_>, dirs: &[PathBuf]) -> Collection {
    let mut collection = Collection::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for dir in dirs {
        let canonical = match fs::canonicalize(dir) {
            Ok(path) => path,
            Err(err) => {
                collection.issue(dir, format!("cannot resolve directory: {err}"));
                continue;
            }
        };
        if !seen.insert(canonical.clone()) {
            debug!(dir = %canonical.display(), "Directory already collected");
            continue;
        }
        if !canonical.is_dir() {
            collection.issue(&canonical, "not a directory");
            continue;
        }
        if rules.relative(&canonical).is_none() {
            collection.issue(&canonical, "outside the project root");
            continue;
        }
        if rules.visit_source_node(&canonical, true) == NodeVisit::Pruned {
            debug!(dir = %canonical.display(), "Included directory is excluded");
            if let Some(rel) = rules.relative(&canonical) {
                collection.pruned.push(rel.to_path_buf());
            }
            continue;
        }

        collect_directory(rules, &canonical, &mut collection);
    }

    collection
}

fn collect_directory(rules: &TraversalRules<'_>, dir: &Path, collection: &mut Collection) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            collection.issue(dir, format!("cannot read directory: {err}"));
            return;
        }
    };

    let mut paths: Vec<(PathBuf, bool)> = Vec::new();
    for entry in entries {
        match entry.and_then(|e| Ok((e.path(), e.file_type()?.is_dir()))) {
            Ok(item) => paths.push(item),
            Err(err) => collection.issue(dir, format!("cannot read entry: {err}")),
        }
    }
    paths.sort();

    for (path, is_dir) in paths {
        if rules.visit_source_node(&path, is_dir) != NodeVisit::Link {
            continue;
        }
        if let Some(rel) = rules.relative(&path) {
            collection.links.push(LinkPlan {
                category: OutputCategory::Source,
                source: path.clone(),
                relative: rel.to_path_buf(),
                file_name: source_file_name(rel),
            });
        }
    }
}

#[cfg(test)]
#[path = "collect_tests.rs"]
mod tests;
