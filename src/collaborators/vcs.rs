//! Version control queries used for staleness checks and traversal pruning.
//!
//! [`GitRepository`] answers the queries with libgit2 instead of shelling out
//! to `git`. Projects without a repository get [`Unversioned`], which reports
//! nothing as ignored or changed; the staleness table never asks it for
//! commit history because it already decided on "not version controlled".

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use git2::{Repository, Sort, StatusOptions};
use tracing::debug;

use crate::core::errors::{GoContextError, Result, ResultExt};

/// Queries the sync engine needs from version control.
///
/// Every query is independently failable; callers decide how a failure
/// degrades.
pub trait VersionControl {
    /// Whether the project lives inside a repository.
    fn is_repository(&self) -> bool;

    /// Whether the path is covered by ignore rules.
    fn is_ignored(&self, path: &Path) -> Result<bool>;

    /// Whether any tracked or untracked change exists at or below the path.
    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool>;

    /// Time of the newest commit touching the path, `None` when no commit does.
    fn last_commit_time(&self, path: &Path) -> Result<Option<DateTime<Utc>>>;
}

/// Stand-in for projects outside any repository.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unversioned;

impl VersionControl for Unversioned {
    fn is_repository(&self) -> bool {
        false
    }

    fn is_ignored(&self, _path: &Path) -> Result<bool> {
        Ok(false)
    }

    fn has_uncommitted_changes(&self, _path: &Path) -> Result<bool> {
        Ok(false)
    }

    fn last_commit_time(&self, _path: &Path) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

/// Git repository backed by libgit2.
///
/// History and working-tree status are each read once, on the first query
/// that needs them, and reused for the lifetime of the handle. One handle
/// serves one sync run.
pub struct GitRepository {
    repo: Repository,
    workdir: PathBuf,
    history: RefCell<Option<std::result::Result<CommitIndex, String>>>,
    changes: RefCell<Option<std::result::Result<Vec<String>, String>>>,
}

impl GitRepository {
    /// Discover the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("Failed to discover git repository at {}", path.display()))?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| GoContextError::vcs("Bare repositories are not supported"))?
            .to_path_buf();
        let workdir = std::fs::canonicalize(&workdir).unwrap_or(workdir);

        Ok(Self {
            repo,
            workdir,
            history: RefCell::new(None),
            changes: RefCell::new(None),
        })
    }

    /// Root of the working tree.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Path relative to the working tree, joined with `/`.
    ///
    /// The working tree root itself maps to an empty string.
    fn pathspec(&self, path: &Path) -> Result<String> {
        let relative = match path.strip_prefix(&self.workdir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => {
                let canonical = std::fs::canonicalize(path).map_err(|e| {
                    GoContextError::io_at("Failed to resolve path", path, e)
                })?;
                canonical
                    .strip_prefix(&self.workdir)
                    .map(Path::to_path_buf)
                    .map_err(|_| {
                        GoContextError::vcs(format!(
                            "{} is outside the repository at {}",
                            path.display(),
                            self.workdir.display()
                        ))
                    })?
            }
        };

        let segments: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Ok(segments.join("/"))
    }
}

impl VersionControl for GitRepository {
    fn is_repository(&self) -> bool {
        true
    }

    fn is_ignored(&self, path: &Path) -> Result<bool> {
        let spec = self.pathspec(path)?;
        if spec.is_empty() {
            return Ok(false);
        }
        Ok(self.repo.is_path_ignored(Path::new(&spec))?)
    }

    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool> {
        let spec = self.pathspec(path)?;
        let mut slot = self.changes.borrow_mut();
        let changes =
            slot.get_or_insert_with(|| changed_paths(&self.repo).map_err(|e| e.to_string()));
        match changes {
            Ok(paths) => {
                let dirty = paths.iter().any(|changed| is_at_or_below(&spec, changed));
                debug!(path = %spec, dirty, "git status");
                Ok(dirty)
            }
            Err(message) => Err(GoContextError::vcs(message.clone())),
        }
    }

    fn last_commit_time(&self, path: &Path) -> Result<Option<DateTime<Utc>>> {
        let spec = self.pathspec(path)?;
        let mut slot = self.history.borrow_mut();
        let history =
            slot.get_or_insert_with(|| CommitIndex::build(&self.repo).map_err(|e| e.to_string()));
        match history {
            Ok(index) => Ok(index.newest(&spec)),
            Err(message) => Err(GoContextError::vcs(message.clone())),
        }
    }
}

/// Open the repository around `root`, or fall back to [`Unversioned`].
pub fn detect(root: &Path) -> Box<dyn VersionControl> {
    match GitRepository::discover(root) {
        Ok(repo) => {
            debug!(workdir = %repo.workdir().display(), "Git repository detected");
            Box::new(repo)
        }
        Err(err) => {
            debug!(error = %err, "No git repository found");
            Box::new(Unversioned)
        }
    }
}

/// Whether `path` equals `dir` or lies below it. An empty `dir` is the
/// working tree root. Both are compared literally, so glob characters in
/// directory names carry no meaning.
fn is_at_or_below(dir: &str, path: &str) -> bool {
    if dir.is_empty() {
        return true;
    }
    match path.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Paths with tracked or untracked changes, relative to the working tree.
fn changed_paths(repo: &Repository) -> Result<Vec<String>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);

    let statuses = repo.statuses(Some(&mut opts))?;
    Ok(statuses
        .iter()
        .filter_map(|entry| entry.path().map(str::to_string))
        .collect())
}

/// Newest commit time for every path and directory touched in history.
///
/// Built from a single walk from HEAD. A commit touches a path when its diff
/// against any parent (or the empty tree, for root commits) lists it.
#[derive(Debug, Default)]
struct CommitIndex {
    newest: HashMap<String, DateTime<Utc>>,
}

impl CommitIndex {
    fn build(repo: &Repository) -> Result<Self> {
        let mut walker = repo.revwalk()?;
        walker.push_head()?;
        walker.set_sorting(Sort::TIME)?;

        let mut index = Self::default();
        let mut commits = 0usize;
        for oid in walker {
            let commit = repo.find_commit(oid?)?;
            let Some(time) = Utc.timestamp_opt(commit.time().seconds(), 0).single() else {
                continue;
            };
            for path in touched_paths(repo, &commit)? {
                index.record(&path, time);
            }
            commits += 1;
        }
        debug!(commits, paths = index.newest.len(), "Commit history indexed");
        Ok(index)
    }

    /// Record `time` for `path`, each of its parent directories and the root.
    fn record(&mut self, path: &str, time: DateTime<Utc>) {
        let mut current = path;
        loop {
            self.newest
                .entry(current.to_string())
                .and_modify(|newest| *newest = (*newest).max(time))
                .or_insert(time);
            if current.is_empty() {
                break;
            }
            current = match current.rfind('/') {
                Some(idx) => &current[..idx],
                None => "",
            };
        }
    }

    fn newest(&self, path: &str) -> Option<DateTime<Utc>> {
        self.newest.get(path).copied()
    }
}

fn touched_paths(repo: &Repository, commit: &git2::Commit<'_>) -> Result<HashSet<String>> {
    let tree = commit.tree()?;
    let mut paths = HashSet::new();
    let mut collect = |diff: git2::Diff<'_>| {
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path().and_then(Path::to_str) {
                    paths.insert(path.to_string());
                }
            }
        }
    };

    if commit.parent_count() == 0 {
        collect(repo.diff_tree_to_tree(None, Some(&tree), None)?);
    } else {
        for parent in commit.parents() {
            let parent_tree = parent.tree()?;
            collect(repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), None)?);
        }
    }
    Ok(paths)
}

#[cfg(test)]
#[path = "vcs_tests.rs"]
mod tests;
