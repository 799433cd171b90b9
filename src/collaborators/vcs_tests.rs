use super::*;
use crate::core::errors::Result;
use git2::{Oid, Signature, Time};
use std::fs;
use tempfile::tempdir;

fn commit_at(repo: &Repository, paths: &[&str], message: &str, seconds: i64) -> Oid {
    let mut index = repo.index().expect("index");
    for path in paths {
        index.add_path(Path::new(path)).expect("add path");
    }
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let sig = Signature::new("Test", "test@example.com", &Time::new(seconds, 0)).expect("signature");

    let parents: Vec<git2::Commit> = repo
        .head()
        .ok()
        .and_then(|reference| reference.peel_to_commit().ok())
        .into_iter()
        .collect();

    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .expect("commit")
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

#[test]
fn detect_without_repository_is_unversioned() -> Result<()> {
    let dir = tempdir()?;
    let vcs = detect(dir.path());
    assert!(!vcs.is_repository());
    assert!(!vcs.is_ignored(dir.path())?);
    assert_eq!(vcs.last_commit_time(dir.path())?, None);
    Ok(())
}

#[test]
fn last_commit_time_is_scoped_to_directory() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    let repo = Repository::init(&root)?;

    write(&root, "a/a.go", "package a\n");
    commit_at(&repo, &["a/a.go"], "add a", 1_000);
    write(&root, "b/b.go", "package b\n");
    commit_at(&repo, &["b/b.go"], "add b", 2_000);

    let git = GitRepository::discover(&root)?;
    assert!(git.is_repository());
    assert_eq!(
        git.last_commit_time(&root.join("a"))?,
        Utc.timestamp_opt(1_000, 0).single()
    );
    assert_eq!(
        git.last_commit_time(&root.join("b"))?,
        Utc.timestamp_opt(2_000, 0).single()
    );
    assert_eq!(
        git.last_commit_time(&root)?,
        Utc.timestamp_opt(2_000, 0).single()
    );
    Ok(())
}

#[test]
fn last_commit_time_is_none_for_untracked_directory() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    let repo = Repository::init(&root)?;

    write(&root, "a/a.go", "package a\n");
    commit_at(&repo, &["a/a.go"], "add a", 1_000);
    write(&root, "new/new.go", "package new\n");

    let git = GitRepository::discover(&root)?;
    assert_eq!(git.last_commit_time(&root.join("new"))?, None);
    Ok(())
}

#[test]
fn last_commit_time_fails_without_head() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    Repository::init(&root)?;

    let git = GitRepository::discover(&root)?;
    assert!(git.last_commit_time(&root).is_err());
    Ok(())
}

#[test]
fn uncommitted_changes_are_scoped_to_directory() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    let repo = Repository::init(&root)?;

    write(&root, "a/a.go", "package a\n");
    write(&root, "b/b.go", "package b\n");
    commit_at(&repo, &["a/a.go", "b/b.go"], "initial", 1_000);

    let git = GitRepository::discover(&root)?;
    assert!(!git.has_uncommitted_changes(&root.join("a"))?);
    assert!(!git.has_uncommitted_changes(&root.join("b"))?);

    write(&root, "a/a.go", "package a\n\nfunc A() {}\n");
    let git = GitRepository::discover(&root)?;
    assert!(git.has_uncommitted_changes(&root.join("a"))?);
    assert!(!git.has_uncommitted_changes(&root.join("b"))?);

    write(&root, "b/extra.go", "package b\n");
    let git = GitRepository::discover(&root)?;
    assert!(git.has_uncommitted_changes(&root.join("b"))?);
    assert!(git.has_uncommitted_changes(&root)?);
    Ok(())
}

#[test]
fn glob_characters_in_directory_names_match_literally() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    let repo = Repository::init(&root)?;

    write(&root, "w*/w.go", "package w\n");
    write(&root, "wx/wx.go", "package wx\n");
    write(&root, "[ab]/ab.go", "package ab\n");
    write(&root, "a/a.go", "package a\n");
    commit_at(&repo, &["w*/w.go", "wx/wx.go", "[ab]/ab.go", "a/a.go"], "initial", 1_000);

    write(&root, "wx/wx.go", "package wx\n\nfunc X() {}\n");
    write(&root, "a/a.go", "package a\n\nfunc A() {}\n");

    let git = GitRepository::discover(&root)?;
    assert!(!git.has_uncommitted_changes(&root.join("w*"))?);
    assert!(!git.has_uncommitted_changes(&root.join("[ab]"))?);
    assert!(git.has_uncommitted_changes(&root.join("wx"))?);
    assert!(git.has_uncommitted_changes(&root.join("a"))?);
    Ok(())
}

#[test]
fn sibling_with_common_prefix_is_not_a_change_below() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    let repo = Repository::init(&root)?;

    write(&root, "api/api.go", "package api\n");
    commit_at(&repo, &["api/api.go"], "add api", 1_000);
    write(&root, "apiv2/api.go", "package apiv2\n");
    commit_at(&repo, &["apiv2/api.go"], "add apiv2", 2_000);
    write(&root, "apiv2/new.go", "package apiv2\n");

    let git = GitRepository::discover(&root)?;
    assert!(!git.has_uncommitted_changes(&root.join("api"))?);
    assert_eq!(
        git.last_commit_time(&root.join("api"))?,
        Utc.timestamp_opt(1_000, 0).single()
    );
    Ok(())
}

#[test]
fn history_is_read_once_per_handle() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    let repo = Repository::init(&root)?;

    write(&root, "a/a.go", "package a\n");
    commit_at(&repo, &["a/a.go"], "add a", 1_000);

    let git = GitRepository::discover(&root)?;
    assert_eq!(
        git.last_commit_time(&root.join("a"))?,
        Utc.timestamp_opt(1_000, 0).single()
    );

    write(&root, "a/a.go", "package a\n\nfunc A() {}\n");
    commit_at(&repo, &["a/a.go"], "change a", 3_000);
    assert_eq!(
        git.last_commit_time(&root.join("a"))?,
        Utc.timestamp_opt(1_000, 0).single()
    );

    let fresh = GitRepository::discover(&root)?;
    assert_eq!(
        fresh.last_commit_time(&root.join("a"))?,
        Utc.timestamp_opt(3_000, 0).single()
    );
    Ok(())
}

#[test]
fn ignore_rules_apply_to_files_and_directories() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    Repository::init(&root)?;

    write(&root, ".gitignore", "build/\n*.log\n");
    write(&root, "build/README.md", "# generated\n");
    write(&root, "debug.log", "noise\n");
    write(&root, "pkg/README.md", "# pkg\n");

    let git = GitRepository::discover(&root)?;
    assert!(git.is_ignored(&root.join("build"))?);
    assert!(git.is_ignored(&root.join("build/README.md"))?);
    assert!(git.is_ignored(&root.join("debug.log"))?);
    assert!(!git.is_ignored(&root.join("pkg/README.md"))?);
    assert!(!git.is_ignored(&root)?);
    Ok(())
}

#[test]
fn paths_outside_the_work_tree_are_errors() -> Result<()> {
    let repo_dir = tempdir()?;
    let other = tempdir()?;
    let root = repo_dir.path().canonicalize()?;
    Repository::init(&root)?;

    let git = GitRepository::discover(&root)?;
    let err = git.has_uncommitted_changes(other.path()).unwrap_err();
    assert!(matches!(err, GoContextError::Vcs { .. }));
    Ok(())
}
