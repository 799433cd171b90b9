//! Configuration Layer Management
//!
//! Builds the effective [`SyncConfig`] from defaults, an optional YAML file and
//! CLI flags, each layer taking priority over the previous one.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cli::args::SyncArgs;
use gocontext::core::config::{split_tokens, SyncConfig, IMPLICIT_CONFIG_FILES};

/// Trait for merging configuration layers
pub trait ConfigMerge<T> {
    /// Merge another layer into this one, with the other taking priority
    fn merge_with(&mut self, other: T);
}

impl ConfigMerge<&SyncArgs> for SyncConfig {
    /// Only flags the user actually passed override the file layer.
    fn merge_with(&mut self, args: &SyncArgs) {
        if let Some(project) = &args.project {
            self.project = Some(project.clone());
        }
        if let Some(output) = &args.output {
            self.output = Some(output.clone());
        }
        if let Some(include) = &args.include {
            self.include = split_tokens(include);
        }
        if let Some(exclude) = &args.exclude {
            self.exclude = split_tokens(exclude);
        }
        if args.clean {
            self.clean = true;
        }
        if args.dry_run {
            self.dry_run = true;
        }
        if args.no_tree {
            self.directory_tree = false;
        }
    }
}

/// Explicit config path, or the first implicit one present in `dir`.
pub fn find_config_file(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        IMPLICIT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}

/// Load the effective configuration for a sync run.
pub fn load_sync_config(args: &SyncArgs) -> anyhow::Result<SyncConfig> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    load_sync_config_in(args, &cwd)
}

fn load_sync_config_in(args: &SyncArgs, dir: &Path) -> anyhow::Result<SyncConfig> {
    let mut config = match find_config_file(args.config.as_deref(), dir) {
        Some(path) => SyncConfig::from_yaml_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SyncConfig::default(),
    };
    config.merge_with(args);
    Ok(config.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Commands, SummaryFormat};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn top_level_flags_act_as_sync() {
        let cli = Cli::parse_from([
            "gocontext",
            "--include",
            "api, cmd",
            "--exclude",
            "internal",
            "--dry-run",
            "--format",
            "json",
        ]);
        assert!(cli.command.is_none());
        assert_eq!(cli.sync.include.as_deref(), Some("api, cmd"));
        assert!(cli.sync.dry_run);
        assert_eq!(cli.sync.format, SummaryFormat::Json);
    }

    #[test]
    fn sync_subcommand_accepts_the_same_flags() {
        let cli = Cli::parse_from(["gocontext", "sync", "--clean", "--no-tree", "-v"]);
        match cli.command {
            Some(Commands::Sync(args)) => {
                assert!(args.clean);
                assert!(args.no_tree);
            }
            other => panic!("Expected sync subcommand, got {other:?}"),
        }
        assert!(cli.verbose);
    }

    #[test]
    fn cli_flags_override_file_values() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(".gocontext.yml"),
            "include: [api]\nexclude: [vendor]\ndirectory_tree: true\n",
        )?;

        let args = SyncArgs {
            exclude: Some("internal, testdata".to_string()),
            no_tree: true,
            ..SyncArgs::default()
        };
        let config = load_sync_config_in(&args, dir.path())?;

        assert_eq!(config.include, vec!["api".to_string()]);
        assert_eq!(
            config.exclude,
            vec!["internal".to_string(), "testdata".to_string()]
        );
        assert!(!config.directory_tree);
        Ok(())
    }

    #[test]
    fn defaults_apply_without_config_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = load_sync_config_in(&SyncArgs::default(), dir.path())?;
        assert_eq!(config, SyncConfig::default());
        Ok(())
    }

    #[test]
    fn explicit_config_path_wins_over_implicit_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(".gocontext.yml"), "clean: false\n")?;
        let explicit = dir.path().join("custom.yml");
        fs::write(&explicit, "clean: true\ndoc_marker: package.go\n")?;

        let args = SyncArgs {
            config: Some(explicit),
            ..SyncArgs::default()
        };
        let config = load_sync_config_in(&args, dir.path())?;
        assert!(config.clean);
        assert_eq!(config.doc_marker, "package.go");
        Ok(())
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempdir().unwrap();
        let args = SyncArgs {
            config: Some(dir.path().join("absent.yml")),
            ..SyncArgs::default()
        };
        assert!(load_sync_config_in(&args, dir.path()).is_err());
    }
}
