//! CLI argument definitions for the gocontext binary.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sync a Go project's docs, READMEs and sources into one flat directory
#[derive(Parser, Debug)]
#[command(name = "gocontext")]
#[command(version = VERSION)]
#[command(about = "Sync a Go project's documentation and sources into a flat context directory")]
#[command(long_about = "
Extracts `go doc` output for every package carrying a doc.go, links every
README.md and, for explicitly included packages or directories, their source
files into one flat directory. Documentation is only regenerated when git
history or local changes show the package moved on.

Common Usage:

  # Sync the current project into ~/.gocontext/<module>
  gocontext

  # Include sources of one package, skip a directory tree
  gocontext --include example.com/app/api --exclude internal

  # Preview what would change
  gocontext --dry-run --format json

  # Write a starter configuration file
  gocontext init-config
")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub sync: SyncArgs,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync the project (default when no subcommand is given)
    Sync(SyncArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),
}

/// Options for a sync run
#[derive(Args, Debug, Default, Clone)]
pub struct SyncArgs {
    /// Path to the Go project [default: current directory]
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Path for the sync directory [default: ~/.gocontext/<module>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma-separated packages or directories to link source files from
    #[arg(short, long)]
    pub include: Option<String>,

    /// Comma-separated packages or directories to leave out
    #[arg(short, long)]
    pub exclude: Option<String>,

    /// Remove the sync directory before populating it
    #[arg(long)]
    pub clean: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip directory_structure.txt
    #[arg(long)]
    pub no_tree: bool,

    /// Configuration file [default: .gocontext.yml in the working directory]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Summary format
    #[arg(long, value_enum, default_value = "text")]
    pub format: SummaryFormat,
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".gocontext.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

/// Summary rendering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    /// Sectioned human-readable summary
    #[default]
    Text,
    /// Pretty-printed JSON report
    Json,
}
