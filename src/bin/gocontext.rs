//! gocontext CLI - flat documentation and source snapshots of Go projects
//!
//! Syncs package docs, READMEs and selected source files of a Go project into
//! one directory that tools without directory traversal can read.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise per-item warnings only show up with --verbose
    let default_level = if cli.verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Sync(args)) => cli::sync_command(&args, cli.verbose)?,
        Some(Commands::PrintDefaultConfig) => cli::print_default_config()?,
        Some(Commands::InitConfig(args)) => cli::init_config(&args)?,
        None => cli::sync_command(&cli.sync, cli.verbose)?,
    }

    Ok(())
}
