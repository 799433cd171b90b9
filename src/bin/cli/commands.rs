//! Command execution for the gocontext binary.

use anyhow::Context;
use owo_colors::OwoColorize;
use tracing::info;

use crate::cli::args::{InitConfigArgs, SummaryFormat, SyncArgs};
use crate::cli::config_layer::load_sync_config;
use gocontext::collaborators::go::GoToolchain;
use gocontext::collaborators::linker::SymlinkLinker;
use gocontext::collaborators::tree::TreeCommand;
use gocontext::collaborators::vcs;
use gocontext::sync::{render_json, render_text};
use gocontext::{Collaborators, ProjectContext, SyncConfig, SyncOrchestrator};

/// Run one sync and print its summary.
pub fn sync_command(args: &SyncArgs, verbose: bool) -> anyhow::Result<()> {
    let config = load_sync_config(args)?;
    config.validate()?;

    let go = GoToolchain::default();
    let project = ProjectContext::resolve(&config, &go).context(
        "Make sure you're running this from a Go project directory or pass --project",
    )?;

    let repo = vcs::detect(&project.root);
    if repo.is_repository() {
        info!("Git repository detected, will respect .gitignore patterns");
    }

    let tree = TreeCommand::default();
    let tools = Collaborators {
        lister: &go,
        extractor: &go,
        vcs: repo.as_ref(),
        linker: &SymlinkLinker,
        tree: Some(&tree),
    };

    let show_progress = !verbose && args.format == SummaryFormat::Text;
    let report = SyncOrchestrator::new(&config, tools)
        .with_progress(show_progress)
        .run(&project)?;

    match args.format {
        SummaryFormat::Text => {
            print!("{}", render_text(&report));
            if report.has_failures() && !verbose {
                eprintln!(
                    "{}",
                    "Some items failed; rerun with --verbose for details".yellow()
                );
            }
        }
        SummaryFormat::Json => println!("{}", render_json(&report)?),
    }

    Ok(())
}

/// Print default configuration in YAML format
pub fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default gocontext configuration".dimmed());
    println!(
        "{}",
        "# Save this as .gocontext.yml or pass it with --config".dimmed()
    );
    println!();

    let yaml_output = serde_yaml::to_string(&SyncConfig::default())?;
    println!("{yaml_output}");
    Ok(())
}

/// Initialize a configuration file with defaults
pub fn init_config(args: &InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Configuration file already exists: {}. Use --force to overwrite or choose a different name with --output",
            args.output.display()
        ));
    }

    SyncConfig::default().to_yaml_file(&args.output)?;

    println!(
        "{} {}",
        "Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!(
        "   Run with: {}",
        format!("gocontext --config {}", args.output.display()).cyan()
    );
    Ok(())
}
