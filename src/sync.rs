//! Sync orchestration and the run summary.
//!
//! [`SyncOrchestrator::run`] performs one sync:
//!
//! 1. prepare the sync directory (optionally cleaning it first)
//! 2. discover packages and filter them
//! 3. extract documentation for packages the staleness oracle flags
//! 4. link READMEs found by a pruning walk of the project
//! 5. link immediate source files of explicitly included packages and directories
//! 6. render the directory listing
//!
//! Steps 1 and 2 are fatal on failure; everything after is recorded per item
//! in the [`SyncReport`] and the run continues.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collaborators::go::{DocExtractor, PackageDirCache, PackageLister};
use crate::collaborators::linker::{FilesystemLinker, LinkOutcome};
use crate::collaborators::tree::{ignore_patterns, TreeRenderer, TreeRequest, DIRECTORY_STRUCTURE_FILE};
use crate::collaborators::vcs::VersionControl;
use crate::collect::{collect_readmes, collect_sources, Collection, CollectionIssue, TraversalRules};
use crate::core::config::SyncConfig;
use crate::core::errors::{GoContextError, Result, ResultExt};
use crate::core::naming::doc_file_name;
use crate::core::project::{normalize_path, ProjectContext};
use crate::selection::classifier::FilterSpec;
use crate::selection::filter::{filter_packages, ExclusionSet};
use crate::staleness::{StalenessOracle, UpdateReason};

/// External tools a run depends on.
pub struct Collaborators<'a> {
    /// Package discovery
    pub lister: &'a dyn PackageLister,
    /// Documentation extraction
    pub extractor: &'a dyn DocExtractor,
    /// Version control queries
    pub vcs: &'a dyn VersionControl,
    /// Link creation
    pub linker: &'a dyn FilesystemLinker,
    /// Directory listing, `None` when unavailable
    pub tree: Option<&'a dyn TreeRenderer>,
}

/// What happened to one selected package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageOutcome {
    /// Documentation was written
    Extracted,
    /// Existing documentation is current
    UpToDate,
    /// The package has no marker file
    NoDocSource,
    /// Documentation would be written outside a dry run
    WouldExtract,
    /// Resolution, staleness or extraction failed
    Failed,
}

/// Per-package line of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    /// Package identifier
    pub package: String,
    /// Outcome
    pub outcome: PackageOutcome,
    /// Staleness reason or error message
    pub detail: String,
}

/// Links of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSummary {
    /// Newly created links
    pub created: Vec<String>,
    /// Targets that already existed
    pub already_present: Vec<String>,
    /// Links that a dry run would create
    pub planned: Vec<String>,
    /// Directories left out of collection
    pub pruned: Vec<PathBuf>,
    /// Per-item failures
    pub failed: Vec<CollectionIssue>,
}

impl LinkSummary {
    /// Links present after the run, new or old.
    pub fn linked(&self) -> usize {
        self.created.len() + self.already_present.len()
    }
}

/// Result of rendering the directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TreeOutcome {
    /// Disabled by configuration or no renderer
    Disabled,
    /// Not rendered because of a dry run
    Skipped,
    /// Written to this file
    Written {
        /// Listing file
        path: PathBuf,
    },
    /// Rendering failed
    Failed {
        /// Error message
        error: String,
    },
}

/// Summary of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Canonical project root
    pub project_root: PathBuf,
    /// Sync directory
    pub output_dir: PathBuf,
    /// Module path, empty when unknown
    pub module: String,
    /// Whether nothing was written
    pub dry_run: bool,
    /// Packages reported by discovery
    pub discovered_packages: usize,
    /// Packages left after filtering
    pub selected_packages: usize,
    /// Per-package outcomes in discovery order
    pub packages: Vec<PackageReport>,
    /// README links
    pub readmes: LinkSummary,
    /// Source links
    pub sources: LinkSummary,
    /// Directory listing
    pub directory_tree: TreeOutcome,
    /// Non-fatal problems outside the per-item lists
    pub warnings: Vec<String>,
}

impl SyncReport {
    /// Number of packages with the given outcome.
    pub fn count(&self, outcome: PackageOutcome) -> usize {
        self.packages.iter().filter(|p| p.outcome == outcome).count()
    }

    /// True when any item failed.
    pub fn has_failures(&self) -> bool {
        self.count(PackageOutcome::Failed) > 0
            || !self.readmes.failed.is_empty()
            || !self.sources.failed.is_empty()
            || matches!(self.directory_tree, TreeOutcome::Failed { .. })
    }
}

/// Drives one sync run.
pub struct SyncOrchestrator<'a> {
    config: &'a SyncConfig,
    tools: Collaborators<'a>,
    show_progress: bool,
}

impl<'a> SyncOrchestrator<'a> {
    /// Create an orchestrator for a configuration.
    pub fn new(config: &'a SyncConfig, tools: Collaborators<'a>) -> Self {
        Self {
            config,
            tools,
            show_progress: false,
        }
    }

    /// Show a progress bar while extracting documentation.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run a sync for a resolved project.
    pub fn run(&self, project: &ProjectContext) -> Result<SyncReport> {
        let config = self.config;
        let root = project.root.as_path();
        let output_dir = self.prepare_output_dir(project)?;

        let packages = self
            .tools
            .lister
            .list_packages(root)
            .with_context(|| format!("Failed to list packages in {}", root.display()))?;
        let spec = FilterSpec::new(&config.include, &config.exclude, &project.module);
        let selected = filter_packages(&packages, &spec, &project.module);
        info!(
            discovered = packages.len(),
            selected = selected.len(),
            "Packages discovered"
        );

        let mut report = SyncReport {
            project_root: project.root.clone(),
            output_dir: output_dir.clone(),
            module: project.module.clone(),
            dry_run: config.dry_run,
            discovered_packages: packages.len(),
            selected_packages: selected.len(),
            packages: Vec::with_capacity(selected.len()),
            readmes: LinkSummary::default(),
            sources: LinkSummary::default(),
            directory_tree: TreeOutcome::Disabled,
            warnings: project.warnings.clone(),
        };

        let mut cache = PackageDirCache::new();
        report.packages = self.sync_docs(root, &output_dir, &selected, &mut cache);

        let exclusions = ExclusionSet::from_spec(&spec, &project.module);
        let excluded_dirs = exclusions.relative_directories();
        let rules = TraversalRules::new(
            root,
            &output_dir,
            &excluded_dirs,
            self.tools.vcs,
            config,
        );

        report.readmes = self.apply_links(&output_dir, collect_readmes(&rules));

        let (include_dirs, resolve_failures) = self.include_directories(root, &spec, &mut cache);
        let mut sources = collect_sources(&rules, &include_dirs);
        sources.issues.extend(resolve_failures);
        report.sources = self.apply_links(&output_dir, sources);

        report.directory_tree = self.render_tree(project, &output_dir, &excluded_dirs);
        Ok(report)
    }

    fn prepare_output_dir(&self, project: &ProjectContext) -> Result<PathBuf> {
        let output_dir = &project.output_dir;
        if self.config.dry_run {
            return Ok(output_dir.clone());
        }

        if self.config.clean && output_dir.exists() {
            let resolved =
                fs::canonicalize(output_dir).unwrap_or_else(|_| normalize_path(output_dir));
            if project.root.starts_with(&resolved) {
                return Err(GoContextError::validation_field(
                    format!(
                        "Refusing to clean {} because it contains the project",
                        output_dir.display()
                    ),
                    "output",
                ));
            }
            info!(dir = %output_dir.display(), "Cleaning sync directory");
            fs::remove_dir_all(output_dir).map_err(|e| {
                GoContextError::io_at(
                    format!("Failed to clean sync directory {}", output_dir.display()),
                    output_dir,
                    e,
                )
            })?;
        }

        fs::create_dir_all(output_dir).map_err(|e| {
            GoContextError::io_at(
                format!("Failed to create sync directory {}", output_dir.display()),
                output_dir,
                e,
            )
        })?;
        Ok(fs::canonicalize(output_dir).unwrap_or_else(|_| output_dir.clone()))
    }

    fn sync_docs(
        &self,
        root: &Path,
        output_dir: &Path,
        packages: &[String],
        cache: &mut PackageDirCache,
    ) -> Vec<PackageReport> {
        let oracle = StalenessOracle::new(self.tools.vcs, &self.config.doc_marker);
        let progress = self.progress_bar(packages.len() as u64);

        let mut reports = Vec::with_capacity(packages.len());
        for package in packages {
            progress.set_message(package.clone());
            let report = self.sync_package(&oracle, root, output_dir, package, cache);
            if report.outcome == PackageOutcome::Failed {
                warn!(package = %package, error = %report.detail, "Documentation failed");
            }
            reports.push(report);
            progress.inc(1);
        }
        progress.finish_and_clear();
        reports
    }

    fn sync_package(
        &self,
        oracle: &StalenessOracle<'_>,
        root: &Path,
        output_dir: &Path,
        package: &str,
        cache: &mut PackageDirCache,
    ) -> PackageReport {
        let report = |outcome, detail: String| PackageReport {
            package: package.to_string(),
            outcome,
            detail,
        };

        let package_dir = match cache.resolve(self.tools.lister, root, package) {
            Ok(dir) => dir,
            Err(err) => return report(PackageOutcome::Failed, err.to_string()),
        };

        let assessment = match oracle.needs_update(package, &package_dir, output_dir) {
            Ok(assessment) => assessment,
            Err(err) => return report(PackageOutcome::Failed, err.to_string()),
        };
        let reason = assessment.decision.reason.to_string();

        if !assessment.decision.update {
            let outcome = match assessment.decision.reason {
                UpdateReason::NoDocSource { .. } => PackageOutcome::NoDocSource,
                _ => PackageOutcome::UpToDate,
            };
            debug!(package, %reason, "Skipping documentation");
            return report(outcome, reason);
        }

        if self.config.dry_run {
            return report(PackageOutcome::WouldExtract, reason);
        }

        let doc = match self.tools.extractor.extract(root, package, &package_dir) {
            Ok(doc) => doc,
            Err(err) => return report(PackageOutcome::Failed, err.to_string()),
        };

        let doc_path = output_dir.join(doc_file_name(package));
        if let Err(err) = fs::write(&doc_path, doc) {
            let err = GoContextError::io_at(
                format!("Failed to write {}", doc_path.display()),
                &doc_path,
                err,
            );
            return report(PackageOutcome::Failed, err.to_string());
        }
        debug!(package, file = %doc_path.display(), %reason, "Documentation extracted");
        report(PackageOutcome::Extracted, reason)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress || len == 0 {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        let style = ProgressStyle::with_template("{spinner:.blue} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    }

    fn include_directories(
        &self,
        root: &Path,
        spec: &FilterSpec,
        cache: &mut PackageDirCache,
    ) -> (Vec<PathBuf>, Vec<CollectionIssue>) {
        let mut dirs: Vec<PathBuf> = spec
            .include
            .directories
            .iter()
            .map(|dir| root.join(dir))
            .collect();
        let mut failures = Vec::new();

        for package in &spec.include.packages {
            match cache.resolve(self.tools.lister, root, package) {
                Ok(dir) => dirs.push(dir),
                Err(err) => {
                    warn!(package = %package, error = %err, "Failed to resolve included package");
                    failures.push(CollectionIssue {
                        path: PathBuf::from(package),
                        message: err.to_string(),
                    });
                }
            }
        }
        (dirs, failures)
    }

    fn apply_links(&self, output_dir: &Path, collection: Collection) -> LinkSummary {
        let mut summary = LinkSummary {
            pruned: collection.pruned,
            failed: collection.issues,
            ..LinkSummary::default()
        };

        for plan in collection.links {
            if self.config.dry_run {
                summary.planned.push(plan.file_name);
                continue;
            }
            let link_path = output_dir.join(&plan.file_name);
            match self.tools.linker.link(&plan.source, &link_path) {
                Ok(LinkOutcome::Created) => {
                    debug!(link = %plan.file_name, source = %plan.source.display(), "Linked");
                    summary.created.push(plan.file_name);
                }
                Ok(LinkOutcome::AlreadyPresent) => summary.already_present.push(plan.file_name),
                Err(err) => {
                    warn!(link = %plan.file_name, error = %err, "Failed to link");
                    summary.failed.push(CollectionIssue {
                        path: plan.source,
                        message: err.to_string(),
                    });
                }
            }
        }
        summary
    }

    fn render_tree(
        &self,
        project: &ProjectContext,
        output_dir: &Path,
        excluded_dirs: &[String],
    ) -> TreeOutcome {
        let Some(tree) = self.tools.tree.filter(|_| self.config.directory_tree) else {
            return TreeOutcome::Disabled;
        };
        if self.config.dry_run {
            return TreeOutcome::Skipped;
        }

        let request = TreeRequest {
            project_root: project.root.clone(),
            output_file: output_dir.join(DIRECTORY_STRUCTURE_FILE),
            ignore_patterns: ignore_patterns(excluded_dirs, &project.root, output_dir),
            respect_gitignore: self.tools.vcs.is_repository(),
        };
        match tree.render(&request) {
            Ok(()) => TreeOutcome::Written {
                path: request.output_file,
            },
            Err(err) => {
                warn!(error = %err, "Failed to render directory structure");
                TreeOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

/// Render a report as plain text.
pub fn render_text(report: &SyncReport) -> String {
    fn render_section(title: &str, lines: &[String], out: &mut String) {
        out.push_str(title);
        out.push('\n');
        out.push_str(&"-".repeat(title.len()));
        out.push('\n');
        if lines.is_empty() {
            out.push_str("  None\n\n");
            return;
        }
        for line in lines {
            out.push_str("  - ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    fn link_lines(summary: &LinkSummary) -> Vec<String> {
        let mut lines = Vec::new();
        lines.extend(summary.created.iter().map(|name| format!("{name} (linked)")));
        lines.extend(
            summary
                .already_present
                .iter()
                .map(|name| format!("{name} (already present)")),
        );
        lines.extend(summary.planned.iter().map(|name| format!("{name} (would link)")));
        lines.extend(
            summary
                .failed
                .iter()
                .map(|issue| format!("{}: {}", issue.path.display(), issue.message)),
        );
        lines
    }

    let mut output = String::new();
    if report.dry_run {
        output.push_str("Dry run: nothing was written.\n\n");
    }

    let module = if report.module.is_empty() {
        "(unknown module)"
    } else {
        report.module.as_str()
    };
    output.push_str(&format!(
        "Project: {} ({})\nPackages: {} discovered, {} selected\n\n",
        report.project_root.display(),
        module,
        report.discovered_packages,
        report.selected_packages
    ));

    let doc_lines: Vec<String> = report
        .packages
        .iter()
        .filter(|p| p.outcome != PackageOutcome::NoDocSource)
        .map(|p| {
            let label = match p.outcome {
                PackageOutcome::Extracted => "extracted",
                PackageOutcome::UpToDate => "up to date",
                PackageOutcome::WouldExtract => "would extract",
                PackageOutcome::Failed => "failed",
                PackageOutcome::NoDocSource => "no doc source",
            };
            format!("{} - {}: {}", p.package, label, p.detail)
        })
        .collect();
    render_section("Documentation", &doc_lines, &mut output);
    render_section("READMEs", &link_lines(&report.readmes), &mut output);
    render_section("Source files", &link_lines(&report.sources), &mut output);

    let tree_line = match &report.directory_tree {
        TreeOutcome::Disabled => "disabled".to_string(),
        TreeOutcome::Skipped => "skipped (dry run)".to_string(),
        TreeOutcome::Written { path } => path.display().to_string(),
        TreeOutcome::Failed { error } => format!("failed: {error}"),
    };
    render_section("Directory structure", &[tree_line], &mut output);

    if !report.warnings.is_empty() {
        render_section("Warnings", &report.warnings, &mut output);
    }

    output.push_str(&format!(
        "Summary: {} extracted, {} up to date, {} without doc source, {} failed; {} README(s), {} source file(s) linked.\n",
        report.count(PackageOutcome::Extracted) + report.count(PackageOutcome::WouldExtract),
        report.count(PackageOutcome::UpToDate),
        report.count(PackageOutcome::NoDocSource),
        report.count(PackageOutcome::Failed),
        report.readmes.linked() + report.readmes.planned.len(),
        report.sources.linked() + report.sources.planned.len(),
    ));
    output.push_str(&format!(
        "Context synced successfully to: {}\n",
        report.output_dir.display()
    ));
    output
}

/// Render a report as JSON.
pub fn render_json(report: &SyncReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
