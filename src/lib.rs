//! # gocontext: flat context snapshots of Go projects
//!
//! Assembles a Go project's package documentation, READMEs and selected
//! source files into one flat directory, so a reader that cannot walk a
//! directory tree still sees the whole project.
//!
//! - **Selection**: include/exclude tokens are classified as packages or
//!   directories, and exclusions remove whole package subtrees
//! - **Staleness**: documentation is only regenerated when the package changed
//!   since the last extraction, judged against git history
//! - **Collection**: READMEs are found by a pruning walk; sources are linked
//!   from explicitly included packages and directories
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     SyncOrchestrator                      │
//! ├──────────────┬───────────────┬─────────────┬─────────────┤
//! │  Selection   │   Staleness   │  Collection │   Report    │
//! │ • classifier │ • decision    │ • READMEs   │ • text      │
//! │ • filter     │   table       │ • sources   │ • JSON      │
//! ├──────────────┴───────────────┴─────────────┴─────────────┤
//! │  Collaborators: go, git2, symlinks, tree                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gocontext::collaborators::{go::GoToolchain, linker::SymlinkLinker, tree::TreeCommand, vcs};
//! use gocontext::{Collaborators, ProjectContext, SyncConfig, SyncOrchestrator};
//!
//! fn main() -> gocontext::Result<()> {
//!     let config = SyncConfig::default();
//!     let go = GoToolchain::default();
//!     let project = ProjectContext::resolve(&config, &go)?;
//!     let repo = vcs::detect(&project.root);
//!     let tree = TreeCommand::default();
//!
//!     let tools = Collaborators {
//!         lister: &go,
//!         extractor: &go,
//!         vcs: repo.as_ref(),
//!         linker: &SymlinkLinker,
//!         tree: Some(&tree),
//!     };
//!     let report = SyncOrchestrator::new(&config, tools).run(&project)?;
//!     print!("{}", gocontext::sync::render_text(&report));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Configuration, errors and naming
pub mod core {
    //! Configuration, errors, project resolution and output naming.

    pub mod config;
    pub mod errors;
    pub mod naming;
    pub mod project;
}

// Include/exclude handling
pub mod selection {
    //! Token classification and package filtering.

    pub mod classifier;
    pub mod filter;
}

// External tools behind narrow traits
pub mod collaborators {
    //! Go toolchain, version control, link and tree collaborators.

    pub mod go;
    pub mod linker;
    pub mod tree;
    pub mod vcs;
}

pub mod collect;
pub mod staleness;
pub mod sync;

// Re-export primary types for convenience
pub use core::config::SyncConfig;
pub use core::errors::{GoContextError, Result, ResultExt};
pub use core::project::ProjectContext;
pub use selection::classifier::{classify, FilterSpec, TokenKind};
pub use selection::filter::filter_packages;
pub use staleness::{StalenessOracle, UpdateDecision, UpdateReason};
pub use sync::{Collaborators, SyncOrchestrator, SyncReport};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
