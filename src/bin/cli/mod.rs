//! CLI Module Organization
//!
//! - args: CLI argument structures
//! - commands: command execution
//! - config_layer: merging defaults, the YAML config file and CLI flags

pub mod args;
pub mod commands;
pub mod config_layer;

pub use args::*;
pub use commands::*;
