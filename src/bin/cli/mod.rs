//! CLI Module Organization
//!
//! - args: clap argument structures
//! - commands: command execution
//! - config_layer: configuration layering and merging

pub mod args;
pub mod commands;
pub mod config_layer;

pub use args::*;
pub use commands::*;
