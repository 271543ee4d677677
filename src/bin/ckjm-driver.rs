//! ckjm-driver CLI
//!
//! Runs design metrics over compiled classes and writes the report, so a
//! build script can call one command instead of wiring the analyzer itself.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // Logs go to stderr; stdout carries the status lines.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => cli::run_command(args)?,
        Commands::PrintDefaultConfig => cli::print_default_config()?,
        Commands::InitConfig(args) => cli::init_config(args)?,
        Commands::ValidateConfig(args) => cli::validate_config(args)?,
    }

    Ok(())
}
