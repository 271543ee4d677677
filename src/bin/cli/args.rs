//! CLI Argument Structures
//!
//! Command-line definitions for the `ckjm-driver` binary.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Design metrics for compiled classes, as a build step
#[derive(Parser)]
#[command(name = "ckjm-driver")]
#[command(version = VERSION)]
#[command(about = "Run object-oriented design metrics over a directory of compiled classes")]
#[command(long_about = "
Scan a directory of compiled classes, compute object-oriented design metrics
(WMC, DIT, NOC, CBO, RFC, Ca, NPM) and write them as plain text or XML.

Common Usage:

  # Plain-text report, one line per class
  ckjm-driver run --class-dir build/classes --output build/ckjm.txt

  # XML report, resolving superclasses from the jars in lib/
  ckjm-driver run -d build/classes -o build/ckjm.xml -f xml --ext-dirs lib

  # Settings from a config file (.ckjm.yml is picked up automatically)
  ckjm-driver init-config
  ckjm-driver run
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute metrics for a class directory and write the report
    Run(RunArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to .ckjm.yml or .ckjm.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing the compiled classes
    #[arg(short = 'd', long, env = "CKJM_CLASS_DIR")]
    pub class_dir: Option<PathBuf>,

    /// Report file, truncated before writing
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format: plain or xml (anything else falls back to plain)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Extension entries used to resolve classes outside the analyzed set:
    /// directories of .class files or .jar archives, or jar files themselves.
    /// May be repeated; each value may hold a path-separator list
    #[arg(long = "ext-dirs", value_name = "PATH")]
    pub ext_dirs: Vec<PathBuf>,

    /// Only include files matching this glob (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub includes: Vec<String>,

    /// Exclude files matching this glob (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Do not skip version-control and editor metadata files
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Count platform classes (java.*, javax.*, ...) as couplings
    #[arg(long)]
    pub include_jdk: bool,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".ckjm.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Path to configuration file to validate
    #[arg(short, long, required = true)]
    pub config: PathBuf,
}
