//! Command implementations for the `ckjm-driver` binary.

use owo_colors::OwoColorize;
use tracing::debug;

use ckjm_driver::core::config::{DriverConfig, OutputFormat, RunConfiguration};
use ckjm_driver::core::scanner::DirectoryScanner;
use ckjm_driver::engine::ClassFileEngine;
use ckjm_driver::{RunOutcome, TaskOrchestrator};

use crate::cli::args::{InitConfigArgs, RunArgs, ValidateConfigArgs};
use crate::cli::config_layer::build_layered_config;

/// Compute metrics for the configured class directory.
pub fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let config = build_layered_config(&args)?;
    debug!("Effective configuration: {:?}", config);

    let scanner = DirectoryScanner::from_config(&config.scan)?;
    let engine = ClassFileEngine::new().with_jdk_coupling(args.include_jdk);
    let orchestrator = TaskOrchestrator::new()
        .with_scanner(scanner)
        .with_engine(engine);

    let outcome = orchestrator
        .execute(&config.run)
        .map_err(|err| anyhow::Error::new(err).context("Metrics run failed"))?;

    match outcome {
        RunOutcome::NoFiles => {
            println!(
                "{}",
                "⚠️  No class files found; report not written".yellow()
            );
        }
        RunOutcome::Completed(summary) => {
            println!(
                "{} {}",
                "✅ Report written to:".bright_green().bold(),
                summary.output_file.display().to_string().cyan()
            );
            println!(
                "   {} classes from {} files ({} format)",
                summary.classes_reported,
                summary.files_scanned,
                summary.format
            );
            if summary.files_skipped > 0 {
                println!(
                    "   {}",
                    format!("{} files skipped", summary.files_skipped).yellow()
                );
            }
        }
    }

    Ok(())
}

/// Print default configuration in YAML format
pub fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default ckjm-driver configuration".dimmed());
    println!(
        "{}",
        "# Save this to .ckjm.yml and customize as needed".dimmed()
    );
    println!();

    let yaml_output = serde_yaml::to_string(&DriverConfig::default())?;
    println!("{}", yaml_output);

    Ok(())
}

/// Configuration written by `init-config`.
fn starter_config() -> DriverConfig {
    DriverConfig {
        run: RunConfiguration::new()
            .with_class_dir("build/classes")
            .with_output_file("build/reports/ckjm.txt")
            .with_format(OutputFormat::Plain),
        ..DriverConfig::default()
    }
}

/// Initialize a configuration file with defaults
pub fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Configuration file already exists: {}. Use --force to overwrite or choose a different name with --output",
            args.output.display()
        ));
    }

    starter_config().to_yaml_file(&args.output)?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "📝 Next steps:".bright_blue().bold());
    println!("   1. Point class_dir at your compiled classes");
    println!(
        "   2. Run with: {}",
        format!("ckjm-driver run --config {}", args.output.display()).cyan()
    );

    Ok(())
}

/// Validate a configuration file
pub fn validate_config(args: ValidateConfigArgs) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        args.config.display().to_string().cyan()
    );

    let config = DriverConfig::from_yaml_file(&args.config).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration from {}: {}",
            args.config.display(),
            e
        )
    })?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    println!("{}", "✅ Configuration is valid!".bright_green().bold());
    if let Some(class_dir) = &config.run.class_dir {
        println!("   class_dir: {}", class_dir.display());
    }
    if let Some(output_file) = &config.run.output_file {
        println!("   output_file: {}", output_file.display());
    }
    println!("   format: {}", config.run.format);
    if !config.run.ext_dirs.is_empty() {
        println!("   ext_dirs: {} entries", config.run.ext_dirs.len());
    }

    Ok(())
}
