//! Configuration Layer Management
//!
//! Builds the effective configuration for a run from three layers: built-in
//! defaults, an optional YAML file, and command-line overrides.

use std::path::{Path, PathBuf};

use ckjm_driver::core::config::{DriverConfig, OutputFormat};
use tracing::debug;

use crate::cli::args::RunArgs;

/// Config files looked up in the working directory when `--config` is absent.
pub const IMPLICIT_CONFIG_FILES: [&str; 2] = [".ckjm.yml", ".ckjm.yaml"];

/// Trait for merging configuration layers
pub trait ConfigMerge<T> {
    /// Merge another configuration into this one, with the other taking priority
    fn merge_with(&mut self, other: T);
}

/// Convert CLI arguments to partial configuration overrides
pub trait FromCliArgs<T> {
    /// Create a partial configuration from CLI arguments
    fn from_cli_args(args: &T) -> Self;
}

/// Settings given on the command line. Unset values leave lower layers alone.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub class_dir: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub ext_dirs: Vec<PathBuf>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub default_excludes: Option<bool>,
}

impl FromCliArgs<RunArgs> for ConfigOverrides {
    fn from_cli_args(args: &RunArgs) -> Self {
        Self {
            class_dir: args.class_dir.clone(),
            output_file: args.output.clone(),
            format: args.format.as_deref().map(OutputFormat::from_name),
            ext_dirs: args.ext_dirs.clone(),
            includes: args.includes.clone(),
            excludes: args.excludes.clone(),
            default_excludes: args.no_default_excludes.then_some(false),
        }
    }
}

impl ConfigMerge<ConfigOverrides> for DriverConfig {
    fn merge_with(&mut self, other: ConfigOverrides) {
        if other.class_dir.is_some() {
            self.run.class_dir = other.class_dir;
        }
        if other.output_file.is_some() {
            self.run.output_file = other.output_file;
        }
        if let Some(format) = other.format {
            self.run.format = format;
        }

        // Extension directories and scan patterns accumulate across layers.
        for fragment in &other.ext_dirs {
            self.run.add_ext_dirs(fragment);
        }
        self.scan.includes.extend(other.includes);
        self.scan.excludes.extend(other.excludes);

        if let Some(default_excludes) = other.default_excludes {
            self.scan.default_excludes = default_excludes;
        }
    }
}

/// Locate the config file for a run: the explicit one, or an implicit one in `dir`.
pub fn find_config_file(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    IMPLICIT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Effective configuration for `run`.
pub fn build_layered_config(args: &RunArgs) -> anyhow::Result<DriverConfig> {
    let cwd = std::env::current_dir()?;
    let mut config = DriverConfig::default();

    if let Some(config_path) = find_config_file(args.config.as_deref(), &cwd) {
        debug!("Loading configuration from {}", config_path.display());
        config = DriverConfig::from_yaml_file(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load configuration from {}: {}",
                config_path.display(),
                e
            )
        })?;
    }

    config.merge_with(ConfigOverrides::from_cli_args(args));

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckjm_driver::core::config::RunConfiguration;
    use std::fs;
    use tempfile::tempdir;

    fn file_config() -> DriverConfig {
        let mut config = DriverConfig {
            run: RunConfiguration::new()
                .with_class_dir("build/classes")
                .with_output_file("build/ckjm.xml")
                .with_format(OutputFormat::Xml)
                .with_ext_dirs("lib"),
            ..DriverConfig::default()
        };
        config.scan.includes.push("**/*.class".to_string());
        config
    }

    #[test]
    fn empty_overrides_keep_file_values() {
        let mut config = file_config();
        config.merge_with(ConfigOverrides::default());
        assert_eq!(config, file_config());
    }

    #[test]
    fn cli_values_take_priority() {
        let args = RunArgs {
            class_dir: Some(PathBuf::from("out/classes")),
            output: Some(PathBuf::from("out/report.txt")),
            format: Some("plain".to_string()),
            ..RunArgs::default()
        };

        let mut config = file_config();
        config.merge_with(ConfigOverrides::from_cli_args(&args));

        assert_eq!(config.run.class_dir, Some(PathBuf::from("out/classes")));
        assert_eq!(config.run.output_file, Some(PathBuf::from("out/report.txt")));
        assert_eq!(config.run.format, OutputFormat::Plain);
    }

    #[test]
    fn ext_dirs_and_patterns_accumulate() {
        let args = RunArgs {
            ext_dirs: vec![PathBuf::from("vendor")],
            includes: vec!["**/*.jar".to_string()],
            no_default_excludes: true,
            ..RunArgs::default()
        };

        let mut config = file_config();
        config.merge_with(ConfigOverrides::from_cli_args(&args));

        assert_eq!(
            config.run.ext_dirs,
            vec![PathBuf::from("lib"), PathBuf::from("vendor")]
        );
        assert_eq!(config.scan.includes.len(), 2);
        assert!(!config.scan.default_excludes);
    }

    #[test]
    fn implicit_config_file_is_found() {
        let temp = tempdir().unwrap();
        assert_eq!(find_config_file(None, temp.path()), None);

        fs::write(temp.path().join(".ckjm.yaml"), "format: xml\n").unwrap();
        assert_eq!(
            find_config_file(None, temp.path()),
            Some(temp.path().join(".ckjm.yaml"))
        );

        let explicit = temp.path().join("custom.yml");
        assert_eq!(
            find_config_file(Some(&explicit), temp.path()),
            Some(explicit.clone())
        );
    }
}
