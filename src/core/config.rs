//! Configuration types for a metrics run.
//!
//! A run is described by a [`RunConfiguration`]: where the compiled classes
//! live, where the report goes, which format it is written in and which extra
//! directories the engine may consult when resolving classes outside the
//! analyzed set. File-set inclusion rules belong to the scanner and live in a
//! separate [`ScanConfig`]; both are loaded together from a [`DriverConfig`]
//! YAML document.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::{Result, ResultExt, TaskError};

/// Rendering used for the metrics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum OutputFormat {
    /// One human-readable line per analyzed class
    #[default]
    Plain,
    /// A single XML document wrapping all class results
    Xml,
}

impl OutputFormat {
    /// Map a user-supplied format name onto a format.
    ///
    /// Only the exact string `"xml"` selects XML. Anything else, including
    /// names that are not formats at all, falls back to plain text. The
    /// fallback is reported through a warning rather than an error.
    pub fn from_name(name: &str) -> Self {
        match name {
            "xml" => Self::Xml,
            "plain" => Self::Plain,
            other => {
                warn!("Unrecognized output format '{other}', falling back to plain text");
                Self::Plain
            }
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Xml => "xml",
        }
    }
}

impl From<String> for OutputFormat {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<&str> for OutputFormat {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes of a single orchestrated run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Directory containing the compiled classes to analyze
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_dir: Option<PathBuf>,

    /// Report destination, truncated at the start of every run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,

    /// Report format
    #[serde(default)]
    pub format: OutputFormat,

    /// Extra directories searched when resolving classes outside the analyzed set
    #[serde(default)]
    pub ext_dirs: Vec<PathBuf>,
}

impl RunConfiguration {
    /// Create an empty configuration with the default format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory holding the class files.
    pub fn with_class_dir(mut self, class_dir: impl Into<PathBuf>) -> Self {
        self.class_dir = Some(class_dir.into());
        self
    }

    /// Set the report destination.
    pub fn with_output_file(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = Some(output_file.into());
        self
    }

    /// Set the report format.
    pub fn with_format(mut self, format: impl Into<OutputFormat>) -> Self {
        self.format = format.into();
        self
    }

    /// Append a path fragment to the extension directories.
    pub fn with_ext_dirs(mut self, fragment: impl AsRef<OsStr>) -> Self {
        self.add_ext_dirs(fragment);
        self
    }

    /// Append a path fragment to the extension directories.
    ///
    /// A fragment may hold several entries joined by the platform path
    /// separator; each entry is appended in order after the existing ones.
    /// Empty entries are dropped.
    pub fn add_ext_dirs(&mut self, fragment: impl AsRef<OsStr>) {
        self.ext_dirs.extend(
            std::env::split_paths(fragment.as_ref()).filter(|p| !p.as_os_str().is_empty()),
        );
    }

    /// Check the attributes a run cannot proceed without.
    ///
    /// Touches the file system only to inspect `class_dir`.
    pub fn validate(&self) -> Result<()> {
        let class_dir = self
            .class_dir
            .as_deref()
            .ok_or_else(|| TaskError::config_field("class directory must be set", "class_dir"))?;

        if !class_dir.exists() {
            return Err(TaskError::config_field(
                format!("class directory does not exist: {}", class_dir.display()),
                "class_dir",
            ));
        }
        if !class_dir.is_dir() {
            return Err(TaskError::config_field(
                format!("class directory is not a directory: {}", class_dir.display()),
                "class_dir",
            ));
        }

        if self.output_file.is_none() {
            return Err(TaskError::config_field(
                "output file must be set",
                "output_file",
            ));
        }

        Ok(())
    }
}

/// Inclusion rules applied by the directory scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Glob patterns a file must match to be included; empty means every file
    #[serde(default)]
    pub includes: Vec<String>,

    /// Glob patterns that remove files from the result
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Skip version-control and editor metadata files
    #[serde(default = "default_true")]
    pub default_excludes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            excludes: Vec::new(),
            default_excludes: true,
        }
    }
}

impl ScanConfig {
    /// Reject glob patterns that cannot be compiled.
    pub fn validate(&self) -> Result<()> {
        for (field, patterns) in [("scan.includes", &self.includes), ("scan.excludes", &self.excludes)] {
            for pattern in patterns {
                globset::Glob::new(pattern).map_err(|err| {
                    TaskError::config_field(format!("Invalid glob pattern '{pattern}': {err}"), field)
                })?;
            }
        }
        Ok(())
    }
}

/// Complete configuration document: run attributes plus scanner rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Attributes of the run itself
    #[serde(flatten)]
    pub run: RunConfiguration,

    /// File-set inclusion rules
    #[serde(default)]
    pub scan: ScanConfig,
}

impl DriverConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Structural validation; the class directory is checked when the run starts.
    pub fn validate(&self) -> Result<()> {
        self.scan.validate()
    }
}
