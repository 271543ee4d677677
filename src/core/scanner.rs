//! File-set scanning for the class directory.
//!
//! The orchestrator asks a [`FileSetScanner`] for the files under the class
//! directory and never applies rules of its own. The bundled
//! [`DirectoryScanner`] includes every regular file, minus version-control and
//! editor metadata, unless configured with explicit include and exclude globs.

use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::core::config::ScanConfig;
use crate::core::errors::{Result, ResultExt, TaskError};

/// Patterns excluded unless default excludes are turned off.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/CVS/**",
    "**/.cvsignore",
    "**/SCCS/**",
    "**/vssver.scc",
    "**/.svn/**",
    "**/.DS_Store",
    "**/.git/**",
    "**/.gitattributes",
    "**/.gitignore",
    "**/.gitmodules",
    "**/.hg/**",
    "**/.bzr/**",
];

/// Source of the file names a run processes.
pub trait FileSetScanner {
    /// Names of the included files, relative to `root`. Names are returned
    /// exactly as the file system spells them, whether or not they are UTF-8.
    fn included_files(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Recursive scanner with glob-based inclusion rules.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryScanner {
    /// Scanner including every file except the default excludes.
    pub fn new() -> Self {
        let defaults: Vec<String> = DEFAULT_EXCLUDES.iter().map(|p| (*p).to_string()).collect();
        Self {
            include: None,
            exclude: compile_globset(&defaults).unwrap_or(None),
        }
    }

    /// Scanner built from configured rules.
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        let mut excludes = config.excludes.clone();
        if config.default_excludes {
            excludes.extend(DEFAULT_EXCLUDES.iter().map(|p| (*p).to_string()));
        }

        Ok(Self {
            include: compile_globset(&config.includes)?,
            exclude: compile_globset(&excludes)?,
        })
    }

    fn should_keep(&self, relative: &Path) -> bool {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(relative) {
                return false;
            }
        }

        match &self.include {
            Some(include) => include.is_match(relative),
            None => true,
        }
    }
}

impl FileSetScanner for DirectoryScanner {
    fn included_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut names = Vec::new();

        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry
                .map_err(io::Error::from)
                .with_context(|| format!("failed to scan {}", root.display()))?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.should_keep(relative) {
                names.push(relative.to_path_buf());
            } else {
                debug!("Excluded {}", relative.display());
            }
        }

        names.sort();
        info!("Scanned {}: {} files included", root.display(), names.len());
        Ok(names)
    }
}

fn compile_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;

    for pattern in patterns {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }

        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .map_err(|err| TaskError::config(format!("Invalid glob pattern '{pattern}': {err}")))?;
        builder.add(glob);
        added = true;
    }

    if added {
        builder
            .build()
            .map(Some)
            .map_err(|err| TaskError::config(format!("Failed to build glob set: {err}")))
    } else {
        Ok(None)
    }
}
