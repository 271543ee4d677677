//! Extension search-path configuration.
//!
//! The metrics engine resolves classes that are referenced but not analyzed
//! by looking through a list of extension directories. That list is an
//! accumulate-only OS string: every run appends the directories it was given,
//! nothing is ever removed, and nothing is deduplicated.
//!
//! [`ExtensionSearchState`] holds such a value behind a lock so the
//! merge-and-store step is atomic even when several runs share one state.
//! A process-wide instance is available through [`ExtensionSearchState::global`];
//! it starts from the `CKJM_EXT_DIRS` environment variable and is never written
//! back to the OS environment. Each run takes a snapshot of the merged value and
//! hands it to the engine explicitly.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

/// Environment variable seeding the process-wide search path.
pub const EXT_DIRS_ENV: &str = "CKJM_EXT_DIRS";

/// Separator between search-path entries on this platform.
#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
/// Separator between search-path entries on this platform.
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

static GLOBAL_STATE: Lazy<Arc<ExtensionSearchState>> =
    Lazy::new(|| Arc::new(ExtensionSearchState::from_env()));

/// Merges caller-supplied extension directories into an existing search path.
pub struct EnvironmentConfigurer;

impl EnvironmentConfigurer {
    /// Append `additions` to `existing`.
    ///
    /// When `existing` is absent or empty the result is the additions joined by
    /// [`PATH_SEPARATOR`]; otherwise it is `existing`, the separator, then the
    /// joined additions. Entries are neither validated nor deduplicated, and
    /// non-UTF-8 entries are kept byte for byte.
    pub fn merge(existing: Option<&OsStr>, additions: &[PathBuf]) -> OsString {
        let joined = Self::join(additions);

        match existing {
            Some(current) if !current.is_empty() => {
                let mut merged = current.to_os_string();
                if !joined.is_empty() {
                    merged.push(PATH_SEPARATOR.to_string());
                    merged.push(&joined);
                }
                merged
            }
            _ => joined,
        }
    }

    /// Join entries with the platform separator.
    pub fn join(entries: &[PathBuf]) -> OsString {
        let mut joined = OsString::new();
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                joined.push(PATH_SEPARATOR.to_string());
            }
            joined.push(entry);
        }
        joined
    }

    /// Split a search-path value back into its entries, dropping empty ones.
    pub fn split(value: &OsStr) -> Vec<PathBuf> {
        env::split_paths(value)
            .filter(|entry| !entry.as_os_str().is_empty())
            .collect()
    }
}

/// Accumulate-only search-path value shared by the runs that use it.
#[derive(Debug, Default)]
pub struct ExtensionSearchState {
    value: Mutex<Option<OsString>>,
}

impl ExtensionSearchState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state starting from `value`.
    pub fn with_value(value: Option<OsString>) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Create a state seeded from [`EXT_DIRS_ENV`].
    pub fn from_env() -> Self {
        let seed = env::var_os(EXT_DIRS_ENV);
        if let Some(seed) = &seed {
            debug!("Seeding extension search path from {EXT_DIRS_ENV}: '{}'", seed.to_string_lossy());
        }
        Self::with_value(seed)
    }

    /// The process-wide state.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_STATE)
    }

    /// Current value, if any.
    pub fn current(&self) -> Option<OsString> {
        self.value.lock().clone()
    }

    /// Merge `additions` into the stored value and return the new value.
    ///
    /// With no additions the state is left untouched and the current value is
    /// returned.
    pub fn apply(&self, additions: &[PathBuf]) -> Option<OsString> {
        let mut value = self.value.lock();
        if additions.is_empty() {
            return value.clone();
        }

        let merged = EnvironmentConfigurer::merge(value.as_deref(), additions);
        debug!("Extension search path is now '{}'", merged.to_string_lossy());
        *value = Some(merged.clone());
        Some(merged)
    }
}

/// Per-run inputs handed to the metrics engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineContext {
    /// Directories or jar archives searched for classes outside the analyzed
    /// set, in order
    pub extension_dirs: Vec<PathBuf>,
}

impl EngineContext {
    /// Build a context from a search-path snapshot.
    pub fn from_search_path(value: Option<&OsStr>) -> Self {
        Self {
            extension_dirs: value.map(EnvironmentConfigurer::split).unwrap_or_default(),
        }
    }

    /// Build a context with explicit directories.
    pub fn with_extension_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            extension_dirs: dirs.into_iter().map(|d| d.as_ref().to_path_buf()).collect(),
        }
    }
}
