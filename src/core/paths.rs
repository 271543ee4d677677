//! Resolution of scanned file names against the class directory.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Joins relative names onto a base directory.
pub struct PathResolver;

impl PathResolver {
    /// Resolve every name against `base`, preserving order.
    ///
    /// Each result is `base`, the platform separator and the name, as plain
    /// string concatenation. Nothing is normalized and nothing is checked for
    /// existence.
    pub fn resolve<S: AsRef<OsStr>>(base: &Path, names: &[S]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| Self::join(base, name.as_ref()))
            .collect()
    }

    /// Concatenate one name onto `base`.
    pub fn join(base: &Path, name: impl AsRef<OsStr>) -> PathBuf {
        let mut joined = OsString::from(base.as_os_str());
        joined.push(MAIN_SEPARATOR.to_string());
        joined.push(name.as_ref());
        PathBuf::from(joined)
    }
}
