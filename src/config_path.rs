//! Resolution of configuration file paths.
//!
//! Callers may name a configuration by a bare name such as `settings`; the
//! `.json` suffix is appended when it is missing. A path whose final
//! component already ends with `.json` (in any letter case) is used as-is.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The suffix every configuration file carries.
pub const CONFIG_SUFFIX: &str = ".json";

/// Appends [`CONFIG_SUFFIX`] to `path` unless it already ends with it.
///
/// The comparison is case-insensitive, and the suffix is appended to the
/// whole file name rather than replacing an existing extension.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
///
/// use config_store::normalize_config_path;
///
/// assert_eq!(normalize_config_path("settings"), PathBuf::from("settings.json"));
/// assert_eq!(normalize_config_path("app.JSON"), PathBuf::from("app.JSON"));
/// assert_eq!(normalize_config_path("app.v2"), PathBuf::from("app.v2.json"));
/// ```
pub fn normalize_config_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if has_config_suffix(path) {
        return path.to_path_buf();
    }
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(CONFIG_SUFFIX);
    PathBuf::from(raw)
}

fn has_config_suffix(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|name| name.ends_with(CONFIG_SUFFIX))
}

/// Returns true if a configuration file exists at the normalized `path`.
pub fn config_exists(path: impl AsRef<Path>) -> bool {
    normalize_config_path(path).is_file()
}

/// Returns the directory used for configurations named without a directory.
///
/// This is the user's documents directory, falling back to the home
/// directory, and finally to `.` if neither can be determined.
#[cfg(feature = "default-dirs")]
pub fn default_directory() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the normalized path of `name` inside [`default_directory`].
///
/// ```
/// use config_store::{default_config_path, default_directory};
///
/// let path = default_config_path("test_config");
/// assert!(path.starts_with(default_directory()));
/// assert!(path.ends_with("test_config.json"));
/// ```
#[cfg(feature = "default-dirs")]
pub fn default_config_path(name: impl AsRef<Path>) -> PathBuf {
    default_directory().join(normalize_config_path(name))
}
