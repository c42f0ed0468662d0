//! Reading and writing of configuration files.
//!
//! A configuration file holds a single flat JSON object whose values are
//! all strings:
//!
//! ```json
//! {
//!   "ip_address": "127.0.0.1",
//!   "name": "John Doe",
//!   "port": "1234"
//! }
//! ```
//!
//! Files are written pretty-printed with keys in sorted order. Both
//! pretty-printed and compact files are accepted on read; anything that is
//! not a flat string-to-string object (arrays, nested objects, numbers,
//! booleans, `null`) is rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

/// The key-value pairs of a configuration, ordered by key.
pub type Entries = BTreeMap<String, String>;

/// Errors that can occur when reading a configuration file.
#[derive(Debug)]
pub enum LoadError {
    /// The file exists but could not be read.
    Io {
        /// The file that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        error: io::Error,
    },
    /// The file is not a flat JSON object of string values.
    Json {
        /// The file that caused the error.
        path: PathBuf,
        /// The underlying JSON error.
        error: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the path of the file that failed to load.
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Io { path, .. } | LoadError::Json { path, .. } => path.as_path(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, error } => {
                write!(f, "error reading config file {}: {}", path.display(), error)
            }
            LoadError::Json { path, error } => {
                write!(f, "error parsing config file {}: {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { error, .. } => Some(error),
            LoadError::Json { error, .. } => Some(error),
        }
    }
}

/// Errors that can occur when writing a configuration file.
#[derive(Debug)]
pub enum SaveError {
    /// The file could not be written.
    Io {
        /// The file that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        error: io::Error,
    },
    /// The entries could not be serialized.
    Json {
        /// The file that was being written.
        path: PathBuf,
        /// The underlying JSON error.
        error: serde_json::Error,
    },
}

impl SaveError {
    /// Returns the path of the file that failed to save.
    pub fn path(&self) -> &Path {
        match self {
            SaveError::Io { path, .. } | SaveError::Json { path, .. } => path.as_path(),
        }
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io { path, error } => {
                write!(f, "error saving config file {}: {}", path.display(), error)
            }
            SaveError::Json { path, error } => {
                write!(f, "error serializing config file {}: {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io { error, .. } => Some(error),
            SaveError::Json { error, .. } => Some(error),
        }
    }
}

/// Parses the text of a configuration file.
///
/// A leading UTF-8 byte-order mark is ignored.
///
/// # Examples
///
/// ```
/// use config_store::parse_entries;
///
/// let entries = parse_entries(r#"{"name": "John Doe"}"#).unwrap();
/// assert_eq!(entries["name"], "John Doe");
///
/// assert!(parse_entries("[1, 2, 3]").is_err());
/// assert!(parse_entries(r#"{"port": 1234}"#).is_err());
/// ```
pub fn parse_entries(text: &str) -> Result<Entries, serde_json::Error> {
    serde_json::from_str(text.strip_prefix('\u{FEFF}').unwrap_or(text))
}

/// Formats entries as pretty-printed JSON, without a trailing newline.
///
/// An empty mapping is rendered as `{}`.
pub fn format_entries(entries: &Entries) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}

/// Reads the configuration file at `path`.
///
/// Returns `Ok(None)` if no file exists at `path`, which callers treat as a
/// new, empty configuration.
pub fn read_entries(path: &Path) -> Result<Option<Entries>, LoadError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            trace!(path = %path.display(), "config file does not exist");
            return Ok(None);
        }
        Err(error) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                error,
            });
        }
    };

    let entries = parse_entries(&text).map_err(|error| LoadError::Json {
        path: path.to_path_buf(),
        error,
    })?;
    trace!(path = %path.display(), count = entries.len(), "read config file");
    Ok(Some(entries))
}

/// Writes `entries` to `path`, replacing any existing file.
///
/// The whole document is serialized before the file is opened, so a
/// serialization failure never truncates an existing file.
pub fn write_entries(path: &Path, entries: &Entries) -> Result<(), SaveError> {
    let text = format_entries(entries).map_err(|error| SaveError::Json {
        path: path.to_path_buf(),
        error,
    })?;
    fs::write(path, text).map_err(|error| SaveError::Io {
        path: path.to_path_buf(),
        error,
    })?;
    trace!(path = %path.display(), count = entries.len(), "wrote config file");
    Ok(())
}
