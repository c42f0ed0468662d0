use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config_file::{self, Entries, LoadError, SaveError};
use crate::config_path::normalize_config_path;

/// Errors returned when an operation is called out of lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    /// No file path has been bound yet. Call `bind_path` first.
    PathNotBound,
    /// A file path has already been bound to this store.
    PathAlreadyBound,
    /// The bound file has not been loaded yet. Call `load` first.
    NotLoaded,
    /// There are unsaved changes that would be lost. Call `save` first.
    UnsavedChanges,
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::PathNotBound => write!(f, "config file path not bound"),
            UsageError::PathAlreadyBound => {
                write!(f, "config file path already bound")
            }
            UsageError::NotLoaded => write!(f, "config file not loaded"),
            UsageError::UnsavedChanges => {
                write!(f, "config has unsaved changes that would be lost")
            }
        }
    }
}

impl std::error::Error for UsageError {}

/// Any error returned by a [`ConfigStore`] operation.
#[derive(Debug)]
pub enum StoreError {
    /// An operation was called out of lifecycle order.
    Usage(UsageError),
    /// The bound file exists but could not be read or parsed.
    Load(LoadError),
    /// The bound file could not be written.
    Save(SaveError),
}

impl StoreError {
    /// Returns true if this is a lifecycle violation.
    pub fn is_usage(&self) -> bool {
        matches!(self, StoreError::Usage(_))
    }

    /// Returns true if this is a failure to read or parse the file.
    pub fn is_load(&self) -> bool {
        matches!(self, StoreError::Load(_))
    }

    /// Returns true if this is a failure to write the file.
    pub fn is_save(&self) -> bool {
        matches!(self, StoreError::Save(_))
    }

    /// Returns the lifecycle violation, if this is one.
    pub fn usage(&self) -> Option<UsageError> {
        match self {
            StoreError::Usage(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Usage(e) => write!(f, "{}", e),
            StoreError::Load(e) => write!(f, "{}", e),
            StoreError::Save(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Usage(e) => Some(e),
            StoreError::Load(e) => Some(e),
            StoreError::Save(e) => Some(e),
        }
    }
}

impl From<UsageError> for StoreError {
    fn from(error: UsageError) -> Self {
        StoreError::Usage(error)
    }
}

impl From<LoadError> for StoreError {
    fn from(error: LoadError) -> Self {
        StoreError::Load(error)
    }
}

impl From<SaveError> for StoreError {
    fn from(error: SaveError) -> Self {
        StoreError::Save(error)
    }
}

/// A string key-value configuration persisted as a flat JSON file.
///
/// A store moves through a fixed lifecycle:
///
/// 1. **Unbound**: created with [`ConfigStore::new`]. Every operation other
///    than [`bind_path`](Self::bind_path) fails with
///    [`UsageError::PathNotBound`].
/// 2. **Bound**: a file path has been recorded. The path can be bound only
///    once; use a new store for a different file.
/// 3. **Loaded**: [`load`](Self::load) has read the file, or found that it
///    does not exist yet. Reads and writes are now permitted.
/// 4. **Dirty / clean**: every mutation marks the store dirty; a successful
///    [`save`](Self::save) marks it clean again. Loading while dirty fails
///    with [`UsageError::UnsavedChanges`] instead of discarding the edits.
///
/// Mutations are held in memory until `save` writes the whole mapping back
/// to disk.
///
/// # Examples
///
/// ```
/// use config_store::ConfigStore;
///
/// let dir = tempfile::tempdir().unwrap();
///
/// let mut store = ConfigStore::new();
/// store.bind_path(dir.path().join("settings")).unwrap();
/// store.load().unwrap();
///
/// let port = store.value_or("port", "1234").unwrap().to_string();
/// store.set_value("port", port).unwrap();
/// assert!(store.is_dirty());
///
/// store.save().unwrap();
/// assert!(!store.is_dirty());
///
/// let reopened = ConfigStore::open(dir.path().join("settings.json")).unwrap();
/// assert_eq!(reopened.value("port").unwrap(), Some("1234"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConfigStore {
    file_path: Option<PathBuf>,
    entries: Entries,
    loaded: bool,
    dirty: bool,
}

impl ConfigStore {
    /// Creates a new, unbound store with no entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store bound to `path` and loads it.
    ///
    /// The path is normalized as in [`bind_path`](Self::bind_path). A
    /// missing file yields an empty store that will create the file on
    /// [`save`](Self::save).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.bind_path(path)?;
        store.load()?;
        Ok(store)
    }

    /// Records the file this store reads from and writes to.
    ///
    /// A `.json` suffix is appended if the file name does not already end
    /// with one. Fails with [`UsageError::PathAlreadyBound`] if a path has
    /// already been bound. No I/O is performed.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use config_store::{ConfigStore, UsageError};
    ///
    /// let mut store = ConfigStore::new();
    /// store.bind_path("settings").unwrap();
    /// assert_eq!(store.file_path(), Some(Path::new("settings.json")));
    ///
    /// let error = store.bind_path("other").unwrap_err();
    /// assert_eq!(error.usage(), Some(UsageError::PathAlreadyBound));
    /// ```
    pub fn bind_path(&mut self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        if self.file_path.is_some() {
            return Err(UsageError::PathAlreadyBound.into());
        }
        let path = normalize_config_path(path);
        debug!(path = %path.display(), "bound config path");
        self.file_path = Some(path);
        Ok(())
    }

    /// Reads the bound file into the store.
    ///
    /// If the file does not exist the current entries are kept and the
    /// call succeeds. If the file cannot be read or is not a flat object
    /// of strings, a [`LoadError`] is returned and the store is left
    /// exactly as it was. Calling `load` again while clean reloads the
    /// file from disk.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let path = self.bound_path()?;
        if self.dirty {
            return Err(UsageError::UnsavedChanges.into());
        }

        match config_file::read_entries(path) {
            Ok(Some(entries)) => {
                debug!(path = %path.display(), count = entries.len(), "loaded config");
                self.entries = entries;
            }
            Ok(None) => {
                debug!(path = %path.display(), "config file not found, starting new config");
            }
            Err(e) => {
                warn!(error = %e, "failed to load config");
                return Err(e.into());
            }
        }
        self.loaded = true;
        Ok(())
    }

    /// Returns true if `key` has a value.
    pub fn key_exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.loaded_entries()?.contains_key(key))
    }

    /// Returns the value for `key`, or `None` if it has none.
    pub fn value(&self, key: &str) -> Result<Option<&str>, StoreError> {
        Ok(self.loaded_entries()?.get(key).map(String::as_str))
    }

    /// Returns the value for `key`, or `default` if it has none.
    ///
    /// The store is not modified; call [`set_value`](Self::set_value) to
    /// persist the default.
    pub fn value_or<'a>(
        &'a self,
        key: &str,
        default: &'a str,
    ) -> Result<&'a str, StoreError> {
        Ok(self.value(key)?.unwrap_or(default))
    }

    /// Returns a copy of every key-value pair.
    ///
    /// Changes to the returned map never affect the store.
    pub fn all_values(&self) -> Result<Entries, StoreError> {
        Ok(self.loaded_entries()?.clone())
    }

    /// Sets the value for `key`, replacing any existing value.
    pub fn set_value(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.ensure_loaded()?;
        self.entries.insert(key.into(), value.into());
        self.dirty = true;
        Ok(())
    }

    /// Replaces every key-value pair with the given ones.
    ///
    /// ```
    /// use std::collections::HashMap;
    ///
    /// use config_store::ConfigStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let mut store = ConfigStore::open(dir.path().join("app")).unwrap();
    /// store.set_value("stale", "x").unwrap();
    ///
    /// let mut values = HashMap::new();
    /// values.insert("name".to_string(), "John Doe".to_string());
    /// store.set_all_values(&values).unwrap();
    ///
    /// assert!(!store.key_exists("stale").unwrap());
    /// assert_eq!(store.value("name").unwrap(), Some("John Doe"));
    /// ```
    pub fn set_all_values<T, K, V>(&mut self, values: T) -> Result<(), StoreError>
    where
        T: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.ensure_loaded()?;
        self.entries = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.dirty = true;
        Ok(())
    }

    /// Writes every key-value pair to the bound file, replacing it.
    ///
    /// On success the store is clean. On failure a [`SaveError`] is
    /// returned and the store stays dirty so the save can be retried.
    pub fn save(&mut self) -> Result<(), StoreError> {
        self.ensure_loaded()?;
        let path = self.bound_path()?;
        if let Err(e) = config_file::write_entries(path, &self.entries) {
            warn!(error = %e, "failed to save config");
            return Err(e.into());
        }
        debug!(path = %path.display(), count = self.entries.len(), "saved config");
        self.dirty = false;
        Ok(())
    }

    /// Returns the bound file path, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Returns true once a file path has been bound.
    pub fn is_bound(&self) -> bool {
        self.file_path.is_some()
    }

    /// Returns true once the bound file has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns true if there are changes not yet written by `save`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn bound_path(&self) -> Result<&Path, UsageError> {
        self.file_path.as_deref().ok_or(UsageError::PathNotBound)
    }

    fn ensure_loaded(&self) -> Result<(), UsageError> {
        self.bound_path()?;
        if !self.loaded {
            return Err(UsageError::NotLoaded);
        }
        Ok(())
    }

    fn loaded_entries(&self) -> Result<&Entries, UsageError> {
        self.ensure_loaded()?;
        Ok(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn loaded_store(dir: &TempDir) -> ConfigStore {
        ConfigStore::open(dir.path().join("config.json")).unwrap()
    }

    #[test]
    fn test_new_store_is_unbound() {
        let store = ConfigStore::new();
        assert!(!store.is_bound());
        assert!(!store.is_loaded());
        assert!(!store.is_dirty());
        assert_eq!(store.file_path(), None);
    }

    #[test]
    fn test_operations_before_bind_fail() {
        let mut store = ConfigStore::new();
        let not_bound = Some(UsageError::PathNotBound);

        assert_eq!(store.load().unwrap_err().usage(), not_bound);
        assert_eq!(store.key_exists("a").unwrap_err().usage(), not_bound);
        assert_eq!(store.value("a").unwrap_err().usage(), not_bound);
        assert_eq!(store.value_or("a", "b").unwrap_err().usage(), not_bound);
        assert_eq!(store.all_values().unwrap_err().usage(), not_bound);
        assert_eq!(store.set_value("a", "b").unwrap_err().usage(), not_bound);
        assert_eq!(
            store
                .set_all_values(Vec::<(String, String)>::new())
                .unwrap_err()
                .usage(),
            not_bound
        );
        assert_eq!(store.save().unwrap_err().usage(), not_bound);
    }

    #[test]
    fn test_operations_before_load_fail() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = ConfigStore::new();
        store.bind_path(temp_dir.path().join("config")).unwrap();
        let not_loaded = Some(UsageError::NotLoaded);

        assert_eq!(store.key_exists("a").unwrap_err().usage(), not_loaded);
        assert_eq!(store.value("a").unwrap_err().usage(), not_loaded);
        assert_eq!(store.all_values().unwrap_err().usage(), not_loaded);
        assert_eq!(store.set_value("a", "b").unwrap_err().usage(), not_loaded);
        assert_eq!(store.save().unwrap_err().usage(), not_loaded);
        assert!(!temp_dir.path().join("config.json").exists());
    }

    #[test]
    fn test_bind_twice_fails() {
        let mut store = ConfigStore::new();
        store.bind_path("first").unwrap();
        let error = store.bind_path("second").unwrap_err();
        assert_eq!(error.usage(), Some(UsageError::PathAlreadyBound));
        assert_eq!(store.file_path(), Some(Path::new("first.json")));
    }

    #[test]
    fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = loaded_store(&temp_dir);

        store.set_value("a", "1").unwrap();
        assert_eq!(store.value("a").unwrap(), Some("1"));
        assert!(store.key_exists("a").unwrap());
        assert!(store.is_dirty());

        store.set_value("a", "2").unwrap();
        assert_eq!(store.value("a").unwrap(), Some("2"));
    }

    #[test]
    fn test_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = loaded_store(&temp_dir);

        assert_eq!(store.value("missing").unwrap(), None);
        assert_eq!(store.value_or("missing", "fallback").unwrap(), "fallback");
        assert!(!store.key_exists("missing").unwrap());
    }

    #[test]
    fn test_all_values_is_a_copy() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = loaded_store(&temp_dir);
        store.set_value("a", "1").unwrap();

        let mut copy = store.all_values().unwrap();
        copy.insert("a".to_string(), "changed".to_string());
        copy.insert("b".to_string(), "2".to_string());

        assert_eq!(store.value("a").unwrap(), Some("1"));
        assert!(!store.key_exists("b").unwrap());
    }

    #[test]
    fn test_load_while_dirty_keeps_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = loaded_store(&temp_dir);
        store.set_value("a", "1").unwrap();

        let error = store.load().unwrap_err();
        assert_eq!(error.usage(), Some(UsageError::UnsavedChanges));
        assert_eq!(store.value("a").unwrap(), Some("1"));
        assert!(store.is_dirty());
    }

    #[test]
    fn test_malformed_file_leaves_state_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"a": "1"}"#).unwrap();

        let mut store = ConfigStore::open(&path).unwrap();
        fs::write(&path, "[1,2,3]").unwrap();

        let error = store.load().unwrap_err();
        assert!(error.is_load());
        assert_eq!(store.all_values().unwrap().len(), 1);
        assert_eq!(store.value("a").unwrap(), Some("1"));
        assert!(store.is_loaded());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_failed_first_load_stays_unloaded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"a": {"b": "c"}}"#).unwrap();

        let mut store = ConfigStore::new();
        store.bind_path(&path).unwrap();
        assert!(store.load().unwrap_err().is_load());
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_save_failure_keeps_dirty() {
        let temp_dir = TempDir::new().unwrap();
        let mut store =
            ConfigStore::open(temp_dir.path().join("missing_dir").join("config"))
                .unwrap();
        store.set_value("a", "1").unwrap();

        let error = store.save().unwrap_err();
        assert!(error.is_save());
        assert!(store.is_dirty());

        fs::create_dir(temp_dir.path().join("missing_dir")).unwrap();
        store.save().unwrap();
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_save_then_reload_while_clean() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let mut store = ConfigStore::open(&path).unwrap();
        store.set_value("a", "1").unwrap();
        store.save().unwrap();

        fs::write(&path, r#"{"a": "2"}"#).unwrap();
        store.load().unwrap();
        assert_eq!(store.value("a").unwrap(), Some("2"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::from(UsageError::UnsavedChanges).to_string(),
            "config has unsaved changes that would be lost"
        );
        assert!(StoreError::from(UsageError::PathNotBound).is_usage());

        for error in [
            UsageError::PathNotBound,
            UsageError::PathAlreadyBound,
            UsageError::NotLoaded,
            UsageError::UnsavedChanges,
        ] {
            let message = error.to_string();
            assert!(message.starts_with("config "), "{message}");
            assert!(!message.ends_with('.'), "{message}");
        }
    }
}
