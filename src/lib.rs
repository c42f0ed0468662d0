//! Config Store: a string key-value configuration persisted as a JSON file.
//!
//! This crate provides [`ConfigStore`], an in-memory mapping from string keys
//! to string values that is bound to a single JSON file, loaded from it
//! explicitly, and written back to it on demand.
//!
//! # Basic Usage
//!
//! ```rust
//! use config_store::ConfigStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//!
//! // Bind a path (".json" is appended) and load it. A missing file is a
//! // new, empty configuration.
//! let mut store = ConfigStore::new();
//! store.bind_path(dir.path().join("test_config")).unwrap();
//! store.load().unwrap();
//!
//! // Read values with defaults, and write them back.
//! let name = store.value_or("name", "John Doe").unwrap().to_string();
//! store.set_value("name", name).unwrap();
//! store.set_value("port", "1234").unwrap();
//!
//! for (key, value) in store.all_values().unwrap() {
//!     println!("{key} = {value}");
//! }
//!
//! store.save().unwrap();
//! assert!(dir.path().join("test_config.json").exists());
//! ```
//!
//! # Lifecycle
//!
//! A store must have its path bound and be loaded before values can be read
//! or changed. Changes stay in memory until [`ConfigStore::save`] is called,
//! and [`ConfigStore::load`] refuses to run while there are unsaved changes.
//! Calls made out of order fail with a [`UsageError`]; file problems are
//! reported as a [`LoadError`] or [`SaveError`]. All three are wrapped in
//! [`StoreError`].
//!
//! ## File Format
//!
//! The file holds one flat JSON object with string values, written
//! pretty-printed:
//!
//! ```json
//! {
//!   "name": "John Doe",
//!   "port": "1234"
//! }
//! ```
//!
//! ## Default Directory
//!
//! With the `default-dirs` feature (enabled by default),
//! [`default_config_path`] places a named configuration in the user's
//! documents directory:
//!
//! ```rust,no_run
//! use config_store::{ConfigStore, StoreError, default_config_path};
//!
//! fn main() -> Result<(), StoreError> {
//!     let store = ConfigStore::open(default_config_path("test_config"))?;
//!     println!("{:?}", store.value("name")?);
//!     Ok(())
//! }
//! ```
//!
//! To disable at compile time:
//!
//! ```toml
//! [dependencies]
//! config-store = { version = "0.1", default-features = false }
//! ```

mod config_path;
#[cfg(feature = "default-dirs")]
pub use config_path::{default_config_path, default_directory};
pub use config_path::{CONFIG_SUFFIX, config_exists, normalize_config_path};

mod config_file;
pub use config_file::{
    Entries, LoadError, SaveError, format_entries, parse_entries, read_entries,
    write_entries,
};

mod config_store;
pub use config_store::{ConfigStore, StoreError, UsageError};
