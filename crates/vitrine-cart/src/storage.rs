//! Local persistent key-value storage for anonymous shoppers.
//!
//! Values are JSON strings. [`FileStore`] keeps one `<key>.json` file per key
//! and replaces it atomically; [`MemoryStore`] lives only as long as the
//! process.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium rejects the removal.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_owned()))
    }
}

/// Directory-backed store: each key maps to `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created lazily on the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        // Temp file in the same directory, then rename: readers never see a
        // partial value.
        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        tmp.write_all(value.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| io_error(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| io_error(&path, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries().remove(key);
        Ok(())
    }
}

/// Reads and parses the JSON value under `key`.
///
/// A value that exists but does not parse is logged and reported as absent.
///
/// # Errors
///
/// Returns [`StorageError`] only when the store itself fails.
pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
{
    let Some(text) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable stored value");
            Ok(None)
        }
    }
}

/// Serializes `value` as JSON and stores it under `key`.
///
/// # Errors
///
/// Returns [`StorageError::Serialize`] or any error from the store.
pub fn save_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let text = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
        key: key.to_owned(),
        source: e,
    })?;
    store.set(key, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("cart").unwrap(), None);
        store.set("cart", "[1,2]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.path().join("nested").join("cart.json").exists());

        store.set("cart", "[]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));

        store.remove("cart").unwrap();
        assert_eq!(store.get("cart").unwrap(), None);
        store.remove("cart").unwrap();
    }

    #[test]
    fn file_store_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("favorites", r#"["a"]"#).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["favorites.json"]);
    }

    #[test]
    fn keys_that_could_escape_the_directory_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        for key in ["", "../cart", "a/b", "cart.json"] {
            assert!(
                matches!(store.set(key, "x"), Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        store.set("cart", "[]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));
        store.remove("cart").unwrap();
        assert_eq!(store.get("cart").unwrap(), None);
    }

    #[test]
    fn load_json_treats_corrupt_value_as_absent() {
        let store = MemoryStore::new();
        store.set("cart", "{not json").unwrap();
        let loaded: Option<Vec<String>> = load_json(&store, "cart").unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn save_then_load_json() {
        let store = MemoryStore::new();
        save_json(&store, "favorites", &["p1", "p2"]).unwrap();
        let loaded: Option<Vec<String>> = load_json(&store, "favorites").unwrap();
        assert_eq!(loaded, Some(vec!["p1".to_owned(), "p2".to_owned()]));
    }
}
