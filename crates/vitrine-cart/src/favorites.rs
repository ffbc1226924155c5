//! Favorites list kept in local storage as a JSON array of product ids.

use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::{load_json, save_json, KeyValueStore};

pub struct Favorites {
    storage: Arc<dyn KeyValueStore>,
    key: String,
}

impl Favorites {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Favorite product ids in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the store cannot be read. A corrupt value
    /// reads as an empty list.
    pub fn ids(&self) -> Result<Vec<String>, StorageError> {
        Ok(load_json::<Vec<String>>(self.storage.as_ref(), &self.key)?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the store cannot be read.
    pub fn contains(&self, product_id: &str) -> Result<bool, StorageError> {
        Ok(self.ids()?.iter().any(|id| id == product_id))
    }

    /// Adds the product if absent, removes it otherwise. Returns `true` when
    /// the product is a favorite afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the list cannot be read or written.
    pub fn toggle(&self, product_id: &str) -> Result<bool, StorageError> {
        let mut ids = self.ids()?;
        let now_favorite = match ids.iter().position(|id| id == product_id) {
            Some(index) => {
                ids.remove(index);
                false
            }
            None => {
                ids.push(product_id.to_owned());
                true
            }
        };
        save_json(self.storage.as_ref(), &self.key, &ids)?;
        tracing::debug!(product_id, now_favorite, "toggled favorite");
        Ok(now_favorite)
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the stored list cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)
    }
}
