use std::path::PathBuf;

use thiserror::Error;
use vitrine_client::ApiError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key \"{0}\": expected ASCII letters, digits, '-' or '_'")]
    InvalidKey(String),

    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize value for key \"{key}\": {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a cart or favorites operation.
///
/// The store also records [`CartError::user_message`] in its status so a UI
/// can render it without holding on to the error value.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart API error: {0}")]
    Api(#[from] ApiError),

    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CartError::Api(e) => e.user_message(),
            CartError::Storage(_) => "could not save your cart on this device".to_owned(),
        }
    }
}
