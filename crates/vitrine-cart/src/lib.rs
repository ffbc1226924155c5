pub mod error;
pub mod favorites;
pub mod mode;
pub mod storage;
pub mod store;

pub use error::{CartError, StorageError};
pub use favorites::Favorites;
pub use mode::{transition, AuthMode, MergePolicy, ReloadAction};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{CartStatus, CartStore, CartStoreOptions};
