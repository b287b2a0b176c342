//! Storage abstraction for persistence.
//!
//! Backends are plain key/value stores of JSON text. They are constructed
//! explicitly, opened once, and handed to the managers that need them.

mod autosave;
mod file;
mod maps;
mod memory;

pub use autosave::{AUTOSAVE_KEY, AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL};
pub use file::FileStorage;
pub use maps::{MAP_KEY_PREFIX, MapLibrary};
pub use memory::MemoryStorage;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for key/value storage backends.
pub trait Storage: Send + Sync {
    /// Prepare the backend (create directories, open connections).
    fn open(&self) -> BoxFuture<'_, StorageResult<()>>;

    /// Store a JSON value under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the JSON value stored under `key`.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;

    /// Delete a value. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all keys.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Open file storage in the default per-user location.
pub async fn create_default_storage() -> StorageResult<Arc<FileStorage>> {
    let storage = FileStorage::default_location()?;
    storage.open().await?;
    Ok(Arc::new(storage))
}
