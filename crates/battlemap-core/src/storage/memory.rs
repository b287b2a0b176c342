//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::future::ready;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_read<T>(&self, f: impl FnOnce(&HashMap<String, String>) -> StorageResult<T>) -> StorageResult<T> {
        let values = self
            .values
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        f(&values)
    }

    fn with_write<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> StorageResult<T> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        Ok(f(&mut values))
    }
}

impl Storage for MemoryStorage {
    fn open(&self) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }

    fn save(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.with_write(|values| {
            values.insert(key.to_string(), value.to_string());
        });
        Box::pin(ready(result))
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let result = self.with_read(|values| values.get(key).cloned().ok_or_else(|| StorageError::NotFound(key.to_string())));
        Box::pin(ready(result))
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.with_write(|values| {
            values.remove(key);
        });
        Box::pin(ready(result))
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let result = self.with_read(|values| Ok(values.keys().cloned().collect()));
        Box::pin(ready(result))
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let result = self.with_read(|values| Ok(values.contains_key(key)));
        Box::pin(ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_util::block_on;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        block_on(storage.open()).unwrap();
        block_on(storage.save("test", r#"{"a":1}"#)).unwrap();
        assert_eq!(block_on(storage.load("test")).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        assert!(!block_on(storage.exists("test")).unwrap());
        block_on(storage.save("test", "{}")).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
        // Deleting again is fine.
        block_on(storage.delete("test")).unwrap();
    }

    #[test]
    fn test_list() {
        let storage = MemoryStorage::new();
        block_on(storage.save("doc1", "{}")).unwrap();
        block_on(storage.save("doc2", "{}")).unwrap();

        let list = block_on(storage.list()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&"doc1".to_string()));
        assert!(list.contains(&"doc2".to_string()));
    }
}
