//! File-based storage: one JSON file per key.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each value as `<key>.json` in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `base_path`. The directory is created by
    /// [`Storage::open`].
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Storage in the per-user data directory.
    ///
    /// On Linux: `~/.local/share/battlemap/maps/`
    /// On Windows: `%LOCALAPPDATA%\battlemap\maps\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Ok(Self::new(base.join("battlemap").join("maps")))
    }

    /// Get the file path for a key.
    fn value_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn open(&self) -> BoxFuture<'_, StorageResult<()>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            fs::create_dir_all(&base)
                .map_err(|e| StorageError::Io(format!("Failed to create {}: {}", base.display(), e)))
        })
    }

    fn save(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.value_path(key);
        let value = value.to_string();
        Box::pin(async move {
            fs::write(&path, value).map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.value_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            fs::read_to_string(&path).map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.value_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| StorageError::Io(format!("Failed to delete {}: {}", path.display(), e)))?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base).map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let keys = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                .collect();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.value_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_util::block_on;
    use tempfile::tempdir;

    fn open_storage(dir: &Path) -> FileStorage {
        let storage = FileStorage::new(dir.join("maps"));
        block_on(storage.open()).unwrap();
        storage
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempdir().unwrap();
        let storage = open_storage(dir.path());
        assert!(storage.base_path().is_dir());
    }

    #[test]
    fn test_save_load() {
        let dir = tempdir().unwrap();
        let storage = open_storage(dir.path());
        block_on(storage.save("scene", r#"{"weather":"fog"}"#)).unwrap();
        assert_eq!(block_on(storage.load("scene")).unwrap(), r#"{"weather":"fog"}"#);
    }

    #[test]
    fn test_not_found() {
        let dir = tempdir().unwrap();
        let storage = open_storage(dir.path());
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_list_only_json() {
        let dir = tempdir().unwrap();
        let storage = open_storage(dir.path());
        block_on(storage.save("doc1", "{}")).unwrap();
        block_on(storage.save("doc2", "{}")).unwrap();
        fs::write(storage.base_path().join("notes.txt"), "x").unwrap();

        let mut list = block_on(storage.list()).unwrap();
        list.sort();
        assert_eq!(list, vec!["doc1".to_string(), "doc2".to_string()]);
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let storage = open_storage(dir.path());
        block_on(storage.save("test", "{}")).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }

    #[test]
    fn test_sanitizes_key() {
        let dir = tempdir().unwrap();
        let storage = open_storage(dir.path());
        block_on(storage.save("test/doc:with*special", "{}")).unwrap();
        assert!(block_on(storage.load("test/doc:with*special")).is_ok());
        assert!(storage.base_path().join("test_doc_with_special.json").exists());
    }

    #[test]
    fn test_unopened_list_is_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("missing"));
        assert!(block_on(storage.list()).unwrap().is_empty());
    }
}
