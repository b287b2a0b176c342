//! Named map saves.

use crate::codec::SavedMap;
use crate::storage::{Storage, StorageResult};
use std::sync::Arc;

/// Key prefix of saved maps; the rest of the key is the map id.
pub const MAP_KEY_PREFIX: &str = "map-";

/// Saved-map store on top of a key/value backend.
pub struct MapLibrary<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> MapLibrary<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    fn key(id: &str) -> String {
        format!("{}{}", MAP_KEY_PREFIX, id)
    }

    /// All saved maps, newest first. Unreadable entries are skipped.
    pub async fn list(&self) -> StorageResult<Vec<SavedMap>> {
        let keys = self.storage.list().await?;
        let mut maps = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with(MAP_KEY_PREFIX)) {
            let loaded = match self.storage.load(key).await {
                Ok(json) => serde_json::from_str::<SavedMap>(&json).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match loaded {
                Ok(map) => maps.push(map),
                Err(e) => log::warn!("Skipping saved map {}: {}", key, e),
            }
        }
        maps.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(maps)
    }

    pub async fn save(&self, map: &SavedMap) -> StorageResult<()> {
        let json = serde_json::to_string(map)?;
        self.storage.save(&Self::key(&map.id), &json).await?;
        log::info!("Saved map \"{}\" ({})", map.name, map.id);
        Ok(())
    }

    pub async fn load(&self, id: &str) -> StorageResult<SavedMap> {
        let json = self.storage.load(&Self::key(id)).await?;
        Ok(serde_json::from_str(&json)?)
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(&Self::key(id)).await
    }
}
