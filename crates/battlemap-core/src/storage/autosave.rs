//! Automatic persistence of the working scene.

use crate::codec::SceneDocument;
use crate::storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval: save on every change.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::ZERO;

/// Reserved key of the working scene.
pub const AUTOSAVE_KEY: &str = "__autosave__";

/// Writes the scene document whenever it changed and the interval elapsed.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: DEFAULT_AUTOSAVE_INTERVAL,
            last_save: None,
            dirty: false,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the scene as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check if the scene is dirty and the interval has passed.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if needed. Returns true if a save was performed.
    pub async fn maybe_save(&mut self, document: &SceneDocument) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(document).await?;
        Ok(true)
    }

    /// Save immediately.
    pub async fn save(&mut self, document: &SceneDocument) -> StorageResult<()> {
        let json = document.to_json()?;
        self.storage.save(AUTOSAVE_KEY, &json).await?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(())
    }

    /// Restore the working scene.
    ///
    /// Any failure (missing, unreadable or corrupt) yields an empty scene.
    pub async fn load_last(&mut self) -> SceneDocument {
        let loaded = match self.storage.load(AUTOSAVE_KEY).await {
            Ok(json) => SceneDocument::from_json(&json).map_err(StorageError::from),
            Err(e) => Err(e),
        };
        self.dirty = false;
        match loaded {
            Ok(document) => {
                self.last_save = Some(Instant::now());
                log::info!("Restored autosaved scene");
                document
            }
            Err(StorageError::NotFound(_)) => {
                log::debug!("No autosaved scene, starting empty");
                SceneDocument::default()
            }
            Err(e) => {
                log::warn!("Failed to restore autosaved scene, starting empty: {}", e);
                SceneDocument::default()
            }
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Asset, Scene};
    use crate::storage::MemoryStorage;
    use crate::storage::test_util::block_on;
    use crate::weather::WeatherKind;
    use kurbo::{Point, Size};

    #[test]
    fn test_manager_starts_clean() {
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
        assert_eq!(manager.interval(), Duration::ZERO);
    }

    #[test]
    fn test_zero_interval_saves_every_change() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        let scene = Scene::new();
        manager.mark_dirty();
        assert!(block_on(manager.maybe_save(&scene)).unwrap());
        assert!(!manager.is_dirty());
        assert!(!block_on(manager.maybe_save(&scene)).unwrap());
        manager.mark_dirty();
        assert!(block_on(manager.maybe_save(&scene)).unwrap());
    }

    #[test]
    fn test_interval_defers_save() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        manager.set_interval(Duration::from_secs(3600));
        let scene = Scene::new();
        manager.mark_dirty();
        // First save always goes through.
        assert!(block_on(manager.maybe_save(&scene)).unwrap());
        manager.mark_dirty();
        assert!(!block_on(manager.maybe_save(&scene)).unwrap());
        assert!(manager.is_dirty());
    }

    #[test]
    fn test_load_last_roundtrip() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(Arc::clone(&storage));
        let mut scene = Scene::new();
        scene.weather = WeatherKind::Snow;
        scene.add_asset(Asset::new("chest", Point::new(25.0, 25.0), Size::new(100.0, 100.0)));
        block_on(manager.save(&scene)).unwrap();

        let mut restored = AutoSaveManager::new(storage);
        assert_eq!(block_on(restored.load_last()), scene);
    }

    #[test]
    fn test_load_last_failures_yield_empty_scene() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(Arc::clone(&storage));
        assert!(block_on(manager.load_last()).is_empty());

        block_on(storage.save(AUTOSAVE_KEY, "{ not json")).unwrap();
        let scene = block_on(manager.load_last());
        assert!(scene.is_empty());
        assert_eq!(scene.weather, WeatherKind::None);
    }
}
