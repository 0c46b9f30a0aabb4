//! Periodic board persistence.
//!
//! The manager only decides *when* to save; the host drives it from its own
//! event loop (the core has no timers).

use crate::snapshot::BoardData;
use crate::storage::{Storage, StorageResult};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Board id used when none has been set.
pub const DEFAULT_BOARD_ID: &str = "board";

/// Key under which the most recently saved board is mirrored.
pub const LAST_BOARD_KEY: &str = "__last_board__";

/// Tracks unsaved changes and saves through a storage backend.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
    board_id: Option<String>,
    /// Board revision at the last save or load.
    saved_revision: Option<u64>,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
            board_id: None,
            saved_revision: None,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark dirty when the board revision moved since the last save.
    pub fn observe_revision(&mut self, revision: u64) {
        if self.saved_revision != Some(revision) {
            self.dirty = true;
        }
    }

    pub fn set_board_id(&mut self, id: Option<String>) {
        self.board_id = id;
    }

    pub fn board_id(&self) -> &str {
        self.board_id.as_deref().unwrap_or(DEFAULT_BOARD_ID)
    }

    /// Check if enough time has passed for an auto-save.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }

        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if dirty and the interval elapsed. Returns true if a save happened.
    pub async fn maybe_save(&mut self, data: &BoardData, revision: u64) -> StorageResult<bool> {
        self.observe_revision(revision);
        if !self.should_save() {
            return Ok(false);
        }

        self.save(data, revision).await?;
        Ok(true)
    }

    /// Save immediately, also mirroring the board under [`LAST_BOARD_KEY`].
    pub async fn save(&mut self, data: &BoardData, revision: u64) -> StorageResult<()> {
        let id = self.board_id().to_string();
        self.storage.save(&id, data).await?;
        self.storage.save(LAST_BOARD_KEY, data).await?;

        log::debug!(
            "Saved board {id} ({} elements, {} connectors)",
            data.elements.len(),
            data.connectors.len()
        );
        self.last_save = Some(Instant::now());
        self.saved_revision = Some(revision);
        self.dirty = false;
        Ok(())
    }

    /// Load a board by id and make it current.
    pub async fn load(&mut self, id: &str) -> StorageResult<BoardData> {
        let data = self.storage.load(id).await?;
        self.board_id = Some(id.to_string());
        self.after_load();
        Ok(data)
    }

    /// Load the most recently saved board, if any.
    pub async fn load_last(&mut self) -> Option<BoardData> {
        match self.storage.load(LAST_BOARD_KEY).await {
            Ok(data) => {
                self.after_load();
                Some(data)
            }
            Err(e) => {
                log::debug!("No last board to restore: {e}");
                None
            }
        }
    }

    fn after_load(&mut self) {
        self.dirty = false;
        self.saved_revision = None;
        self.last_save = Some(Instant::now());
    }

    /// Record the board revision right after importing loaded data, so the
    /// import itself does not count as an unsaved change.
    pub fn mark_loaded_revision(&mut self, revision: u64) {
        self.saved_revision = Some(revision);
        self.dirty = false;
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await
    }

    /// List saved board ids, excluding the "last board" mirror.
    pub async fn list_boards(&self) -> StorageResult<Vec<String>> {
        let mut ids = self.storage.list().await?;
        ids.retain(|id| id != LAST_BOARD_KEY);
        Ok(ids)
    }

    pub async fn exists(&self, id: &str) -> StorageResult<bool> {
        self.storage.exists(id).await
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

/// Create a platform-appropriate storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::FileStorage>> {
    Ok(Arc::new(crate::storage::FileStorage::default_location()?))
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::MemoryStorage>> {
    Ok(Arc::new(crate::storage::MemoryStorage::new()))
}

/// Platform-specific storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformStorage = crate::storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub type PlatformStorage = crate::storage::MemoryStorage;

/// Auto-save manager over the platform storage.
pub type PlatformAutoSaveManager = AutoSaveManager<PlatformStorage>;

/// Create an auto-save manager with default storage.
pub fn create_autosave_manager() -> StorageResult<PlatformAutoSaveManager> {
    let storage = create_default_storage()?;
    Ok(AutoSaveManager::new(storage))
}
