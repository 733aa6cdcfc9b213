/// Shared application state passed to axum handlers.
use std::sync::{Arc, Mutex, PoisonError};

use printboard_core::engine::SharedEngine;
use printboard_core::storage::SnapshotStorage;
use printboard_core::sync::{spawn_auto_sync, SyncAdapter, SyncError};
use tokio::task::JoinHandle;

use crate::gist::GistStore;

pub type BoardSync = SyncAdapter<GistStore>;

#[derive(Clone)]
pub struct ServerState {
    pub engine: SharedEngine,
    pub sync: Arc<BoardSync>,
    pub auto_sync: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub port: u16,
    pub bind_address: String,
}

impl ServerState {
    pub fn new(
        engine: SharedEngine,
        storage: Arc<dyn SnapshotStorage>,
        remote: GistStore,
        port: u16,
        bind_address: String,
    ) -> Self {
        let sync = Arc::new(SyncAdapter::new(remote, storage));
        Self {
            engine,
            sync,
            auto_sync: Arc::new(Mutex::new(None)),
            port,
            bind_address,
        }
    }

    /// Start or stop the auto-sync worker to match the stored settings.
    pub fn refresh_auto_sync(&self) -> Result<bool, SyncError> {
        let mut slot = self.auto_sync.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        *slot = spawn_auto_sync(self.sync.clone(), self.engine.clone())?;
        Ok(slot.is_some())
    }
}
