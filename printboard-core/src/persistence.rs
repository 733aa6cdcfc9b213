/// Durable board snapshot: load at startup, debounced autosave afterwards.
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::debounce::{spawn_debounced, SAVE_DEBOUNCE};
use crate::engine::{lock_engine, SharedEngine};
use crate::migrate::migrate_value;
use crate::storage::{SnapshotStorage, StorageError, STATE_KEY};
use crate::types::AppState;

/// Load the persisted board. Anything missing or unreadable yields the
/// initial empty state; the problem is logged, never surfaced.
pub fn load_state(storage: &dyn SnapshotStorage) -> AppState {
    let content = match storage.read(STATE_KEY) {
        Ok(Some(content)) => content,
        Ok(None) => {
            log::info!("[printboard.persist] No saved board, starting empty");
            return AppState::default();
        }
        Err(e) => {
            log::warn!("[printboard.persist] Failed to read saved board: {}", e);
            return AppState::default();
        }
    };

    match decode_state(&content) {
        Ok(state) => {
            if let Err(problem) = state.check_consistency() {
                log::warn!(
                    "[printboard.persist] Saved board is inconsistent ({}), loading anyway",
                    problem
                );
            }
            log::info!(
                "[printboard.persist] Loaded board with {} cards",
                state.tabs.total_cards()
            );
            state
        }
        Err(e) => {
            log::warn!("[printboard.persist] Saved board is unreadable: {}", e);
            AppState::default()
        }
    }
}

fn decode_state(content: &str) -> Result<AppState, serde_json::Error> {
    let value = serde_json::from_str(content)?;
    serde_json::from_value(migrate_value(value))
}

/// Serialize and write the full state.
pub fn save_state(storage: &dyn SnapshotStorage, state: &AppState) -> Result<(), StorageError> {
    let content = serde_json::to_string(state)?;
    storage.write(STATE_KEY, &content)
}

/// Save the latest snapshot after each burst of changes settles. Storage
/// failures are logged and dropped; the next change retries.
pub fn spawn_autosave(engine: SharedEngine, storage: Arc<dyn SnapshotStorage>) -> JoinHandle<()> {
    let rx = lock_engine(&engine).subscribe();
    spawn_debounced(rx, SAVE_DEBOUNCE, "autosave", move || {
        let snapshot = lock_engine(&engine).snapshot();
        let storage = storage.clone();
        async move {
            match save_state(storage.as_ref(), &snapshot) {
                Ok(()) => log::debug!("[printboard.persist] Board saved"),
                Err(e) => log::error!("[printboard.persist] Failed to save board: {}", e),
            }
        }
    })
}
