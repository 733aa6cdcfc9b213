pub mod api;
pub mod config;
pub mod gist;
mod log_bridge;
pub mod server;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use printboard_core::engine::{lock_engine, BoardEngine};
use printboard_core::persistence::{load_state, save_state, spawn_autosave};
use printboard_core::storage::local::LocalStorage;
use printboard_core::storage::SnapshotStorage;

use crate::gist::GistStore;
use crate::state::ServerState;

/// Start the backend and serve until Ctrl-C. `config_path` overrides the
/// default config location.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = log_bridge::init(config::default_log_path()) {
        log_bridge::write_fallback_line(&format!("failed to initialize backend logger: {}", e));
    }

    let config_path = config_path.unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path);
    let data_dir = config.resolve_data_dir();
    log::info!("[printboard.startup] Data directory {}", data_dir.display());

    let storage: Arc<dyn SnapshotStorage> = Arc::new(LocalStorage::new(&data_dir)?);
    let engine = BoardEngine::new(load_state(storage.as_ref())).into_shared();
    let autosave = spawn_autosave(engine.clone(), storage.clone());

    let state = ServerState::new(
        engine.clone(),
        storage.clone(),
        GistStore::new(),
        config.port,
        config.bind_address.clone(),
    );
    match state.refresh_auto_sync() {
        Ok(true) => log::info!("[printboard.startup] Auto-sync running"),
        Ok(false) => {}
        Err(e) => log::warn!("[printboard.startup] Could not read sync settings: {}", e),
    }

    let (port, server) = server::spawn_server(state.clone()).await?;
    println!("printboard backend listening on http://{}:{}", config.bind_address, port);

    tokio::signal::ctrl_c().await?;
    log::info!("[printboard.shutdown] Shutting down");
    server.abort();
    if let Some(handle) = state
        .auto_sync
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take()
    {
        handle.abort();
    }

    // Closing the change channel makes the autosave worker flush and exit.
    lock_engine(&engine).close_events();
    if autosave.await.is_err() {
        let snapshot = lock_engine(&engine).snapshot();
        save_state(storage.as_ref(), &snapshot)?;
    }
    Ok(())
}
