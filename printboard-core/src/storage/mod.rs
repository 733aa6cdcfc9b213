pub mod local;
pub mod memory;

/// Key of the persisted board snapshot.
pub const STATE_KEY: &str = "print-board.v1";
/// Key of the locally stored sync credential and document id.
pub const SYNC_SETTINGS_KEY: &str = "sync-settings";

/// Abstract durable storage: named slots holding one serialized document each.
/// Implementations: LocalStorage (filesystem), MemoryStorage (tests, ephemeral runs).
pub trait SnapshotStorage: Send + Sync {
    /// Read a slot. `Ok(None)` when nothing has been stored yet.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace a slot's content.
    fn write(&self, key: &str, content: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
