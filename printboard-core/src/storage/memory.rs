use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{SnapshotStorage, StorageError};

/// In-memory storage. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
    writes: std::sync::atomic::AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, content: &str) -> Result<(), StorageError> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), content.to_string());
        self.writes
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }
}
