/// Local filesystem storage backend.
///
/// One `<key>.json` file per slot inside a data directory, with:
/// - Atomic writes (write to .tmp, fsync, rename, fsync directory)
/// - SHA-256 content hashes to skip rewriting identical content
/// - Mutex-guarded writes per key to prevent interleaved writers
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};

use super::{SnapshotStorage, StorageError};

/// Local filesystem snapshot storage.
pub struct LocalStorage {
    dir: PathBuf,
    /// key -> SHA-256 of the last content read or written
    hashes: Mutex<HashMap<String, String>>,
    /// Per-key write mutex
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LocalStorage {
    /// Open (and create if needed) a storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            hashes: Mutex::new(HashMap::new()),
            write_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid || key.contains("..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Compute SHA-256 hash of content (for change detection).
    fn content_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.replace("\r\n", "\n").as_bytes());
        hex::encode(hasher.finalize())
    }

    fn remember_hash(&self, key: &str, content: &str) {
        self.hashes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Self::content_hash(content));
    }

    fn get_write_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    /// Refuses to write empty content over a non-empty file.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if content.trim().is_empty() {
            if let Ok(existing) = fs::read_to_string(path) {
                if !existing.trim().is_empty() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "Refusing to overwrite non-empty file with empty content",
                    ));
                }
            }
        }

        let tmp_path = path.with_extension("printboard.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl SnapshotStorage for LocalStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => {
                self.remember_hash(key, &content);
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, content: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let lock = self.get_write_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let hash = Self::content_hash(content);
        let unchanged = self
            .hashes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|h| *h == hash);
        if unchanged && path.exists() {
            log::debug!("[printboard.storage] {} unchanged, skipping write", key);
            return Ok(());
        }

        Self::atomic_write(&path, content)?;
        self.remember_hash(key, content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        assert!(storage.read("print-board.v1").unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        storage.write("print-board.v1", "{\"a\":1}").unwrap();

        assert_eq!(
            storage.read("print-board.v1").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        let on_disk = fs::read_to_string(dir.path().join("print-board.v1.json")).unwrap();
        assert_eq!(on_disk, "{\"a\":1}");
        assert!(!dir.path().join("print-board.v1.printboard.tmp").exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = LocalStorage::new(&nested).unwrap();
        storage.write("sync-settings", "{}").unwrap();
        assert!(nested.join("sync-settings.json").exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        assert!(matches!(
            storage.write("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(storage.read("a/b").is_err());
        assert!(storage.read("").is_err());
    }

    #[test]
    fn test_refuses_empty_over_non_empty() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        storage.write("slot", "{}").unwrap();
        assert!(storage.write("slot", "  ").is_err());
        assert_eq!(storage.read("slot").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_rewrites_after_external_delete() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        storage.write("slot", "{}").unwrap();
        fs::remove_file(dir.path().join("slot.json")).unwrap();
        storage.write("slot", "{}").unwrap();
        assert!(dir.path().join("slot.json").exists());
    }
}
