use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{RemoteDocumentStore, SyncError};

/// In-process remote store. Useful for tests and offline runs.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<HashMap<String, HashMap<String, String>>>,
    next_id: AtomicU64,
    offline: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a network outage: every call fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn document_count(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn payload(&self, document_id: &str, name: &str) -> Option<String> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(document_id)
            .and_then(|files| files.get(name).cloned())
    }

    fn check(&self, credential: &str) -> Result<(), SyncError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Network("remote unreachable".to_string()));
        }
        if credential.is_empty() {
            return Err(SyncError::Remote {
                status: 401,
                message: "Bad credentials".to_string(),
            });
        }
        Ok(())
    }

    fn not_found(document_id: &str) -> SyncError {
        SyncError::Remote {
            status: 404,
            message: format!("document {} not found", document_id),
        }
    }
}

impl RemoteDocumentStore for MemoryRemoteStore {
    async fn create_document(
        &self,
        credential: &str,
        name: &str,
        initial: &str,
    ) -> Result<String, SyncError> {
        self.check(credential)?;
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let files = HashMap::from([(name.to_string(), initial.to_string())]);
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), files);
        Ok(id)
    }

    async fn write_payload(
        &self,
        credential: &str,
        document_id: &str,
        name: &str,
        content: &str,
    ) -> Result<(), SyncError> {
        self.check(credential)?;
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        let files = documents
            .get_mut(document_id)
            .ok_or_else(|| Self::not_found(document_id))?;
        files.insert(name.to_string(), content.to_string());
        Ok(())
    }

    async fn read_payload(
        &self,
        credential: &str,
        document_id: &str,
        name: &str,
    ) -> Result<Option<String>, SyncError> {
        self.check(credential)?;
        let documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        let files = documents
            .get(document_id)
            .ok_or_else(|| Self::not_found(document_id))?;
        Ok(files.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_to_unknown_document_is_not_found() {
        let store = MemoryRemoteStore::new();
        let err = store
            .write_payload("tok", "doc-9", "board.json", "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Remote { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let store = MemoryRemoteStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.create_document("tok", "board.json", "{}").await,
            Err(SyncError::Network(_))
        ));
    }
}
