/// Sync adapter: mirror the board to a single remote document.
///
/// Upload pushes the export document as payload `board.json`, creating the
/// remote document on first use. Download pulls that payload, runs it
/// through import validation and replaces the board. There is no merge:
/// the last writer wins on both sides.
///
/// The remote vendor sits behind `RemoteDocumentStore`. Engine locks are
/// never held across a network call.
pub mod memory;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::debounce::{spawn_debounced, AUTO_SYNC_DEBOUNCE};
use crate::engine::{lock_engine, SharedEngine};
use crate::export::import::{prepare_import, ImportError, ImportSummary};
use crate::export::ExportDocument;
use crate::storage::{SnapshotStorage, StorageError, SYNC_SETTINGS_KEY};

/// Name of the payload inside the remote document.
pub const PAYLOAD_NAME: &str = "board.json";
/// Content of a freshly created remote document.
pub const EMPTY_PAYLOAD: &str = "{}";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No token configured")]
    NoCredential,

    #[error("No token/document configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("No {} in remote document", PAYLOAD_NAME)]
    PayloadMissing,

    #[error("Invalid remote payload: {0}")]
    InvalidPayload(#[from] ImportError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Locally stored sync configuration. Kept apart from the board snapshot
/// so the credential never ends up in exports or payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub auto: bool,
}

/// Partial settings update. `Some("")` clears a value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettingsPatch {
    pub credential: Option<String>,
    pub document_id: Option<String>,
    pub auto: Option<bool>,
}

/// Settings as shown to the view: the credential is reduced to a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettingsView {
    pub has_credential: bool,
    pub document_id: Option<String>,
    pub auto: bool,
}

impl SyncSettings {
    pub fn load(storage: &dyn SnapshotStorage) -> Result<Self, StorageError> {
        match storage.read(SYNC_SETTINGS_KEY)? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, storage: &dyn SnapshotStorage) -> Result<(), StorageError> {
        storage.write(SYNC_SETTINGS_KEY, &serde_json::to_string(self)?)
    }

    pub fn apply(&mut self, patch: SyncSettingsPatch) {
        if let Some(credential) = patch.credential {
            self.credential = Some(credential).filter(|c| !c.trim().is_empty());
        }
        if let Some(document_id) = patch.document_id {
            self.document_id = Some(document_id).filter(|d| !d.trim().is_empty());
        }
        if let Some(auto) = patch.auto {
            self.auto = auto;
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref().filter(|c| !c.is_empty())
    }

    pub fn view(&self) -> SyncSettingsView {
        SyncSettingsView {
            has_credential: self.credential().is_some(),
            document_id: self.document_id.clone(),
            auto: self.auto,
        }
    }
}

/// A remote service holding named payloads inside documents.
pub trait RemoteDocumentStore: Send + Sync {
    /// Create a document holding `initial` under `name`; returns its id.
    fn create_document(
        &self,
        credential: &str,
        name: &str,
        initial: &str,
    ) -> impl Future<Output = Result<String, SyncError>> + Send;

    /// Replace the payload `name` of an existing document.
    fn write_payload(
        &self,
        credential: &str,
        document_id: &str,
        name: &str,
        content: &str,
    ) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Read the payload `name`; `None` when the document has no such payload.
    fn read_payload(
        &self,
        credential: &str,
        document_id: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, SyncError>> + Send;
}

pub struct SyncAdapter<R> {
    remote: R,
    storage: Arc<dyn SnapshotStorage>,
}

impl<R: RemoteDocumentStore> SyncAdapter<R> {
    pub fn new(remote: R, storage: Arc<dyn SnapshotStorage>) -> Self {
        Self { remote, storage }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn settings(&self) -> Result<SyncSettings, SyncError> {
        Ok(SyncSettings::load(self.storage.as_ref())?)
    }

    pub fn update_settings(&self, patch: SyncSettingsPatch) -> Result<SyncSettings, SyncError> {
        let mut settings = self.settings()?;
        settings.apply(patch);
        settings.save(self.storage.as_ref())?;
        Ok(settings)
    }

    /// Push the current board. Returns the remote document id.
    pub async fn upload(&self, engine: &SharedEngine) -> Result<String, SyncError> {
        let mut settings = self.settings()?;
        let credential = settings
            .credential()
            .ok_or(SyncError::NoCredential)?
            .to_string();

        let document_id = match settings.document_id.clone() {
            Some(id) => id,
            None => {
                let id = self
                    .remote
                    .create_document(&credential, PAYLOAD_NAME, EMPTY_PAYLOAD)
                    .await?;
                log::info!("[printboard.sync] Created remote document {}", id);
                settings.document_id = Some(id.clone());
                settings.save(self.storage.as_ref())?;
                id
            }
        };

        let payload = {
            let engine = lock_engine(engine);
            ExportDocument::from_state(engine.state()).to_json()?
        };
        self.remote
            .write_payload(&credential, &document_id, PAYLOAD_NAME, &payload)
            .await?;
        log::info!(
            "[printboard.sync] Uploaded {} bytes to {}",
            payload.len(),
            document_id
        );
        Ok(document_id)
    }

    /// Replace the board with the remote payload.
    pub async fn download(&self, engine: &SharedEngine) -> Result<ImportSummary, SyncError> {
        let settings = self.settings()?;
        let (Some(credential), Some(document_id)) =
            (settings.credential(), settings.document_id.as_deref())
        else {
            return Err(SyncError::NotConfigured);
        };

        let content = self
            .remote
            .read_payload(credential, document_id, PAYLOAD_NAME)
            .await?
            .filter(|c| !c.is_empty())
            .ok_or(SyncError::PayloadMissing)?;

        let preview = prepare_import(&content)?;
        let summary = preview.summary;
        preview.apply(&mut lock_engine(engine));
        log::info!(
            "[printboard.sync] Downloaded board from {}: {} cards",
            document_id,
            summary.card_count
        );
        Ok(summary)
    }
}

/// Upload automatically after changes settle. Started only when auto-sync
/// is enabled and a credential is present; upload failures are logged and
/// otherwise ignored.
pub fn spawn_auto_sync<R>(
    adapter: Arc<SyncAdapter<R>>,
    engine: SharedEngine,
) -> Result<Option<JoinHandle<()>>, SyncError>
where
    R: RemoteDocumentStore + 'static,
{
    let settings = adapter.settings()?;
    if !settings.auto || settings.credential().is_none() {
        log::debug!("[printboard.sync] Auto-sync disabled");
        return Ok(None);
    }

    let rx = lock_engine(&engine).subscribe();
    let handle = spawn_debounced(rx, AUTO_SYNC_DEBOUNCE, "auto-sync", move || {
        let adapter = adapter.clone();
        let engine = engine.clone();
        async move {
            if let Err(e) = adapter.upload(&engine).await {
                log::warn!("[printboard.sync] Auto-sync upload failed: {}", e);
            }
        }
    });
    log::info!("[printboard.sync] Auto-sync enabled");
    Ok(Some(handle))
}
