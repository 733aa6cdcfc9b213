use axum::{extract::State, http::StatusCode, response::Json};
use printboard_core::sync::{SyncError, SyncSettingsPatch, SyncSettingsView};

use super::{api_error, ApiError};
use crate::state::ServerState;

fn sync_error(e: SyncError) -> ApiError {
    let status = match &e {
        SyncError::Network(_) | SyncError::Remote { .. } | SyncError::PayloadMissing => {
            StatusCode::BAD_GATEWAY
        }
        SyncError::Storage(_) | SyncError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SyncError::NoCredential | SyncError::NotConfigured | SyncError::InvalidPayload(_) => {
            StatusCode::BAD_REQUEST
        }
    };
    api_error(status, "printboard.api.sync", e.to_string())
}

pub async fn get_settings(
    State(state): State<ServerState>,
) -> Result<Json<SyncSettingsView>, ApiError> {
    let settings = state.sync.settings().map_err(sync_error)?;
    Ok(Json(settings.view()))
}

/// Save settings, then start or stop auto-sync to match.
pub async fn update_settings(
    State(state): State<ServerState>,
    Json(patch): Json<SyncSettingsPatch>,
) -> Result<Json<SyncSettingsView>, ApiError> {
    let settings = state.sync.update_settings(patch).map_err(sync_error)?;
    state.refresh_auto_sync().map_err(sync_error)?;
    Ok(Json(settings.view()))
}

pub async fn upload(State(state): State<ServerState>) -> Result<Json<serde_json::Value>, ApiError> {
    let document_id = state.sync.upload(&state.engine).await.map_err(sync_error)?;
    Ok(Json(serde_json::json!({ "documentId": document_id })))
}

pub async fn download(
    State(state): State<ServerState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let summary = state.sync.download(&state.engine).await.map_err(sync_error)?;
    Ok(Json(serde_json::json!({ "summary": summary })))
}
