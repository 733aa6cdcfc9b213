use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Json,
};
use printboard_core::engine::lock_engine;
use printboard_core::export::import::validate_value;
use printboard_core::export::{ExportDocument, EXPORT_FILE_NAME};
use serde::Deserialize;

use super::{api_error, ApiError};
use crate::state::ServerState;

#[derive(Deserialize)]
pub struct ImportBody {
    document: serde_json::Value,
    /// Without confirmation only the summary is returned.
    #[serde(default)]
    confirm: bool,
}

/// Pretty-printed export document served as a file download.
pub async fn export(State(state): State<ServerState>) -> Result<(HeaderMap, String), ApiError> {
    let doc = ExportDocument::from_state(lock_engine(&state.engine).state());
    let body = doc.to_json_pretty().map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "printboard.api.export",
            format!("Export failed: {}", e),
        )
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((headers, body))
}

/// Two-step import: the first call validates and returns the summary
/// message, a second call with `confirm: true` replaces the board.
pub async fn import(
    State(state): State<ServerState>,
    Json(body): Json<ImportBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let preview = validate_value(body.document).map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            "printboard.api.import",
            format!("Import failed: {}", e),
        )
    })?;
    let summary = preview.summary;
    if body.confirm {
        preview.apply(&mut lock_engine(&state.engine));
    }
    Ok(Json(serde_json::json!({
        "applied": body.confirm,
        "summary": summary,
        "message": summary.message(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::server_state;
    use printboard_core::types::{ColumnId, TabId};

    #[tokio::test]
    async fn test_export_sets_file_name() {
        let state = server_state();
        let (headers, body) = export(State(state)).await.unwrap();
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"3d-print-board.json\""
        );
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert!(body.starts_with("{\n  \""));
        assert!(body.contains("\n    \"personal\": {"));
        let doc: ExportDocument = serde_json::from_str(&body).unwrap();
        assert_eq!(doc.schema_version, 1);
    }

    #[tokio::test]
    async fn test_import_needs_confirmation() {
        let source = server_state();
        lock_engine(&source.engine).add_card(TabId::Work, ColumnId::Done, "Enclosure");
        let (_, body) = export(State(source)).await.unwrap();
        let document: serde_json::Value = serde_json::from_str(&body).unwrap();

        let target = server_state();
        let Json(preview) = import(
            State(target.clone()),
            Json(ImportBody {
                document: document.clone(),
                confirm: false,
            }),
        )
        .await
        .unwrap();
        assert_eq!(preview["applied"], false);
        assert_eq!(
            preview["message"],
            "Import will replace current boards. Tabs: 3, Cards: 1. Continue?"
        );
        assert_eq!(lock_engine(&target.engine).state().tabs.total_cards(), 0);

        import(
            State(target.clone()),
            Json(ImportBody {
                document,
                confirm: true,
            }),
        )
        .await
        .unwrap();
        assert_eq!(lock_engine(&target.engine).state().tabs.total_cards(), 1);
    }

    #[tokio::test]
    async fn test_invalid_import_is_bad_request() {
        let state = server_state();
        let (status, Json(body)) = import(
            State(state),
            Json(ImportBody {
                document: serde_json::json!({ "tabs": { "personal": {} } }),
                confirm: true,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Import failed: Invalid tab structure: personal");
    }
}
