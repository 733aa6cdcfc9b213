use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use printboard_core::types::{ColumnId, TabId};
use serde::Serialize;

mod board;
mod drag;
mod events;
mod search;
mod sync;
mod transfer;

use crate::state::ServerState;

/// Axum REST API routes.
///
///   GET    /state                                 -> full board state
///   GET    /tabs/{tab}/columns/{column}/cards     -> filtered cards of one column
///   POST   /tabs/{tab}/columns/{column}/cards     -> add card
///   POST   /tabs/{tab}/columns/{column}/reorder   -> move card within column
///   POST   /cards/current                         -> add untitled card where the user is
///   PATCH  /tabs/{tab}/cards/{id}                 -> update card fields
///   DELETE /tabs/{tab}/cards/{id}                 -> delete card
///   POST   /tabs/{tab}/cards/{id}/duplicate       -> duplicate card
///   POST   /move                                  -> move card between columns/tabs
///   PUT    /selection                             -> set or clear selection
///   POST   /selection/move                        -> step selected card one column
///   POST   /selection/notes                       -> toggle notes editor of selected card
///   PUT    /view                                  -> active tab, filter, view toggles
///   POST   /drag/start | /drag/hover | /drag/end  -> drag session
///   POST   /wipe/done | /wipe/tabs/{tab} | /wipe/all
///   GET    /export                                -> export document
///   POST   /import                                -> validate, summarize, apply when confirmed
///   GET    /sync/settings, PUT /sync/settings     -> sync config (credential never returned)
///   POST   /sync/upload | /sync/download
///   GET    /search?q=term                         -> search cards across tabs
///   GET    /events                                -> SSE stream of board changes
///   GET    /status, /logs, /logs/stream
pub fn api_router() -> Router<ServerState> {
    Router::new()
        .route("/state", get(board::get_state))
        .route(
            "/tabs/{tab}/columns/{column}/cards",
            get(board::column_cards).post(board::add_card),
        )
        .route(
            "/tabs/{tab}/columns/{column}/reorder",
            post(board::reorder_card),
        )
        .route("/cards/current", post(board::add_current_card))
        .route(
            "/tabs/{tab}/cards/{id}",
            axum::routing::patch(board::update_card).delete(board::delete_card),
        )
        .route("/tabs/{tab}/cards/{id}/duplicate", post(board::duplicate_card))
        .route("/move", post(board::move_card))
        .route("/selection", put(board::set_selection))
        .route("/selection/move", post(board::move_selection))
        .route("/selection/notes", post(board::toggle_notes))
        .route("/view", put(board::update_view))
        .route("/drag/start", post(drag::start))
        .route("/drag/hover", post(drag::hover))
        .route("/drag/end", post(drag::end))
        .route("/wipe/done", post(board::wipe_done))
        .route("/wipe/tabs/{tab}", post(board::wipe_tab))
        .route("/wipe/all", post(board::wipe_all))
        .route("/export", get(transfer::export))
        .route("/import", post(transfer::import))
        .route(
            "/sync/settings",
            get(sync::get_settings).put(sync::update_settings),
        )
        .route("/sync/upload", post(sync::upload))
        .route("/sync/download", post(sync::download))
        .route("/search", get(search::search))
        .route("/events", get(events::sse_events))
        .route("/status", get(events::status))
        .route("/logs", get(events::list_logs))
        .route("/logs/stream", get(events::stream_logs))
}

// ── Shared types and helpers used across sub-modules ────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_log_line(status: StatusCode, target: &str, message: &str) -> String {
    format!("[{}] {} {}", target, status.as_u16(), message)
}

fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let line = api_log_line(status, target, message.as_ref());
    if status.is_server_error() {
        log::error!(target: target, "{}", line);
    } else {
        log::warn!(target: target, "{}", line);
    }
}

fn api_error(status: StatusCode, target: &'static str, message: impl Into<String>) -> ApiError {
    let error = message.into();
    log_api_issue(status, target, &error);
    (status, Json(ErrorResponse { error }))
}

fn parse_tab(raw: &str) -> Result<TabId, ApiError> {
    TabId::parse(raw).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "printboard.api",
            format!("Unknown tab: {}", raw),
        )
    })
}

fn parse_column(raw: &str) -> Result<ColumnId, ApiError> {
    ColumnId::parse(raw).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "printboard.api",
            format!("Unknown column: {}", raw),
        )
    })
}

/// `{ "success": bool }` body for commands that may be no-ops.
fn outcome(success: bool) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": success }))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_segments() {
        assert_eq!(parse_tab("work").unwrap(), TabId::Work);
        assert_eq!(parse_column("inProgress").unwrap(), ColumnId::InProgress);
        let (status, Json(body)) = parse_tab("hobby").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Unknown tab: hobby");
    }

    #[test]
    fn test_api_log_line_carries_prefix() {
        assert_eq!(
            api_log_line(StatusCode::BAD_GATEWAY, "printboard.api.sync", "Network error"),
            "[printboard.api.sync] 502 Network error"
        );
    }

    #[test]
    fn test_router_builds() {
        let _router: Router<ServerState> = api_router();
    }
}
