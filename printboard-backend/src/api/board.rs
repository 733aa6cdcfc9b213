use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use printboard_core::engine::{lock_engine, MoveDirection};
use printboard_core::search::visible_cards;
use printboard_core::types::{ActiveTab, AppState, Card, CardPatch, ColumnId, TabId};
use serde::Deserialize;

use super::{api_error, outcome, parse_column, parse_tab, ApiError};
use crate::state::ServerState;

#[derive(Deserialize)]
pub struct AddCardBody {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
pub struct ReorderBody {
    from: usize,
    to: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardBody {
    from_tab: TabId,
    to_tab: TabId,
    from_column: ColumnId,
    to_column: ColumnId,
    card_id: String,
    #[serde(default)]
    to_index: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBody {
    #[serde(default)]
    tab: Option<TabId>,
    #[serde(default)]
    card_id: Option<String>,
}

#[derive(Deserialize)]
pub struct MoveSelectionBody {
    /// `-1` (left) or `1` (right).
    step: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetailsBody {
    card_id: String,
    #[serde(default)]
    details: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewBody {
    #[serde(default)]
    active_tab: Option<ActiveTab>,
    #[serde(default)]
    filter_query: Option<String>,
    #[serde(default)]
    show_quick_guide: Option<bool>,
    #[serde(default)]
    show_details: Option<bool>,
    #[serde(default)]
    search_focus_request: Option<i64>,
    #[serde(default)]
    card_details: Option<CardDetailsBody>,
}

#[derive(Deserialize, Default)]
pub struct WipeDoneBody {
    #[serde(default)]
    tab: Option<TabId>,
}

pub async fn get_state(State(state): State<ServerState>) -> Json<AppState> {
    Json(lock_engine(&state.engine).snapshot())
}

/// Cards of one column in display order, after the current filter.
pub async fn column_cards(
    State(state): State<ServerState>,
    Path((tab, column)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tab = parse_tab(&tab)?;
    let column = parse_column(&column)?;
    let engine = lock_engine(&state.engine);
    let board = engine.state().tabs.get(tab);
    let cards: Vec<&Card> = visible_cards(engine.state(), tab, column)
        .iter()
        .filter_map(|id| board.cards.get(id))
        .collect();
    Ok(Json(serde_json::json!({
        "tab": tab,
        "column": column,
        "title": column.title(),
        "total": board.columns.get(column).card_order.len(),
        "cards": cards,
    })))
}

pub async fn add_card(
    State(state): State<ServerState>,
    Path((tab, column)): Path<(String, String)>,
    Json(body): Json<AddCardBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let tab = parse_tab(&tab)?;
    let column = parse_column(&column)?;
    let id = lock_engine(&state.engine).add_card(tab, column, &body.title);
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

pub async fn add_current_card(
    State(state): State<ServerState>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut engine = lock_engine(&state.engine);
    let id = engine.add_item_to_current_column();
    let tab = engine.state().selected_card_tab;
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "tab": tab })),
    )
}

pub async fn update_card(
    State(state): State<ServerState>,
    Path((tab, id)): Path<(String, String)>,
    Json(patch): Json<CardPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tab = parse_tab(&tab)?;
    let mut engine = lock_engine(&state.engine);
    if !engine.update_card(tab, &id, patch) {
        return Err(card_not_found(tab, &id));
    }
    let card = engine.state().tabs.get(tab).cards.get(&id).cloned();
    Ok(Json(serde_json::json!({ "card": card })))
}

pub async fn duplicate_card(
    State(state): State<ServerState>,
    Path((tab, id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let tab = parse_tab(&tab)?;
    let copy = lock_engine(&state.engine)
        .duplicate_card(tab, &id)
        .ok_or_else(|| card_not_found(tab, &id))?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": copy }))))
}

/// Deleting a missing card succeeds with `success: false`.
pub async fn delete_card(
    State(state): State<ServerState>,
    Path((tab, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tab = parse_tab(&tab)?;
    Ok(outcome(lock_engine(&state.engine).delete_card(tab, &id)))
}

pub async fn reorder_card(
    State(state): State<ServerState>,
    Path((tab, column)): Path<(String, String)>,
    Json(body): Json<ReorderBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tab = parse_tab(&tab)?;
    let column = parse_column(&column)?;
    Ok(outcome(lock_engine(&state.engine).move_card_within(
        tab, column, body.from, body.to,
    )))
}

pub async fn move_card(
    State(state): State<ServerState>,
    Json(body): Json<MoveCardBody>,
) -> Json<serde_json::Value> {
    outcome(lock_engine(&state.engine).move_card_to(
        body.from_tab,
        body.to_tab,
        body.from_column,
        body.to_column,
        &body.card_id,
        body.to_index,
    ))
}

pub async fn set_selection(
    State(state): State<ServerState>,
    Json(body): Json<SelectionBody>,
) -> Json<serde_json::Value> {
    let mut engine = lock_engine(&state.engine);
    match (body.tab, body.card_id) {
        (None, Some(id)) => engine.select_card(&id),
        (tab, id) => engine.set_selected_card(tab, id),
    }
    Json(serde_json::json!({
        "selectedCardId": engine.state().selected_card_id,
        "selectedCardTab": engine.state().selected_card_tab,
    }))
}

pub async fn move_selection(
    State(state): State<ServerState>,
    Json(body): Json<MoveSelectionBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let direction = MoveDirection::from_step(body.step).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "printboard.api.selection",
            format!("Step must be -1 or 1, got {}", body.step),
        )
    })?;
    Ok(outcome(lock_engine(&state.engine).move_selected_card(direction)))
}

pub async fn toggle_notes(State(state): State<ServerState>) -> Json<serde_json::Value> {
    outcome(lock_engine(&state.engine).toggle_selected_notes())
}

/// Apply any combination of view changes in one request.
pub async fn update_view(
    State(state): State<ServerState>,
    Json(body): Json<ViewBody>,
) -> Json<serde_json::Value> {
    let mut engine = lock_engine(&state.engine);
    if let Some(tab) = body.active_tab {
        engine.set_active_tab(tab);
    }
    if let Some(query) = body.filter_query {
        engine.set_filter_query(&query);
    }
    if body
        .show_quick_guide
        .is_some_and(|v| v != engine.state().ui.show_quick_guide)
    {
        engine.toggle_quick_guide();
    }
    if body
        .show_details
        .is_some_and(|v| v != engine.state().ui.show_details)
    {
        engine.toggle_global_details();
    }
    if let Some(token) = body.search_focus_request {
        engine.request_search_focus(token);
    }
    if let Some(card) = body.card_details {
        engine.set_card_details_override(&card.card_id, card.details);
    }
    let current = engine.state();
    Json(serde_json::json!({
        "activeTab": current.active_tab,
        "filterQuery": current.filter_query,
        "ui": current.ui,
    }))
}

pub async fn wipe_done(
    State(state): State<ServerState>,
    body: Option<Json<WipeDoneBody>>,
) -> Json<serde_json::Value> {
    let tab = body.and_then(|Json(b)| b.tab);
    let removed = lock_engine(&state.engine).wipe_done(tab);
    Json(serde_json::json!({ "removed": removed }))
}

pub async fn wipe_tab(
    State(state): State<ServerState>,
    Path(tab): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tab = parse_tab(&tab)?;
    Ok(outcome(lock_engine(&state.engine).wipe_tab(tab)))
}

pub async fn wipe_all(State(state): State<ServerState>) -> Json<serde_json::Value> {
    lock_engine(&state.engine).wipe_all();
    outcome(true)
}

fn card_not_found(tab: TabId, id: &str) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "printboard.api.card",
        format!("Card not found: {}/{}", tab, id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::server_state;

    fn path2(a: &str, b: &str) -> Path<(String, String)> {
        Path((a.to_string(), b.to_string()))
    }

    #[tokio::test]
    async fn test_add_then_list_column() {
        let state = server_state();
        let (status, Json(created)) = add_card(
            State(state.clone()),
            path2("work", "toPrint"),
            Json(AddCardBody {
                title: "** Cable chain".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let Json(listed) = column_cards(State(state.clone()), path2("work", "toPrint"))
            .await
            .unwrap();
        assert_eq!(listed["cards"][0]["id"], id.as_str());
        assert_eq!(listed["cards"][0]["priority"], 2);
        assert_eq!(listed["title"], "To Print");
    }

    #[tokio::test]
    async fn test_unknown_tab_is_bad_request() {
        let state = server_state();
        let (status, _) = column_cards(State(state), path2("hobby", "backlog"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_missing_card_is_not_found() {
        let state = server_state();
        let (status, Json(body)) = update_card(
            State(state),
            path2("personal", "nope"),
            Json(CardPatch::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.contains("nope"));
    }

    #[tokio::test]
    async fn test_column_listing_honors_filter() {
        let state = server_state();
        {
            let mut engine = lock_engine(&state.engine);
            engine.add_card(TabId::Personal, ColumnId::Backlog, "Benchy");
            engine.add_card(TabId::Personal, ColumnId::Backlog, "Spool holder");
        }
        update_view(
            State(state.clone()),
            Json(ViewBody {
                filter_query: Some("spool".to_string()),
                ..ViewBody::default()
            }),
        )
        .await;

        let Json(listed) = column_cards(State(state), path2("personal", "backlog"))
            .await
            .unwrap();
        assert_eq!(listed["cards"].as_array().unwrap().len(), 1);
        assert_eq!(listed["total"], 2);
    }

    #[tokio::test]
    async fn test_view_toggles_only_on_change() {
        let state = server_state();
        let Json(view) = update_view(
            State(state.clone()),
            Json(ViewBody {
                show_details: Some(true),
                show_quick_guide: Some(true),
                ..ViewBody::default()
            }),
        )
        .await;
        assert_eq!(view["ui"]["showDetails"], true);
        assert_eq!(view["ui"]["showQuickGuide"], true);
    }

    #[tokio::test]
    async fn test_move_selection_rejects_bad_step() {
        let state = server_state();
        let (status, _) = move_selection(State(state), Json(MoveSelectionBody { step: 2 }))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wipe_done_without_body_covers_all_tabs() {
        let state = server_state();
        {
            let mut engine = lock_engine(&state.engine);
            engine.add_card(TabId::Personal, ColumnId::Done, "a");
            engine.add_card(TabId::Others, ColumnId::Done, "b");
            engine.add_card(TabId::Others, ColumnId::Backlog, "c");
        }
        let Json(result) = wipe_done(State(state.clone()), None).await;
        assert_eq!(result["removed"], 2);
        assert_eq!(lock_engine(&state.engine).state().tabs.total_cards(), 1);
    }
}
