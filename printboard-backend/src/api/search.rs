use axum::{
    extract::{Query, State},
    response::Json,
};
use printboard_core::engine::lock_engine;
use printboard_core::search::search_cards;
use serde::Deserialize;

use crate::state::ServerState;

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

pub async fn search(
    State(state): State<ServerState>,
    Query(params): Query<SearchQuery>,
) -> Json<serde_json::Value> {
    let query = params.q.unwrap_or_default();
    let results = search_cards(lock_engine(&state.engine).state(), &query);
    Json(serde_json::json!({ "query": query, "results": results }))
}
