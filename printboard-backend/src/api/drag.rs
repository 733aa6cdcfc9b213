use axum::{extract::State, response::Json};
use printboard_core::dnd::{begin_drag, end_drag, hover_tab, DragCommand, DragSource, DropTarget};
use printboard_core::engine::lock_engine;
use printboard_core::types::ActiveTab;
use serde::Deserialize;

use super::outcome;
use crate::state::ServerState;

#[derive(Deserialize)]
pub struct HoverBody {
    tab: ActiveTab,
}

#[derive(Deserialize)]
pub struct DropBody {
    source: DragSource,
    /// Absent when released outside any column.
    #[serde(default)]
    target: Option<DropTarget>,
}

pub async fn start(
    State(state): State<ServerState>,
    Json(source): Json<DragSource>,
) -> Json<serde_json::Value> {
    begin_drag(&mut lock_engine(&state.engine), &source);
    outcome(true)
}

pub async fn hover(
    State(state): State<ServerState>,
    Json(body): Json<HoverBody>,
) -> Json<serde_json::Value> {
    outcome(hover_tab(&mut lock_engine(&state.engine), body.tab))
}

/// Returns the command the drop resolved to.
pub async fn end(
    State(state): State<ServerState>,
    Json(body): Json<DropBody>,
) -> Json<DragCommand> {
    let mut engine = lock_engine(&state.engine);
    Json(end_drag(&mut engine, &body.source, body.target.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::server_state;
    use printboard_core::types::{ColumnId, TabId};

    #[tokio::test]
    async fn test_drag_session_moves_card_across_tabs() {
        let state = server_state();
        let id = lock_engine(&state.engine).add_card(TabId::Personal, ColumnId::Backlog, "Bracket");
        let source = DragSource {
            tab: TabId::Personal,
            column: ColumnId::Backlog,
            index: 0,
            card_id: id.clone(),
        };

        start(State(state.clone()), Json(source.clone())).await;
        let Json(switched) = hover(
            State(state.clone()),
            Json(HoverBody {
                tab: ActiveTab::Work,
            }),
        )
        .await;
        assert_eq!(switched["success"], true);

        let Json(command) = end(
            State(state.clone()),
            Json(DropBody {
                source,
                target: Some(DropTarget {
                    tab: Some(TabId::Work),
                    column: Some(ColumnId::ToPrint),
                    index: None,
                }),
            }),
        )
        .await;
        assert!(matches!(command, DragCommand::Move { .. }));

        let engine = lock_engine(&state.engine);
        assert!(!engine.state().ui.is_dragging);
        assert_eq!(engine.state().tabs.work.columns.to_print.card_order, vec![id]);
        assert_eq!(engine.state().active_tab, ActiveTab::Work);
    }

    #[tokio::test]
    async fn test_hover_without_drag_is_ignored() {
        let state = server_state();
        let Json(result) = hover(
            State(state.clone()),
            Json(HoverBody {
                tab: ActiveTab::Others,
            }),
        )
        .await;
        assert_eq!(result["success"], false);
        assert_eq!(lock_engine(&state.engine).state().active_tab, ActiveTab::All);
    }
}
