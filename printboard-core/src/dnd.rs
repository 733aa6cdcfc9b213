/// Drag-and-drop gesture translation.
///
/// A finished drag is described by where the card came from and where it
/// was released. `translate` turns that pair into exactly one engine call
/// (or none), and the session helpers keep the dragging flag and the
/// hover-to-switch-tab behavior in one place.
use serde::{Deserialize, Serialize};

use crate::engine::BoardEngine;
use crate::types::{ActiveTab, ColumnId, TabId};

/// Where the dragged card started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSource {
    pub tab: TabId,
    pub column: ColumnId,
    pub index: usize,
    pub card_id: String,
}

/// What the pointer was over on release. A column body carries no index;
/// a card carries its index. Missing tab/column inherit the source's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    #[serde(default)]
    pub tab: Option<TabId>,
    #[serde(default)]
    pub column: Option<ColumnId>,
    #[serde(default)]
    pub index: Option<usize>,
}

/// The engine call a drag resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DragCommand {
    Reorder {
        tab: TabId,
        column: ColumnId,
        from_index: usize,
        to_index: usize,
    },
    Move {
        from_tab: TabId,
        to_tab: TabId,
        from_column: ColumnId,
        to_column: ColumnId,
        card_id: String,
        to_index: Option<usize>,
    },
    /// Dropped outside any column, or back onto its own slot.
    Abandon,
}

/// Resolve a drop into a single engine command.
pub fn translate(source: &DragSource, target: Option<&DropTarget>) -> DragCommand {
    let Some(target) = target else {
        return DragCommand::Abandon;
    };
    let to_tab = target.tab.unwrap_or(source.tab);
    let to_column = target.column.unwrap_or(source.column);

    if to_tab == source.tab && to_column == source.column {
        let to_index = target.index.unwrap_or(source.index);
        if to_index == source.index {
            return DragCommand::Abandon;
        }
        return DragCommand::Reorder {
            tab: source.tab,
            column: source.column,
            from_index: source.index,
            to_index,
        };
    }

    DragCommand::Move {
        from_tab: source.tab,
        to_tab,
        from_column: source.column,
        to_column,
        card_id: source.card_id.clone(),
        to_index: target.index,
    }
}

impl DragCommand {
    /// Run the command against the engine. Returns whether state changed.
    pub fn apply(&self, engine: &mut BoardEngine) -> bool {
        match self {
            DragCommand::Reorder {
                tab,
                column,
                from_index,
                to_index,
            } => engine.move_card_within(*tab, *column, *from_index, *to_index),
            DragCommand::Move {
                from_tab,
                to_tab,
                from_column,
                to_column,
                card_id,
                to_index,
            } => engine.move_card_to(
                *from_tab,
                *to_tab,
                *from_column,
                *to_column,
                card_id,
                *to_index,
            ),
            DragCommand::Abandon => false,
        }
    }
}

/// Pointer went down on a card and started moving.
pub fn begin_drag(engine: &mut BoardEngine, source: &DragSource) {
    engine.set_dragging(true);
    engine.select_card(&source.card_id);
}

/// Pointer hovers a tab button mid-drag. Only switches the displayed tab
/// while dragging, and never to the "all" view.
pub fn hover_tab(engine: &mut BoardEngine, tab: ActiveTab) -> bool {
    if !engine.state().ui.is_dragging || tab == ActiveTab::All {
        return false;
    }
    engine.set_active_tab(tab);
    true
}

/// Pointer released. Clears the dragging flag and applies the drop.
pub fn end_drag(
    engine: &mut BoardEngine,
    source: &DragSource,
    target: Option<&DropTarget>,
) -> DragCommand {
    engine.set_dragging(false);
    let command = translate(source, target);
    if !command.apply(engine) && command != DragCommand::Abandon {
        log::debug!("[printboard.dnd] Drop had no effect: {:?}", command);
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(tab: TabId, column: ColumnId, index: usize, card_id: &str) -> DragSource {
        DragSource {
            tab,
            column,
            index,
            card_id: card_id.to_string(),
        }
    }

    #[test]
    fn test_no_target_abandons() {
        let src = source(TabId::Work, ColumnId::Backlog, 0, "a");
        assert_eq!(translate(&src, None), DragCommand::Abandon);
    }

    #[test]
    fn test_same_column_reorders() {
        let src = source(TabId::Work, ColumnId::Backlog, 0, "a");
        let target = DropTarget {
            tab: Some(TabId::Work),
            column: Some(ColumnId::Backlog),
            index: Some(3),
        };
        assert_eq!(
            translate(&src, Some(&target)),
            DragCommand::Reorder {
                tab: TabId::Work,
                column: ColumnId::Backlog,
                from_index: 0,
                to_index: 3,
            }
        );
    }

    #[test]
    fn test_same_slot_abandons() {
        let src = source(TabId::Work, ColumnId::Backlog, 2, "a");
        let on_column_body = DropTarget {
            column: Some(ColumnId::Backlog),
            ..Default::default()
        };
        assert_eq!(translate(&src, Some(&on_column_body)), DragCommand::Abandon);
    }

    #[test]
    fn test_other_column_moves_with_optional_index() {
        let src = source(TabId::Personal, ColumnId::Backlog, 1, "a");
        let target = DropTarget {
            tab: None,
            column: Some(ColumnId::Done),
            index: None,
        };
        assert_eq!(
            translate(&src, Some(&target)),
            DragCommand::Move {
                from_tab: TabId::Personal,
                to_tab: TabId::Personal,
                from_column: ColumnId::Backlog,
                to_column: ColumnId::Done,
                card_id: "a".into(),
                to_index: None,
            }
        );
    }

    #[test]
    fn test_cross_tab_drag_migrates_card() {
        let mut engine = BoardEngine::default();
        let id = engine.add_card(TabId::Personal, ColumnId::Backlog, "Bookend");
        let src = source(TabId::Personal, ColumnId::Backlog, 0, &id);

        begin_drag(&mut engine, &src);
        assert!(engine.state().ui.is_dragging);
        assert!(hover_tab(&mut engine, ActiveTab::Work));
        assert!(!hover_tab(&mut engine, ActiveTab::All));
        assert_eq!(engine.state().active_tab, ActiveTab::Work);

        let target = DropTarget {
            tab: Some(TabId::Work),
            column: Some(ColumnId::ToPrint),
            index: Some(0),
        };
        let command = end_drag(&mut engine, &src, Some(&target));
        assert!(matches!(command, DragCommand::Move { .. }));

        let state = engine.state();
        assert!(!state.ui.is_dragging);
        assert!(state.tabs.personal.cards.is_empty());
        assert_eq!(state.tabs.work.columns.to_print.card_order, vec![id]);
        assert!(state.check_consistency().is_ok());
    }

    #[test]
    fn test_hover_ignored_when_not_dragging() {
        let mut engine = BoardEngine::default();
        assert!(!hover_tab(&mut engine, ActiveTab::Others));
        assert_eq!(engine.state().active_tab, ActiveTab::All);
    }

    #[test]
    fn test_drop_outside_leaves_state() {
        let mut engine = BoardEngine::default();
        let id = engine.add_card(TabId::Others, ColumnId::Priority, "Badge");
        let src = source(TabId::Others, ColumnId::Priority, 0, &id);
        begin_drag(&mut engine, &src);
        let before = engine.state().tabs.clone();
        assert_eq!(end_drag(&mut engine, &src, None), DragCommand::Abandon);
        assert_eq!(engine.state().tabs, before);
    }
}
