/// Change notifications published by the board engine.
use serde::{Deserialize, Serialize};

use crate::types::{ColumnId, TabId};

/// What kind of mutation produced a new revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BoardChange {
    CardAdded {
        tab: TabId,
        column: ColumnId,
        card_id: String,
    },
    CardUpdated {
        tab: TabId,
        card_id: String,
    },
    CardDuplicated {
        tab: TabId,
        source_id: String,
        card_id: String,
    },
    CardDeleted {
        tab: TabId,
        card_id: String,
    },
    CardsReordered {
        tab: TabId,
        column: ColumnId,
    },
    CardMoved {
        from_tab: TabId,
        to_tab: TabId,
        from_column: ColumnId,
        to_column: ColumnId,
        card_id: String,
    },
    DoneWiped {
        tab: Option<TabId>,
        removed: usize,
    },
    TabWiped {
        tab: TabId,
    },
    AllWiped,
    StateReplaced,
    SelectionChanged,
    ViewChanged,
}

/// Broadcast payload: monotonic revision plus the change that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardChangeEvent {
    pub revision: u64,
    pub change: BoardChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_tagged() {
        let event = BoardChangeEvent {
            revision: 7,
            change: BoardChange::CardMoved {
                from_tab: TabId::Personal,
                to_tab: TabId::Work,
                from_column: ColumnId::Backlog,
                to_column: ColumnId::InProgress,
                card_id: "abcd1234".to_string(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["revision"], 7);
        assert_eq!(json["change"]["type"], "cardMoved");
        assert_eq!(json["change"]["toColumn"], "inProgress");
    }
}
