/// Export document: the shareable subset of the board state.
///
/// Selection is session-local and never exported. The same document shape
/// is used for file export and for the remote sync payload.
pub mod import;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ActiveTab, AppState, CardUi, Tabs, UiFlags, CURRENT_SCHEMA_VERSION};

/// Suggested file name for exported boards.
pub const EXPORT_FILE_NAME: &str = "3d-print-board.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default = "current_version")]
    pub schema_version: u32,
    pub tabs: Tabs,
    #[serde(default)]
    pub active_tab: ActiveTab,
    #[serde(default)]
    pub ui: UiFlags,
    #[serde(default)]
    pub card_ui: BTreeMap<String, CardUi>,
    #[serde(default)]
    pub filter_query: String,
}

fn current_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl ExportDocument {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            schema_version: state.schema_version,
            tabs: state.tabs.clone(),
            active_tab: state.active_tab,
            ui: state.ui.clone(),
            card_ui: state.card_ui.clone(),
            filter_query: state.filter_query.clone(),
        }
    }

    /// Full state with no selection.
    pub fn into_state(self) -> AppState {
        AppState {
            schema_version: self.schema_version,
            tabs: self.tabs,
            active_tab: self.active_tab,
            filter_query: self.filter_query,
            ui: self.ui,
            card_ui: self.card_ui,
            selected_card_id: None,
            selected_card_tab: None,
        }
    }

    /// Pretty-printed JSON (two-space indent) for file export.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Compact JSON for the sync payload.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
