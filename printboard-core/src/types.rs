use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Top-level card category. The set is fixed; tabs are never created or destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TabId {
    Personal,
    Work,
    Others,
}

impl TabId {
    pub const ALL: [TabId; 3] = [TabId::Personal, TabId::Work, TabId::Others];

    pub fn as_str(self) -> &'static str {
        match self {
            TabId::Personal => "personal",
            TabId::Work => "work",
            TabId::Others => "others",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TabId::Personal => "Personal",
            TabId::Work => "Work",
            TabId::Others => "Others",
        }
    }

    pub fn parse(s: &str) -> Option<TabId> {
        TabId::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow stage. Order of `ALL` is the keyboard traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnId {
    Backlog,
    Priority,
    ToPrint,
    InProgress,
    Done,
}

impl ColumnId {
    pub const ALL: [ColumnId; 5] = [
        ColumnId::Backlog,
        ColumnId::Priority,
        ColumnId::ToPrint,
        ColumnId::InProgress,
        ColumnId::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnId::Backlog => "backlog",
            ColumnId::Priority => "priority",
            ColumnId::ToPrint => "toPrint",
            ColumnId::InProgress => "inProgress",
            ColumnId::Done => "done",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ColumnId::Backlog => "Backlog",
            ColumnId::Priority => "Priority",
            ColumnId::ToPrint => "To Print",
            ColumnId::InProgress => "In Progress",
            ColumnId::Done => "Done",
        }
    }

    pub fn parse(s: &str) -> Option<ColumnId> {
        ColumnId::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Position in the fixed column sequence.
    pub fn position(self) -> usize {
        ColumnId::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either one tab or the "show all tabs" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActiveTab {
    #[default]
    All,
    Personal,
    Work,
    Others,
}

impl ActiveTab {
    pub fn tab(self) -> Option<TabId> {
        match self {
            ActiveTab::All => None,
            ActiveTab::Personal => Some(TabId::Personal),
            ActiveTab::Work => Some(TabId::Work),
            ActiveTab::Others => Some(TabId::Others),
        }
    }
}

impl From<TabId> for ActiveTab {
    fn from(tab: TabId) -> Self {
        match tab {
            TabId::Personal => ActiveTab::Personal,
            TabId::Work => ActiveTab::Work,
            TabId::Others => ActiveTab::Others,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub title: String,
    /// Derived from `title`, 0..=3.
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_print_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Only shown in the `others` tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who_for: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial card update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub materials: Option<String>,
    #[serde(default)]
    pub est_print_time: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub who_for: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub card_order: Vec<String>,
}

impl Column {
    pub fn empty(id: ColumnId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            card_order: Vec::new(),
        }
    }
}

/// The five fixed columns of a tab. Modelled as a struct so a tab can never
/// be missing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Columns {
    pub backlog: Column,
    pub priority: Column,
    pub to_print: Column,
    pub in_progress: Column,
    pub done: Column,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            backlog: Column::empty(ColumnId::Backlog),
            priority: Column::empty(ColumnId::Priority),
            to_print: Column::empty(ColumnId::ToPrint),
            in_progress: Column::empty(ColumnId::InProgress),
            done: Column::empty(ColumnId::Done),
        }
    }
}

impl Columns {
    pub fn get(&self, id: ColumnId) -> &Column {
        match id {
            ColumnId::Backlog => &self.backlog,
            ColumnId::Priority => &self.priority,
            ColumnId::ToPrint => &self.to_print,
            ColumnId::InProgress => &self.in_progress,
            ColumnId::Done => &self.done,
        }
    }

    pub fn get_mut(&mut self, id: ColumnId) -> &mut Column {
        match id {
            ColumnId::Backlog => &mut self.backlog,
            ColumnId::Priority => &mut self.priority,
            ColumnId::ToPrint => &mut self.to_print,
            ColumnId::InProgress => &mut self.in_progress,
            ColumnId::Done => &mut self.done,
        }
    }

    /// Columns in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        ColumnId::ALL.into_iter().map(move |id| self.get(id))
    }

    /// Column whose order list contains `card_id`.
    pub fn column_of(&self, card_id: &str) -> Option<ColumnId> {
        ColumnId::ALL
            .into_iter()
            .find(|id| self.get(*id).card_order.iter().any(|c| c == card_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabBoard {
    pub id: TabId,
    pub title: String,
    pub columns: Columns,
    /// Source of truth for card content; columns only hold ids.
    pub cards: BTreeMap<String, Card>,
}

impl TabBoard {
    pub fn empty(id: TabId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            columns: Columns::default(),
            cards: BTreeMap::new(),
        }
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tabs {
    pub personal: TabBoard,
    pub work: TabBoard,
    pub others: TabBoard,
}

impl Default for Tabs {
    fn default() -> Self {
        Self {
            personal: TabBoard::empty(TabId::Personal),
            work: TabBoard::empty(TabId::Work),
            others: TabBoard::empty(TabId::Others),
        }
    }
}

impl Tabs {
    pub fn get(&self, id: TabId) -> &TabBoard {
        match id {
            TabId::Personal => &self.personal,
            TabId::Work => &self.work,
            TabId::Others => &self.others,
        }
    }

    pub fn get_mut(&mut self, id: TabId) -> &mut TabBoard {
        match id {
            TabId::Personal => &mut self.personal,
            TabId::Work => &mut self.work,
            TabId::Others => &mut self.others,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabBoard> {
        TabId::ALL.into_iter().map(move |id| self.get(id))
    }

    /// Tab whose card map holds `card_id`.
    pub fn owner_of(&self, card_id: &str) -> Option<TabId> {
        TabId::ALL
            .into_iter()
            .find(|id| self.get(*id).cards.contains_key(card_id))
    }

    pub fn total_cards(&self) -> usize {
        self.iter().map(TabBoard::card_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiFlags {
    #[serde(default)]
    pub show_quick_guide: bool,
    #[serde(default = "default_true")]
    pub show_details: bool,
    #[serde(default)]
    pub is_dragging: bool,
    /// Opaque token; a new value asks the view to focus the search box.
    #[serde(default)]
    pub search_focus_request: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl Default for UiFlags {
    fn default() -> Self {
        Self {
            show_quick_guide: false,
            show_details: true,
            is_dragging: false,
            search_focus_request: None,
        }
    }
}

/// Per-card display overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editing_notes: Option<bool>,
}

/// Root aggregate. Only the board engine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub tabs: Tabs,
    #[serde(default)]
    pub active_tab: ActiveTab,
    #[serde(default)]
    pub filter_query: String,
    #[serde(default)]
    pub ui: UiFlags,
    #[serde(default)]
    pub card_ui: BTreeMap<String, CardUi>,
    #[serde(default)]
    pub selected_card_id: Option<String>,
    #[serde(default)]
    pub selected_card_tab: Option<TabId>,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            tabs: Tabs::default(),
            active_tab: ActiveTab::All,
            filter_query: String::new(),
            ui: UiFlags::default(),
            card_ui: BTreeMap::new(),
            selected_card_id: None,
            selected_card_tab: None,
        }
    }
}

impl AppState {
    /// Check the order-list / card-map invariant for every tab, and that no
    /// card id is owned by more than one tab.
    /// Returns a description of the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut owners: std::collections::HashMap<&str, TabId> = std::collections::HashMap::new();
        for tab in self.tabs.iter() {
            for id in tab.cards.keys() {
                if let Some(owner) = owners.insert(id.as_str(), tab.id) {
                    return Err(format!(
                        "card {} is owned by both tab {} and tab {}",
                        id, owner, tab.id
                    ));
                }
            }
            let mut seen = std::collections::HashSet::new();
            for column in tab.columns.iter() {
                for id in &column.card_order {
                    if !tab.cards.contains_key(id) {
                        return Err(format!(
                            "tab {}: column {} references unknown card {}",
                            tab.id, column.id, id
                        ));
                    }
                    if !seen.insert(id.as_str()) {
                        return Err(format!(
                            "tab {}: card {} appears in more than one position",
                            tab.id, id
                        ));
                    }
                }
            }
            if let Some(orphan) = tab.cards.keys().find(|id| !seen.contains(id.as_str())) {
                return Err(format!(
                    "tab {}: card {} is not in any column",
                    tab.id, orphan
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_shape() {
        let state = AppState::default();
        assert_eq!(state.schema_version, 1);
        assert_eq!(state.active_tab, ActiveTab::All);
        assert!(state.ui.show_details);
        assert_eq!(state.tabs.total_cards(), 0);
        assert_eq!(state.tabs.others.title, "Others");
        assert_eq!(state.tabs.work.columns.to_print.title, "To Print");
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(AppState::default()).unwrap();
        assert_eq!(json["activeTab"], "all");
        assert!(json["tabs"]["personal"]["columns"]["inProgress"]["cardOrder"].is_array());
        assert_eq!(json["tabs"]["work"]["columns"]["toPrint"]["id"], "toPrint");
        assert_eq!(json["ui"]["showDetails"], true);
    }

    #[test]
    fn test_consistency_detects_orphans() {
        let mut state = AppState::default();
        state
            .tabs
            .personal
            .columns
            .backlog
            .card_order
            .push("ghost".to_string());
        assert!(state.check_consistency().unwrap_err().contains("ghost"));
    }

    #[test]
    fn test_consistency_detects_card_owned_by_two_tabs() {
        let card = Card {
            id: "abcd1234".to_string(),
            title: "Bracket".to_string(),
            priority: 0,
            materials: None,
            est_print_time: None,
            deadline: None,
            notes: None,
            who_for: None,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let mut state = AppState::default();
        for tab in [TabId::Personal, TabId::Work] {
            let board = state.tabs.get_mut(tab);
            board.cards.insert(card.id.clone(), card.clone());
            board.columns.backlog.card_order.push(card.id.clone());
        }
        let err = state.check_consistency().unwrap_err();
        assert!(err.contains("abcd1234"));
        assert!(err.contains("personal") && err.contains("work"));
    }

    #[test]
    fn test_column_parse_roundtrip_names() {
        for id in ColumnId::ALL {
            assert_eq!(ColumnId::parse(id.as_str()), Some(id));
        }
        assert_eq!(TabId::parse("others"), Some(TabId::Others));
        assert_eq!(TabId::parse("all"), None);
    }
}
