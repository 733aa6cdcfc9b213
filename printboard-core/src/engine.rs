/// Board engine: the only code path that mutates `AppState`.
///
/// Every operation runs to completion under `&mut self`, so a caller never
/// observes a half-applied change. Stale references (unknown card ids,
/// out-of-range indices) are silent no-ops. Each applied change bumps the
/// revision and is published on a broadcast channel; no-ops publish nothing.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::events::{BoardChange, BoardChangeEvent};
use crate::identity;
use crate::priority::{parse_priority_from_title, MAX_PRIORITY};
use crate::types::*;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Engine shared between the UI surface and background workers.
pub type SharedEngine = Arc<Mutex<BoardEngine>>;

/// Lock a shared engine. A poisoned lock still holds a consistent state
/// because every mutation completes before the guard is released.
pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, BoardEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Direction for the keyboard single-step column move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveDirection {
    Backward,
    Forward,
}

impl MoveDirection {
    /// Map a `-1` / `+1` key step to a direction.
    pub fn from_step(step: i32) -> Option<Self> {
        match step {
            -1 => Some(MoveDirection::Backward),
            1 => Some(MoveDirection::Forward),
            _ => None,
        }
    }

    fn neighbour(self, column: ColumnId) -> Option<ColumnId> {
        let pos = column.position();
        let target = match self {
            MoveDirection::Backward => pos.checked_sub(1)?,
            MoveDirection::Forward => pos + 1,
        };
        ColumnId::ALL.get(target).copied()
    }
}

#[derive(Debug)]
pub struct BoardEngine {
    state: AppState,
    revision: u64,
    /// `None` once the engine has been closed for shutdown.
    event_tx: Option<broadcast::Sender<BoardChangeEvent>>,
}

impl Default for BoardEngine {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl BoardEngine {
    pub fn new(state: AppState) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state,
            revision: 0,
            event_tx: Some(event_tx),
        }
    }

    /// Wrap the engine for sharing with background workers.
    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Owned copy of the current state, for persistence/export/sync.
    pub fn snapshot(&self) -> AppState {
        self.state.clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Receiver for change events. After `close_events` the receiver
    /// reports the channel as closed.
    pub fn subscribe(&self) -> broadcast::Receiver<BoardChangeEvent> {
        match &self.event_tx {
            Some(tx) => tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Close the change channel so background workers flush and exit.
    /// Mutations keep working but are no longer published.
    pub fn close_events(&mut self) {
        if self.event_tx.take().is_some() {
            log::debug!("[printboard.engine] Change channel closed");
        }
    }

    fn publish(&mut self, change: BoardChange) {
        self.revision += 1;
        log::debug!(
            "[printboard.engine] revision {}: {:?}",
            self.revision,
            change
        );
        if let Some(tx) = &self.event_tx {
            // No receivers is fine: nobody is listening yet.
            let _ = tx.send(BoardChangeEvent {
                revision: self.revision,
                change,
            });
        }
    }

    fn fresh_card_id(&self) -> String {
        let tabs = &self.state.tabs;
        identity::generate_unique_card_id(|candidate| tabs.owner_of(candidate).is_some())
    }

    /// Drop per-card view state and selection for a card that no longer exists.
    fn forget_card(&mut self, card_id: &str) {
        self.state.card_ui.remove(card_id);
        if self.state.selected_card_id.as_deref() == Some(card_id) {
            self.state.selected_card_id = None;
            self.state.selected_card_tab = None;
        }
    }

    // ── Card operations ─────────────────────────────────────────────────

    /// Create a card at the end of `column` and select it. Returns the new id.
    pub fn add_card(&mut self, tab: TabId, column: ColumnId, title: &str) -> String {
        let id = self.fresh_card_id();
        let now = identity::now_iso();
        let card = Card {
            id: id.clone(),
            title: title.to_string(),
            priority: parse_priority_from_title(title),
            materials: None,
            est_print_time: None,
            deadline: None,
            notes: None,
            who_for: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let board = self.state.tabs.get_mut(tab);
        board.cards.insert(id.clone(), card);
        board.columns.get_mut(column).card_order.push(id.clone());
        self.state.selected_card_id = Some(id.clone());
        self.state.selected_card_tab = Some(tab);

        self.publish(BoardChange::CardAdded {
            tab,
            column,
            card_id: id.clone(),
        });
        id
    }

    /// Add an untitled card next to the current selection: the selected
    /// card's tab and column, else the active tab's backlog (personal when
    /// all tabs are shown).
    pub fn add_item_to_current_column(&mut self) -> String {
        let mut tab = self.state.active_tab.tab().unwrap_or(TabId::Personal);
        let mut column = ColumnId::Backlog;
        if let (Some(id), Some(selected_tab)) =
            (&self.state.selected_card_id, self.state.selected_card_tab)
        {
            tab = selected_tab;
            if let Some(found) = self.state.tabs.get(tab).columns.column_of(id) {
                column = found;
            }
        }
        self.add_card(tab, column, "")
    }

    /// Merge `patch` into a card. A title in the patch always re-derives
    /// the priority; an explicit priority only sticks on an untitled card.
    pub fn update_card(&mut self, tab: TabId, id: &str, patch: CardPatch) -> bool {
        let Some(card) = self.state.tabs.get_mut(tab).cards.get_mut(id) else {
            log::debug!("[printboard.engine] update_card: {} not in {}", id, tab);
            return false;
        };

        let CardPatch {
            title,
            priority,
            materials,
            est_print_time,
            deadline,
            notes,
            who_for,
        } = patch;

        if let Some(title) = title {
            card.priority = parse_priority_from_title(&title);
            card.title = title;
        } else if let Some(priority) = priority {
            if card.title.trim().is_empty() {
                card.priority = priority.min(MAX_PRIORITY);
            } else {
                log::debug!(
                    "[printboard.engine] update_card: ignoring explicit priority for titled card {}",
                    id
                );
            }
        }
        if let Some(v) = materials {
            card.materials = non_empty(v);
        }
        if let Some(v) = est_print_time {
            card.est_print_time = non_empty(v);
        }
        if let Some(v) = deadline {
            card.deadline = non_empty(v);
        }
        if let Some(v) = notes {
            card.notes = non_empty(v);
        }
        if let Some(v) = who_for {
            card.who_for = non_empty(v);
        }
        card.updated_at = identity::now_iso();

        self.publish(BoardChange::CardUpdated {
            tab,
            card_id: id.to_string(),
        });
        true
    }

    /// Clone a card's content under a new id, right after the source.
    pub fn duplicate_card(&mut self, tab: TabId, id: &str) -> Option<String> {
        let board = self.state.tabs.get(tab);
        let source = board.cards.get(id)?.clone();
        let Some(column) = board.columns.column_of(id) else {
            log::warn!(
                "[printboard.engine] duplicate_card: {} has no column in {}",
                id,
                tab
            );
            return None;
        };

        let new_id = self.fresh_card_id();
        let now = identity::now_iso();
        let copy = Card {
            id: new_id.clone(),
            created_at: now.clone(),
            updated_at: now,
            ..source
        };

        let board = self.state.tabs.get_mut(tab);
        board.cards.insert(new_id.clone(), copy);
        let order = &mut board.columns.get_mut(column).card_order;
        let at = order
            .iter()
            .position(|c| c == id)
            .map(|p| p + 1)
            .unwrap_or(order.len());
        order.insert(at, new_id.clone());

        self.publish(BoardChange::CardDuplicated {
            tab,
            source_id: id.to_string(),
            card_id: new_id.clone(),
        });
        Some(new_id)
    }

    /// Remove a card from its column and the tab's card map.
    pub fn delete_card(&mut self, tab: TabId, id: &str) -> bool {
        let board = self.state.tabs.get_mut(tab);
        let mut removed = false;
        for column in ColumnId::ALL {
            let order = &mut board.columns.get_mut(column).card_order;
            let before = order.len();
            order.retain(|c| c != id);
            removed |= order.len() != before;
        }
        removed |= board.cards.remove(id).is_some();
        if !removed {
            return false;
        }

        self.forget_card(id);
        self.publish(BoardChange::CardDeleted {
            tab,
            card_id: id.to_string(),
        });
        true
    }

    // ── Ordering ────────────────────────────────────────────────────────

    /// Relocate the card at `from_index` to `to_index` within one column.
    pub fn move_card_within(
        &mut self,
        tab: TabId,
        column: ColumnId,
        from_index: usize,
        to_index: usize,
    ) -> bool {
        let order = &mut self.state.tabs.get_mut(tab).columns.get_mut(column).card_order;
        if from_index == to_index || from_index >= order.len() || to_index >= order.len() {
            return false;
        }
        let card_id = order.remove(from_index);
        order.insert(to_index, card_id);

        self.publish(BoardChange::CardsReordered { tab, column });
        true
    }

    /// Move a card to another column, possibly in another tab. A missing or
    /// out-of-range `to_index` appends. Crossing tabs transfers the card
    /// entry between the two card maps in the same step.
    pub fn move_card_to(
        &mut self,
        from_tab: TabId,
        to_tab: TabId,
        from_column: ColumnId,
        to_column: ColumnId,
        card_id: &str,
        to_index: Option<usize>,
    ) -> bool {
        let source = self.state.tabs.get(from_tab);
        if !source
            .columns
            .get(from_column)
            .card_order
            .iter()
            .any(|c| c == card_id)
        {
            log::debug!(
                "[printboard.engine] move_card_to: {} not in {}/{}",
                card_id,
                from_tab,
                from_column
            );
            return false;
        }
        if !source.cards.contains_key(card_id) {
            log::warn!(
                "[printboard.engine] move_card_to: {} listed in {}/{} without card entry",
                card_id,
                from_tab,
                from_column
            );
            return false;
        }
        if from_tab != to_tab && self.state.tabs.get(to_tab).cards.contains_key(card_id) {
            log::warn!(
                "[printboard.engine] move_card_to: {} already owned by {}",
                card_id,
                to_tab
            );
            return false;
        }

        self.state
            .tabs
            .get_mut(from_tab)
            .columns
            .get_mut(from_column)
            .card_order
            .retain(|c| c != card_id);

        if from_tab != to_tab {
            if let Some(card) = self.state.tabs.get_mut(from_tab).cards.remove(card_id) {
                self.state
                    .tabs
                    .get_mut(to_tab)
                    .cards
                    .insert(card_id.to_string(), card);
            }
        }

        let order = &mut self.state.tabs.get_mut(to_tab).columns.get_mut(to_column).card_order;
        match to_index {
            Some(index) if index <= order.len() => order.insert(index, card_id.to_string()),
            _ => order.push(card_id.to_string()),
        }

        self.state.selected_card_id = Some(card_id.to_string());
        self.state.selected_card_tab = Some(to_tab);

        self.publish(BoardChange::CardMoved {
            from_tab,
            to_tab,
            from_column,
            to_column,
            card_id: card_id.to_string(),
        });
        true
    }

    /// Move the selected card one column along the fixed sequence, appending
    /// it to the destination column.
    pub fn move_selected_card(&mut self, direction: MoveDirection) -> bool {
        let (Some(card_id), Some(tab)) = (
            self.state.selected_card_id.clone(),
            self.state.selected_card_tab,
        ) else {
            return false;
        };
        let Some(from_column) = self.state.tabs.get(tab).columns.column_of(&card_id) else {
            return false;
        };
        let Some(to_column) = direction.neighbour(from_column) else {
            return false;
        };

        let columns = &mut self.state.tabs.get_mut(tab).columns;
        columns
            .get_mut(from_column)
            .card_order
            .retain(|c| *c != card_id);
        columns.get_mut(to_column).card_order.push(card_id.clone());

        self.publish(BoardChange::CardMoved {
            from_tab: tab,
            to_tab: tab,
            from_column,
            to_column,
            card_id,
        });
        true
    }

    // ── Wipes ───────────────────────────────────────────────────────────

    /// Delete every card in the done column of `tab`, or of all tabs.
    /// Returns the number of cards removed.
    pub fn wipe_done(&mut self, tab: Option<TabId>) -> usize {
        let targets = match tab {
            Some(t) => vec![t],
            None => TabId::ALL.to_vec(),
        };

        let mut removed = Vec::new();
        for t in targets {
            let board = self.state.tabs.get_mut(t);
            let ids = std::mem::take(&mut board.columns.done.card_order);
            for id in &ids {
                board.cards.remove(id);
            }
            removed.extend(ids);
        }
        if removed.is_empty() {
            return 0;
        }

        for id in &removed {
            self.forget_card(id);
        }
        log::info!("[printboard.engine] Wiped {} done cards", removed.len());
        self.publish(BoardChange::DoneWiped {
            tab,
            removed: removed.len(),
        });
        removed.len()
    }

    /// Reset one tab to its empty shape, keeping its id and title.
    pub fn wipe_tab(&mut self, tab: TabId) -> bool {
        let board = self.state.tabs.get_mut(tab);
        let mut fresh = TabBoard::empty(tab);
        fresh.title = board.title.clone();
        if *board == fresh {
            return false;
        }
        let old = std::mem::replace(board, fresh);

        for id in old.cards.keys() {
            self.forget_card(id);
        }
        log::info!(
            "[printboard.engine] Wiped tab {} ({} cards)",
            tab,
            old.cards.len()
        );
        self.publish(BoardChange::TabWiped { tab });
        true
    }

    /// Reset everything to the initial empty state. The schema version never
    /// goes backwards.
    pub fn wipe_all(&mut self) {
        let version = self.state.schema_version.max(CURRENT_SCHEMA_VERSION);
        self.state = AppState {
            schema_version: version,
            ..AppState::default()
        };
        log::info!("[printboard.engine] Wiped all tabs");
        self.publish(BoardChange::AllWiped);
    }

    /// Replace the whole state (import, download). Selection is cleared
    /// because it may point at cards that no longer exist.
    pub fn replace_state(&mut self, state: AppState) {
        self.state = AppState {
            selected_card_id: None,
            selected_card_tab: None,
            ..state
        };
        self.publish(BoardChange::StateReplaced);
    }

    // ── Selection ───────────────────────────────────────────────────────

    pub fn set_selected_card(&mut self, tab: Option<TabId>, id: Option<String>) {
        if self.state.selected_card_tab == tab && self.state.selected_card_id == id {
            return;
        }
        self.state.selected_card_tab = tab;
        self.state.selected_card_id = id;
        self.publish(BoardChange::SelectionChanged);
    }

    /// Select a card by id, resolving the tab that owns it. Keeps the
    /// previous selection tab when no tab owns the id.
    pub fn select_card(&mut self, id: &str) {
        let tab = self
            .state
            .tabs
            .owner_of(id)
            .or(self.state.selected_card_tab);
        self.set_selected_card(tab, Some(id.to_string()));
    }

    pub fn toggle_selected_notes(&mut self) -> bool {
        let Some(id) = self.state.selected_card_id.clone() else {
            return false;
        };
        let entry = self.state.card_ui.entry(id).or_default();
        entry.editing_notes = Some(!entry.editing_notes.unwrap_or(false));
        self.publish(BoardChange::ViewChanged);
        true
    }

    // ── View state ──────────────────────────────────────────────────────

    pub fn set_active_tab(&mut self, tab: ActiveTab) {
        if self.state.active_tab != tab {
            self.state.active_tab = tab;
            self.publish(BoardChange::ViewChanged);
        }
    }

    pub fn set_filter_query(&mut self, query: &str) {
        if self.state.filter_query != query {
            self.state.filter_query = query.to_string();
            self.publish(BoardChange::ViewChanged);
        }
    }

    pub fn request_search_focus(&mut self, token: i64) {
        self.state.ui.search_focus_request = Some(token);
        self.publish(BoardChange::ViewChanged);
    }

    pub fn toggle_quick_guide(&mut self) {
        self.state.ui.show_quick_guide = !self.state.ui.show_quick_guide;
        self.publish(BoardChange::ViewChanged);
    }

    pub fn toggle_global_details(&mut self) {
        self.state.ui.show_details = !self.state.ui.show_details;
        self.publish(BoardChange::ViewChanged);
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        if self.state.ui.is_dragging != dragging {
            self.state.ui.is_dragging = dragging;
            self.publish(BoardChange::ViewChanged);
        }
    }

    /// Set or clear (`None`) the per-card details override.
    pub fn set_card_details_override(&mut self, id: &str, details: Option<bool>) -> bool {
        if self.state.tabs.owner_of(id).is_none() {
            return false;
        }
        let entry = self.state.card_ui.entry(id.to_string()).or_default();
        entry.details = details;
        if *entry == CardUi::default() {
            self.state.card_ui.remove(id);
        }
        self.publish(BoardChange::ViewChanged);
        true
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
