/// Free-text card filter backing the board's search box.
///
/// Matching is a case-insensitive substring test over the card's text
/// fields. `whoFor` only counts inside the `others` tab, where it is shown.
use serde::{Deserialize, Serialize};

use crate::types::{AppState, Card, ColumnId, TabId};

/// A card matched by `search_cards`, with enough location data to select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHit {
    pub tab: TabId,
    pub column: ColumnId,
    pub index: usize,
    pub card_id: String,
    pub title: String,
    pub priority: u8,
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

fn matches_normalized(tab: TabId, card: &Card, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let who_for = if tab == TabId::Others {
        card.who_for.as_deref().unwrap_or("")
    } else {
        ""
    };
    let haystack = format!(
        "{} {} {} {}",
        card.title,
        card.materials.as_deref().unwrap_or(""),
        card.notes.as_deref().unwrap_or(""),
        who_for
    )
    .to_lowercase();

    haystack.contains(needle)
        || [&card.est_print_time, &card.deadline]
            .into_iter()
            .any(|field| {
                field
                    .as_deref()
                    .map(|v| v.to_lowercase().contains(needle))
                    .unwrap_or(false)
            })
}

/// Whether `card` (living in `tab`) matches the filter `query`.
pub fn card_matches(tab: TabId, card: &Card, query: &str) -> bool {
    matches_normalized(tab, card, &normalize_query(query))
}

/// Ids of one column that pass the state's current filter, in display order.
pub fn visible_cards(state: &AppState, tab: TabId, column: ColumnId) -> Vec<String> {
    let needle = normalize_query(&state.filter_query);
    let board = state.tabs.get(tab);
    board
        .columns
        .get(column)
        .card_order
        .iter()
        .filter(|id| {
            board
                .cards
                .get(id.as_str())
                .map(|card| matches_normalized(tab, card, &needle))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Search every tab and column. An empty query returns nothing.
pub fn search_cards(state: &AppState, query: &str) -> Vec<CardHit> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for board in state.tabs.iter() {
        for column in board.columns.iter() {
            for (index, id) in column.card_order.iter().enumerate() {
                let Some(card) = board.cards.get(id) else {
                    continue;
                };
                if matches_normalized(board.id, card, &needle) {
                    hits.push(CardHit {
                        tab: board.id,
                        column: column.id,
                        index,
                        card_id: card.id.clone(),
                        title: card.title.clone(),
                        priority: card.priority,
                    });
                }
            }
        }
    }
    hits
}
