/// Import validation.
///
/// A document is checked completely before anything is touched, so a
/// rejected import leaves the board exactly as it was. Accepted documents
/// replace the whole state in one engine operation.
use serde_json::Value;

use super::ExportDocument;
use crate::engine::BoardEngine;
use crate::migrate::migrate_value;
use crate::priority::{parse_priority_from_title, MAX_PRIORITY};
use crate::types::{AppState, TabId};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid JSON")]
    NotAnObject,

    #[error("Missing tabs")]
    MissingTabs,

    #[error("Missing tab: {0}")]
    MissingTab(TabId),

    #[error("Unexpected tab: {0}")]
    UnexpectedTab(String),

    #[error("Invalid tab structure: {0}")]
    InvalidTabStructure(TabId),

    #[error("Invalid board data: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("Inconsistent board: {0}")]
    Inconsistent(String),
}

/// Impact of an import, shown before the user confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub tab_count: usize,
    pub card_count: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!(
            "Import will replace current boards. Tabs: {}, Cards: {}. Continue?",
            self.tab_count, self.card_count
        )
    }
}

/// A validated document waiting for confirmation.
#[derive(Debug, Clone)]
pub struct ImportPreview {
    pub summary: ImportSummary,
    state: AppState,
}

impl ImportPreview {
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Replace the board with the validated document.
    pub fn apply(self, engine: &mut BoardEngine) {
        log::info!(
            "[printboard.import] Replacing board: {} tabs, {} cards",
            self.summary.tab_count,
            self.summary.card_count
        );
        engine.replace_state(self.state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Applied(ImportSummary),
    Declined(ImportSummary),
}

/// Validate raw text without touching any state.
pub fn prepare_import(text: &str) -> Result<ImportPreview, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(ImportError::Parse)?;
    validate_value(value)
}

/// Validate an already parsed document.
pub fn validate_value(value: Value) -> Result<ImportPreview, ImportError> {
    let root = value.as_object().ok_or(ImportError::NotAnObject)?;
    let tabs = root
        .get("tabs")
        .and_then(Value::as_object)
        .ok_or(ImportError::MissingTabs)?;

    for tab in TabId::ALL {
        let board = tabs
            .get(tab.as_str())
            .filter(|v| !v.is_null())
            .ok_or(ImportError::MissingTab(tab))?;
        let has = |field: &str| board.get(field).is_some_and(|v| !v.is_null());
        if !has("columns") || !has("cards") {
            return Err(ImportError::InvalidTabStructure(tab));
        }
    }
    if let Some(extra) = tabs.keys().find(|k| TabId::parse(k).is_none()) {
        return Err(ImportError::UnexpectedTab(extra.clone()));
    }
    let tab_count = tabs.len();

    let mut doc: ExportDocument =
        serde_json::from_value(migrate_value(value)).map_err(ImportError::Shape)?;
    for tab in TabId::ALL {
        let board = doc.tabs.get(tab);
        if board.id != tab {
            return Err(ImportError::Inconsistent(format!(
                "tab stored under {} claims id {}",
                tab, board.id
            )));
        }
        if let Some((key, card)) = board.cards.iter().find(|(key, card)| **key != card.id) {
            return Err(ImportError::Inconsistent(format!(
                "tab {}: card stored under {} claims id {}",
                tab, key, card.id
            )));
        }
    }

    normalize_priorities(&mut doc);

    let state = doc.into_state();
    state
        .check_consistency()
        .map_err(ImportError::Inconsistent)?;

    let summary = ImportSummary {
        tab_count,
        card_count: state.tabs.total_cards(),
    };
    Ok(ImportPreview { summary, state })
}

/// Stored priorities are not trusted: titled cards take the priority their
/// title implies, untitled cards are clamped to the valid range.
fn normalize_priorities(doc: &mut ExportDocument) {
    for tab in TabId::ALL {
        for card in doc.tabs.get_mut(tab).cards.values_mut() {
            let priority = if card.title.trim().is_empty() {
                card.priority.min(MAX_PRIORITY)
            } else {
                parse_priority_from_title(&card.title)
            };
            if priority != card.priority {
                log::debug!(
                    "[printboard.import] card {}: priority {} replaced by {}",
                    card.id,
                    card.priority,
                    priority
                );
                card.priority = priority;
            }
        }
    }
}

/// Validate, ask for confirmation, then apply. A declined or invalid
/// import leaves the engine untouched.
pub fn import_json(
    engine: &mut BoardEngine,
    text: &str,
    confirm: impl FnOnce(&ImportSummary) -> bool,
) -> Result<ImportOutcome, ImportError> {
    let preview = match prepare_import(text) {
        Ok(preview) => preview,
        Err(e) => {
            log::warn!("[printboard.import] Import failed: {}", e);
            return Err(e);
        }
    };
    let summary = preview.summary;
    if !confirm(&summary) {
        log::info!("[printboard.import] Import declined");
        return Ok(ImportOutcome::Declined(summary));
    }
    preview.apply(engine);
    Ok(ImportOutcome::Applied(summary))
}
