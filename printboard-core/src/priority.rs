/// Title-marker priority parsing.
///
/// A title carries its priority as a standalone `*`, `**` or `***` token at
/// the start or end of the trimmed text. Patterns are checked from three
/// stars down and the first match wins, so `"*** urgent *"` is 3 and
/// `"* mid **"` is 2.
use regex::Regex;
use std::sync::LazyLock;

static PRIORITY_PATTERNS: LazyLock<[(u8, Regex); 3]> = LazyLock::new(|| {
    [
        (3, Regex::new(r"^\*\*\*\s|\s\*\*\*$").unwrap()),
        (2, Regex::new(r"^\*\*\s|\s\*\*$").unwrap()),
        (1, Regex::new(r"^\*\s|\s\*$").unwrap()),
    ]
});

/// Highest priority value a card can carry.
pub const MAX_PRIORITY: u8 = 3;

/// Derive a priority (0..=3) from a card title.
pub fn parse_priority_from_title(title: &str) -> u8 {
    let trimmed = title.trim();
    PRIORITY_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(trimmed))
        .map(|(level, _)| *level)
        .unwrap_or(0)
}
