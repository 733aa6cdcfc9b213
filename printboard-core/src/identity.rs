/// Card identity and timestamp helpers.
///
/// Card ids are 8 lowercase hex chars. They combine an atomic counter for
/// intra-process uniqueness with a nanosecond timestamp, hashed via SHA-256
/// for uniform distribution.
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

static CARD_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new card id (8 hex chars).
pub fn generate_card_id() -> String {
    let seq = CARD_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();
    hex::encode(&hash[..4])
}

/// Generate a card id that `taken` does not already know.
pub fn generate_unique_card_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = generate_card_id();
        if !taken(&id) {
            return id;
        }
        log::debug!("[printboard.identity] Card id collision on {}, regenerating", id);
    }
}

/// Current time as RFC 3339 UTC with millisecond precision (`2024-05-01T12:00:00.000Z`).
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
