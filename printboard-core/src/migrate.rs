/// Schema-version gated migrations over raw snapshot JSON.
///
/// Each step upgrades from exactly one version to the next. Steps are
/// applied in order until `CURRENT_SCHEMA_VERSION` is reached. Entries are
/// never removed while stored data may still carry their `from` version.
use serde_json::{Map, Value};

use crate::types::CURRENT_SCHEMA_VERSION;

struct Migration {
    from: u32,
    description: &'static str,
    apply: fn(&mut Map<String, Value>),
}

/// Version 0 stands for "no schemaVersion field at all".
const MIGRATIONS: &[Migration] = &[Migration {
    from: 0,
    description: "stamp unversioned snapshot as version 1",
    apply: stamp_version_one,
}];

fn stamp_version_one(_root: &mut Map<String, Value>) {
    // Version 1 is the baseline shape; only the stamp is missing.
}

/// Version recorded in a snapshot, 0 when absent or not a positive integer.
pub fn schema_version_of(value: &Value) -> u32 {
    value
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Bring a snapshot up to the current schema version. Non-object values and
/// snapshots from newer versions pass through untouched. Idempotent.
pub fn migrate_value(mut value: Value) -> Value {
    let mut version = schema_version_of(&value);
    if version > CURRENT_SCHEMA_VERSION {
        log::warn!(
            "[printboard.migrate] Snapshot version {} is newer than {}, loading as-is",
            version,
            CURRENT_SCHEMA_VERSION
        );
        return value;
    }

    if let Some(root) = value.as_object_mut() {
        while version < CURRENT_SCHEMA_VERSION {
            let Some(step) = MIGRATIONS.iter().find(|m| m.from == version) else {
                log::error!(
                    "[printboard.migrate] No migration registered from version {}",
                    version
                );
                break;
            };
            log::info!(
                "[printboard.migrate] v{} -> v{}: {}",
                step.from,
                step.from + 1,
                step.description
            );
            (step.apply)(root);
            version = step.from + 1;
            root.insert("schemaVersion".to_string(), Value::from(version));
        }
    }
    value
}
