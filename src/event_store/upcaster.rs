//! Schema upcaster
//!
//! Normalizes a stored `(event_type, schema_version, payload)` triple to the
//! latest in-memory shape on read. Runs in-memory only; stored rows are
//! never rewritten.

use serde_json::Value;

/// Returns the latest schema version a given stored event is upcast to,
/// along with the normalized payload.
pub fn upcast(event_type: &str, schema_version: i32, payload: &Value) -> (i32, Value) {
    match (event_type, schema_version) {
        ("UsageRecorded", 1) => {
            let mut normalized = payload.clone();
            if let Some(obj) = normalized.as_object_mut() {
                obj.entry("source").or_insert_with(|| Value::String("unknown".to_string()));
            }
            (2, normalized)
        }
        _ => (schema_version, payload.clone()),
    }
}
