//! Canonical form of a workflow record
//!
//! The same normalized value is written to disk and compared for drift, so a
//! file produced by `refresh` compares equal to the record it came from.

use crate::error::{SyncError, SyncResult};
use crate::workflow::types::WorkflowRecord;
use serde_json::{Map, Value};

/// Fields the server owns and that never count as content
pub const SERVER_TIMESTAMPS: [&str; 2] = ["createdAt", "updatedAt"];

/// Normalize a record into its canonical JSON value
///
/// Timestamps are always removed. With `minimal`, null, empty-string and
/// empty-container entries are stripped recursively as well.
pub fn normalize(record: &WorkflowRecord, minimal: bool) -> SyncResult<Value> {
    let value = serde_json::to_value(record)
        .map_err(|e| SyncError::decode(format!("workflow '{}'", record.name), e))?;
    Ok(normalize_value(value, minimal))
}

/// Value-level normalization; idempotent for any input
pub fn normalize_value(mut value: Value, minimal: bool) -> Value {
    if let Value::Object(map) = &mut value {
        for key in SERVER_TIMESTAMPS {
            map.remove(key);
        }
        if minimal {
            strip_empty_entries(map);
        }
    }
    value
}

/// Remove null/empty entries from a map, recursing into nested containers
///
/// Array elements are cleaned but never removed: connection outputs are
/// positional, so dropping an empty slot would rewire the graph.
fn strip_empty_entries(map: &mut Map<String, Value>) {
    map.retain(|_, value| {
        clean_nested(value);
        !is_empty_value(value)
    });
}

fn clean_nested(value: &mut Value) {
    match value {
        Value::Object(map) => strip_empty_entries(map),
        Value::Array(items) => items.iter_mut().for_each(clean_nested),
        _ => {}
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> WorkflowRecord {
        serde_json::from_value(json!({
            "id": "1",
            "name": "Sample",
            "active": false,
            "nodes": [{
                "name": "Set",
                "type": "n8n-nodes-base.set",
                "parameters": {"values": {"string": []}, "keep": "", "flag": false},
                "notes": null
            }],
            "connections": {"Set": {"main": [[], [{"node": "Next", "type": "main", "index": 0}]]}},
            "settings": {},
            "staticData": null,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn timestamps_are_removed_even_when_not_minimal() {
        let value = normalize(&sample(), false).unwrap();
        assert!(value.get("createdAt").is_none());
        assert!(value.get("updatedAt").is_none());
        assert_eq!(value["settings"], json!({}));
    }

    #[test]
    fn minimal_strips_nulls_and_empty_containers() {
        let value = normalize(&sample(), true).unwrap();
        assert!(value.get("settings").is_none());
        assert!(value.get("staticData").is_none());

        let node = &value["nodes"][0];
        assert!(node.get("notes").is_none());
        assert_eq!(node["parameters"], json!({"flag": false}));
        assert_eq!(value["active"], json!(false));
    }

    #[test]
    fn minimal_keeps_positional_array_slots() {
        let value = normalize(&sample(), true).unwrap();
        let outputs = value["connections"]["Set"]["main"].as_array().unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0], json!([]));
    }

    #[test]
    fn normalization_is_a_fixpoint() {
        let once = normalize(&sample(), true).unwrap();
        let twice = normalize_value(once.clone(), true);
        assert_eq!(once, twice);

        let record: WorkflowRecord = serde_json::from_value(once.clone()).unwrap();
        assert_eq!(normalize(&record, true).unwrap(), once);
    }
}
