//! Drift detection between two workflow records
//!
//! Both sides are normalized with the same policy, serialized to canonical JSON
//! (keys sorted) and compared byte for byte. Any failure along the way counts as
//! drift, so a parse problem can never hide a required update.

use crate::workflow::normalize::normalize;
use crate::workflow::{storage, WorkflowRecord};
use serde_json::Value;
use std::path::Path;

/// Which fields take part in the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftScope {
    /// Authored content only: everything except id, active flag and tags.
    /// Used when pushing, where activation is a separate step.
    Content,
    /// The whole on-disk document minus server timestamps. Used when pulling.
    Document,
}

const NON_CONTENT_FIELDS: [&str; 3] = ["id", "active", "tags"];

#[derive(Debug, Clone, Copy)]
pub struct DriftDetector {
    pub scope: DriftScope,
    pub minimal: bool,
}

impl DriftDetector {
    pub fn content(minimal: bool) -> Self {
        Self {
            scope: DriftScope::Content,
            minimal,
        }
    }

    pub fn document(minimal: bool) -> Self {
        Self {
            scope: DriftScope::Document,
            minimal,
        }
    }

    /// `true` when the records differ, or when `remote` is absent
    pub fn has_drift(&self, local: &WorkflowRecord, remote: Option<&WorkflowRecord>) -> bool {
        let Some(remote) = remote else { return true };
        match (self.canonical(local), self.canonical(remote)) {
            (Some(left), Some(right)) => left != right,
            _ => true,
        }
    }

    /// Compare the workflow stored at `path` against `remote`
    ///
    /// An unreadable or undecodable file counts as drift.
    pub fn file_has_drift(&self, path: &Path, remote: &WorkflowRecord) -> bool {
        match storage::read_workflow(path) {
            Ok(existing) => self.has_drift(&existing, Some(remote)),
            Err(e) => {
                tracing::debug!("Treating {} as drifted: {}", path.display(), e);
                true
            }
        }
    }

    /// Canonical byte form of a record under this policy
    pub fn canonical(&self, record: &WorkflowRecord) -> Option<Vec<u8>> {
        let mut value = normalize(record, self.minimal).ok()?;
        if self.scope == DriftScope::Content {
            if let Value::Object(map) = &mut value {
                for field in NON_CONTENT_FIELDS {
                    map.remove(field);
                }
            }
        }
        serde_json::to_vec(&value).ok()
    }
}

/// Content drift between a local and a remote record
pub fn has_drift(local: &WorkflowRecord, remote: Option<&WorkflowRecord>, minimal: bool) -> bool {
    DriftDetector::content(minimal).has_drift(local, remote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> WorkflowRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn absent_remote_is_drift() {
        assert!(has_drift(&WorkflowRecord::new("A"), None, true));
    }

    #[test]
    fn volatile_fields_are_ignored() {
        let local = record(json!({"id": "1", "name": "A", "active": true}));
        let remote = record(json!({
            "id": "1", "name": "A", "active": false,
            "tags": [{"id": "t", "name": "x"}],
            "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-02-01T00:00:00Z"
        }));
        assert!(!has_drift(&local, Some(&remote), false));
        assert!(DriftDetector::document(false).has_drift(&local, Some(&remote)));
    }

    #[test]
    fn minimal_ignores_empty_fields() {
        let local = record(json!({"name": "A"}));
        let remote = record(json!({"name": "A", "settings": {}, "nodes": [], "staticData": null}));
        assert!(!has_drift(&local, Some(&remote), true));

        let remote = record(json!({"name": "A", "settings": {"timezone": "UTC"}}));
        assert!(has_drift(&local, Some(&remote), true));
        assert!(has_drift(&local, Some(&remote), false));
    }

    #[test]
    fn drift_is_symmetric() {
        let a = record(json!({"name": "A", "settings": {"saveManualExecutions": true}}));
        let b = record(json!({"name": "A", "settings": {"saveManualExecutions": false}}));
        let c = record(json!({"name": "A", "settings": {"saveManualExecutions": true}, "tags": []}));

        for minimal in [true, false] {
            for (x, y) in [(&a, &b), (&a, &c), (&b, &c)] {
                assert_eq!(
                    has_drift(x, Some(y), minimal),
                    has_drift(y, Some(x), minimal)
                );
            }
        }
    }

    #[test]
    fn key_order_does_not_matter() {
        let left: WorkflowRecord =
            serde_json::from_str(r#"{"name":"A","settings":{"a":1,"b":2}}"#).unwrap();
        let right: WorkflowRecord =
            serde_json::from_str(r#"{"settings":{"b":2,"a":1},"name":"A"}"#).unwrap();
        assert!(!has_drift(&left, Some(&right), false));
    }

    #[test]
    fn undecodable_file_is_drift() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        assert!(DriftDetector::document(true).file_has_drift(&path, &WorkflowRecord::new("A")));
    }
}
