//! Core workflow type definitions
//!
//! Mirrors the workflow shape exposed by the n8n public API. The same types are
//! decoded from local JSON/YAML files and from API responses.

use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A complete workflow definition as stored on the server or on disk
///
/// `id` is assigned by the server exactly once; local files may still carry an id
/// that no longer exists remotely. `created_at`/`updated_at` are server-assigned
/// and never take part in comparisons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Map<String, Value>,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single node of the workflow graph
///
/// Only the fields the sync logic reads are typed; everything else the editor
/// stores on a node (notes, webhookId, retry settings, ...) is kept verbatim in
/// `extra` so a round trip through this type is lossless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_version: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub position: Vec<serde_json::Number>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Workflow tag (id + name pair)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub name: String,
}

impl WorkflowRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Server id, treating an empty string the same as an absent one
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }

    /// Body accepted by the create and update endpoints
    ///
    /// The server rejects read-only fields (`id`, `active`, `tags`, timestamps),
    /// so only the authored content is sent.
    pub fn to_payload(&self) -> SyncResult<Value> {
        let nodes = serde_json::to_value(&self.nodes)
            .map_err(|e| SyncError::decode(format!("nodes of workflow '{}'", self.name), e))?;

        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(self.name.clone()));
        body.insert("nodes".to_string(), nodes);
        body.insert(
            "connections".to_string(),
            Value::Object(self.connections.clone()),
        );
        body.insert("settings".to_string(), Value::Object(self.settings.clone()));
        if let Some(static_data) = &self.static_data {
            body.insert("staticData".to_string(), static_data.clone());
        }
        Ok(Value::Object(body))
    }
}

/// Identifier shape used by `WorkflowRecord::id` and `Tag::id`
///
/// n8n serves ids as strings, but hand-written YAML often leaves them unquoted.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        let id = match raw {
            RawId::Text(text) => text,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        };
        (!id.is_empty()).then_some(id)
    }))
}
