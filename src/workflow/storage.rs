//! File persistence layer for workflow definitions
//!
//! Reads and writes workflow files as JSON or YAML at any directory depth.
//! JSON is written with 2-space indentation and a trailing newline, YAML with a
//! leading `---` document marker.

use crate::error::{SyncError, SyncResult};
use crate::workflow::normalize::normalize;
use crate::workflow::types::{deserialize_id, WorkflowRecord};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const YAML_DOCUMENT_MARKER: &str = "---\n";

/// On-disk format of a workflow file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// Detect the format from `.json`, `.yaml` or `.yml` (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unsupported output format: {}", other)),
        }
    }
}

/// Only the `id` field of a workflow file
#[derive(Deserialize)]
struct IdPeek {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
}

fn format_of(path: &Path) -> SyncResult<FileFormat> {
    FileFormat::from_path(path).ok_or_else(|| {
        SyncError::decode(path.display().to_string(), "unsupported file extension")
    })
}

fn read_bytes(path: &Path) -> SyncResult<Vec<u8>> {
    fs::read(path).map_err(|e| SyncError::filesystem("read", path, e))
}

fn decode<T: serde::de::DeserializeOwned>(path: &Path, content: &[u8]) -> SyncResult<T> {
    let context = || path.display().to_string();
    match format_of(path)? {
        FileFormat::Json => serde_json::from_slice(content).map_err(|e| SyncError::decode(context(), e)),
        FileFormat::Yaml => serde_yaml::from_slice(content).map_err(|e| SyncError::decode(context(), e)),
    }
}

/// Decode a full workflow record from a file
///
/// An empty `name` is rejected here so it can never reach the server.
pub fn read_workflow(path: &Path) -> SyncResult<WorkflowRecord> {
    let content = read_bytes(path)?;
    let record: WorkflowRecord = decode(path, &content)?;
    if record.name.trim().is_empty() {
        return Err(SyncError::decode(
            path.display().to_string(),
            "workflow name must not be empty",
        ));
    }
    Ok(record)
}

/// Read just the `id` of a workflow file without decoding the rest of the record
pub fn peek_id(path: &Path) -> SyncResult<Option<String>> {
    let content = read_bytes(path)?;
    let peek: IdPeek = decode(path, &content)?;
    Ok(peek.id)
}

/// Encode any serializable value in the given file format
pub fn encode<T: serde::Serialize>(value: &T, format: FileFormat, name: &str) -> SyncResult<Vec<u8>> {
    match format {
        FileFormat::Json => {
            let mut content = serde_json::to_vec_pretty(value)
                .map_err(|e| SyncError::decode(format!("workflow '{}' as JSON", name), e))?;
            content.push(b'\n');
            Ok(content)
        }
        FileFormat::Yaml => {
            let body = serde_yaml::to_string(value)
                .map_err(|e| SyncError::decode(format!("workflow '{}' as YAML", name), e))?;
            let mut content = String::with_capacity(body.len() + YAML_DOCUMENT_MARKER.len());
            content.push_str(YAML_DOCUMENT_MARKER);
            content.push_str(body.strip_prefix(YAML_DOCUMENT_MARKER).unwrap_or(&body));
            Ok(content.into_bytes())
        }
    }
}

/// Render a workflow record in its normalized on-disk form
pub fn render_workflow(record: &WorkflowRecord, format: FileFormat, minimal: bool) -> SyncResult<Vec<u8>> {
    let value = normalize(record, minimal)?;
    encode(&value, format, &record.name)
}

/// Write file content, creating parent directories as needed
pub fn write_file(path: &Path, content: &[u8]) -> SyncResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SyncError::filesystem("create directory", parent, e))?;
    }
    fs::write(path, content).map_err(|e| SyncError::filesystem("write", path, e))
}

pub fn remove_file(path: &Path) -> SyncResult<()> {
    fs::remove_file(path).map_err(|e| SyncError::filesystem("remove", path, e))
}

/// Substitute the server-assigned id into an existing workflow file
///
/// The file is decoded as a generic document so fields this crate does not model
/// survive the rewrite. Returns `false` when the file already holds `id`.
pub fn rewrite_id(path: &Path, id: &str) -> SyncResult<bool> {
    let content = read_bytes(path)?;
    let mut document: Value = decode(path, &content)?;
    let map = document.as_object_mut().ok_or_else(|| {
        SyncError::decode(path.display().to_string(), "workflow file is not a mapping")
    })?;

    if map.get("id").and_then(Value::as_str) == Some(id) {
        return Ok(false);
    }
    map.insert("id".to_string(), Value::String(id.to_string()));

    let name = map
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let encoded = encode(&document, format_of(path)?, &name)?;
    write_file(path, &encoded)?;
    Ok(true)
}

/// Characters that are unsafe in file names on at least one major platform
const DISALLOWED_FILENAME_CHARS: [char; 14] = [
    ' ', '/', '\\', ':', '*', '?', '"', '<', '>', '|', '$', '%', '^', '&',
];

/// Turn a workflow name into a file stem, replacing each disallowed character with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if DISALLOWED_FILENAME_CHARS.contains(&c) || c as u32 >= 0x1F000 {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Name-derived default location of a workflow inside `dir`
///
/// Pull never gets here with an empty name.
pub fn default_path(dir: &Path, record: &WorkflowRecord, format: FileFormat) -> PathBuf {
    dir.join(format!("{}.{}", sanitize_filename(&record.name), format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_each_disallowed_char() {
        assert_eq!(
            sanitize_filename("Complex: Name*/\\?\"<>|"),
            "Complex__Name________"
        );
        assert_eq!(sanitize_filename("Cost $5 & 10%^"), "Cost__5___10__");
        assert_eq!(sanitize_filename("Rocket 🚀"), "Rocket__");
        assert_eq!(sanitize_filename("plain-name_1"), "plain-name_1");
    }

    #[test]
    fn default_path_uses_sanitized_name() {
        let record = WorkflowRecord::new("Nightly: Report");
        assert_eq!(
            default_path(Path::new("wf"), &record, FileFormat::Yaml),
            PathBuf::from("wf/Nightly__Report.yaml")
        );
    }

    #[test]
    fn json_files_are_pretty_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greet.json");
        let content = render_workflow(&WorkflowRecord::new("Greet"), FileFormat::Json, true).unwrap();
        write_file(&path, &content).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"name\": \"Greet\"\n}\n");
        assert_eq!(read_workflow(&path).unwrap().name, "Greet");
    }

    #[test]
    fn yaml_files_start_with_document_marker() {
        let mut record = WorkflowRecord::new("Greet");
        record.id = Some("3".into());
        let content = render_workflow(&record, FileFormat::Yaml, true).unwrap();
        let text = String::from_utf8(content).unwrap();
        assert!(text.starts_with("---\nid: '3'\nname: Greet\n"), "{}", text);
    }

    #[test]
    fn peek_reads_id_and_ignores_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yml");
        fs::write(&path, "---\nid: 12\nname: A\nnodes: not-a-list\n").unwrap();
        assert_eq!(peek_id(&path).unwrap(), Some("12".to_string()));
        assert!(read_workflow(&path).is_err());
    }

    #[test]
    fn empty_name_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.json");
        fs::write(&path, r#"{"name": ""}"#).unwrap();
        assert!(matches!(read_workflow(&path), Err(SyncError::Decode { .. })));
    }

    #[test]
    fn rewrite_id_preserves_unknown_fields_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greet.json");
        fs::write(&path, r#"{"name":"Greet","meta":{"owner":"ops"}}"#).unwrap();

        assert!(rewrite_id(&path, "1").unwrap());
        let first = fs::read(&path).unwrap();
        assert!(!rewrite_id(&path, "1").unwrap());
        assert_eq!(fs::read(&path).unwrap(), first);

        let value: Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(value["id"], "1");
        assert_eq!(value["meta"]["owner"], "ops");
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("YAML".parse::<FileFormat>().unwrap(), FileFormat::Yaml);
        assert_eq!("yml".parse::<FileFormat>().unwrap(), FileFormat::Yaml);
        assert_eq!("json".parse::<FileFormat>().unwrap(), FileFormat::Json);
        assert!("toml".parse::<FileFormat>().is_err());
    }
}
