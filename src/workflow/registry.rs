//! Local workflow index
//!
//! Scans a workflow directory for JSON/YAML files and maps each embedded workflow
//! id to the file that holds it. Built fresh on every run and discarded after it.

use crate::error::{SyncError, SyncResult};
use crate::workflow::storage::{peek_id, FileFormat};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One candidate workflow file found during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileEntry {
    /// Path relative to the scanned root
    pub relative_path: PathBuf,
    /// Full path (root joined with `relative_path`)
    pub path: PathBuf,
    pub format: FileFormat,
    /// Embedded workflow id, if the file has one and it could be read
    pub id: Option<String>,
}

/// id -> file mapping used to match local files with remote workflows
#[derive(Debug, Default)]
pub struct LocalIndex {
    entries: Vec<LocalFileEntry>,
    by_id: HashMap<String, usize>,
}

impl LocalIndex {
    /// Scan `root` (only its direct entries unless `recursive`) and index every id
    ///
    /// A file whose id cannot be read is still listed in `entries()` but is left
    /// out of the id map. Failing to list `root` itself is fatal.
    pub fn build(root: &Path, recursive: bool) -> SyncResult<Self> {
        let entries = scan(root, recursive)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<LocalFileEntry>) -> Self {
        let mut by_id: HashMap<String, usize> = HashMap::new();

        for (position, entry) in entries.iter().enumerate() {
            let Some(id) = entry.id.as_ref() else { continue };
            let keep = match by_id.get(id).copied() {
                None => position,
                Some(existing) => {
                    let keep = if prefers(entry, &entries[existing]) { position } else { existing };
                    tracing::warn!(
                        "Workflow ID {} is held by both {} and {}; using {}",
                        id,
                        entries[existing].relative_path.display(),
                        entry.relative_path.display(),
                        entries[keep].relative_path.display()
                    );
                    keep
                }
            };
            by_id.insert(id.clone(), keep);
        }

        tracing::debug!(
            "Indexed {} workflow files ({} with IDs)",
            entries.len(),
            by_id.len()
        );

        Self { entries, by_id }
    }

    /// All candidate files in scan order
    pub fn entries(&self) -> &[LocalFileEntry] {
        &self.entries
    }

    /// File currently tracking the workflow `id`
    pub fn get(&self, id: &str) -> Option<&LocalFileEntry> {
        self.by_id.get(id).map(|&position| &self.entries[position])
    }

    /// Id-carrying file at `path`, shadowed copies included
    pub fn owner_of(&self, path: &Path) -> Option<&LocalFileEntry> {
        self.entries
            .iter()
            .find(|entry| entry.id.is_some() && entry.path == path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// The id -> path mapping
    pub fn paths(&self) -> HashMap<&str, &Path> {
        self.by_id
            .iter()
            .map(|(id, &position)| (id.as_str(), self.entries[position].path.as_path()))
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// YAML wins over JSON when two files hold the same id; otherwise the first file
/// in scan order is kept.
fn prefers(candidate: &LocalFileEntry, current: &LocalFileEntry) -> bool {
    candidate.format == FileFormat::Yaml && current.format == FileFormat::Json
}

/// List the candidate workflow files under `root`, sorted by relative path
pub fn scan(root: &Path, recursive: bool) -> SyncResult<Vec<LocalFileEntry>> {
    if let Err(e) = std::fs::read_dir(root) {
        return Err(SyncError::directory("read", root, e));
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut entries = Vec::new();
    for item in walker {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };
        if !item.file_type().is_file() {
            continue;
        }
        let path = item.into_path();
        let Some(format) = FileFormat::from_path(&path) else { continue };

        let id = match peek_id(&path) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("No readable workflow ID in {}: {}", path.display(), e);
                None
            }
        };
        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        entries.push(LocalFileEntry {
            relative_path,
            path,
            format,
            id,
        });
    }

    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn indexes_supported_extensions_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"id":"1","name":"A"}"#);
        write(dir.path(), "b.YML", "id: '2'\nname: B\n");
        write(dir.path(), "c.txt", r#"{"id":"3","name":"C"}"#);
        write(dir.path(), "d.json", r#"{"name":"D"}"#);

        let index = LocalIndex::build(dir.path(), false).unwrap();
        assert_eq!(index.entries().len(), 3);
        assert_eq!(index.len(), 2);
        assert!(index.contains("1"));
        assert!(index.contains("2"));
        assert!(!index.contains("3"));
        assert_eq!(index.get("1").unwrap().relative_path, PathBuf::from("a.json"));
    }

    #[test]
    fn recursion_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.json", r#"{"id":"1","name":"Top"}"#);
        write(dir.path(), "team/nested.json", r#"{"id":"2","name":"Nested"}"#);

        let flat = LocalIndex::build(dir.path(), false).unwrap();
        assert!(!flat.contains("2"));

        let deep = LocalIndex::build(dir.path(), true).unwrap();
        assert_eq!(
            deep.get("2").unwrap().relative_path,
            PathBuf::from("team/nested.json")
        );
    }

    #[test]
    fn undecodable_files_are_listed_without_id() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.json", "{ not json");
        write(dir.path(), "ok.json", r#"{"id":"5","name":"Ok"}"#);

        let index = LocalIndex::build(dir.path(), false).unwrap();
        assert_eq!(index.entries().len(), 2);
        assert_eq!(index.entries()[0].id, None);
        assert_eq!(index.ids().collect::<Vec<_>>(), vec!["5"]);
    }

    #[test]
    fn yaml_wins_id_collisions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "json/flow.json", r#"{"id":"8","name":"Flow"}"#);
        write(dir.path(), "a-yaml/flow.yaml", "id: '8'\nname: Flow\n");
        write(dir.path(), "z-yaml/other.yaml", "id: '8'\nname: Flow\n");

        let index = LocalIndex::build(dir.path(), true).unwrap();
        assert_eq!(
            index.get("8").unwrap().relative_path,
            PathBuf::from("a-yaml/flow.yaml")
        );
    }

    #[test]
    fn owner_of_finds_files_with_ids() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"id":"1","name":"A"}"#);
        write(dir.path(), "b.json", r#"{"name":"B"}"#);

        let index = LocalIndex::build(dir.path(), false).unwrap();
        let owner = index.owner_of(&dir.path().join("a.json")).unwrap();
        assert_eq!(owner.id.as_deref(), Some("1"));
        assert!(index.owner_of(&dir.path().join("b.json")).is_none());
        assert!(index.owner_of(&dir.path().join("c.json")).is_none());
    }

    #[test]
    fn missing_root_is_a_directory_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalIndex::build(&dir.path().join("absent"), false).unwrap_err();
        assert!(err.is_fatal());
    }
}
