//! Action classification
//!
//! Pure decision functions for both directions. Each returns a
//! `ReconciliationAction` that the driver executes or simulates right away.

use crate::reconcile::drift::DriftDetector;
use crate::reconcile::matcher::MatchResult;
use crate::workflow::storage::default_path;
use crate::workflow::{FileFormat, LocalFileEntry, LocalIndex, WorkflowRecord};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Update,
    NoChange,
    Convert,
    Activate,
    Deactivate,
    Delete,
    Skip,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::NoChange => "no change",
            Self::Convert => "convert",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Delete => "delete",
            Self::Skip => "skip",
        };
        f.write_str(label)
    }
}

/// Push writes to the server, pull writes to the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Push,
    Pull,
}

/// A single decision about one workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationAction {
    pub kind: ActionKind,
    pub direction: Direction,
    pub name: String,
    /// Remote id the action applies to; `None` for a push Create until it runs
    pub id: Option<String>,
    /// Local file read (push) or written (pull)
    pub path: Option<PathBuf>,
    /// File removed when a pull relocates a workflow
    pub previous_path: Option<PathBuf>,
    /// Why a workflow was skipped
    pub reason: Option<String>,
}

impl ReconciliationAction {
    fn new(kind: ActionKind, direction: Direction, name: &str, id: Option<&str>) -> Self {
        Self {
            kind,
            direction,
            name: name.to_string(),
            id: id.map(str::to_string),
            path: None,
            previous_path: None,
            reason: None,
        }
    }

    fn at(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    fn moved_from(mut self, previous: Option<PathBuf>) -> Self {
        self.previous_path = previous;
        self
    }

    fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether executing this action calls a mutating server operation
    pub fn is_remote_mutation(&self) -> bool {
        match self.kind {
            ActionKind::Create | ActionKind::Update => self.direction == Direction::Push,
            ActionKind::Activate | ActionKind::Deactivate | ActionKind::Delete => true,
            ActionKind::NoChange | ActionKind::Convert | ActionKind::Skip => false,
        }
    }

    /// One human-readable line; `simulated` selects the dry-run wording
    pub fn describe(&self, simulated: bool) -> String {
        let name = &self.name;
        let id = self
            .id
            .as_deref()
            .map(|id| format!(" (ID: {})", id))
            .unwrap_or_default();
        let path = self
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let previous = self
            .previous_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let file = self
            .path
            .as_deref()
            .map(|p| format!(" for file {}", p.display()))
            .unwrap_or_default();
        let would = |done: &str, pending: &str| -> String {
            if simulated {
                format!("Would {}", pending)
            } else {
                capitalize(done)
            }
        };

        match (self.kind, self.direction) {
            (ActionKind::Create, Direction::Push) => format!(
                "{} workflow '{}'{} from file {}",
                would("created", "create"),
                name,
                id,
                path
            ),
            (ActionKind::Update, Direction::Push) => format!(
                "{} workflow '{}'{} from file {}",
                would("updated", "update"),
                name,
                id,
                path
            ),
            (ActionKind::Create, Direction::Pull) => format!(
                "{} file {} for workflow '{}'{}",
                would("created", "create"),
                path,
                name,
                id
            ),
            (ActionKind::Update, Direction::Pull) => match &self.previous_path {
                Some(_) => format!(
                    "{} file {} as {} for workflow '{}'{}",
                    would("replaced", "replace"),
                    previous,
                    path,
                    name,
                    id
                ),
                None => format!(
                    "{} file {} for workflow '{}'{}",
                    would("updated", "update"),
                    path,
                    name,
                    id
                ),
            },
            (ActionKind::Convert, _) => format!(
                "{} {} to {} for workflow '{}'{}",
                would("converted", "convert"),
                previous,
                path,
                name,
                id
            ),
            (ActionKind::NoChange, _) => {
                format!("No changes for workflow '{}'{} in {}", name, id, path)
            }
            (ActionKind::Activate, _) => format!(
                "{} workflow '{}'{}{}",
                would("activated", "activate"),
                name,
                id,
                file
            ),
            (ActionKind::Deactivate, _) => format!(
                "{} workflow '{}'{}{}",
                would("deactivated", "deactivate"),
                name,
                id,
                file
            ),
            (ActionKind::Delete, _) => format!(
                "{} workflow '{}'{} (not present in local directory)",
                would("deleted", "delete"),
                name,
                id
            ),
            (ActionKind::Skip, _) => {
                let reason = self.reason.as_deref().unwrap_or("nothing to do");
                if name.is_empty() && self.path.is_some() {
                    format!("Skipped file {}{}: {}", path, id, reason)
                } else {
                    format!("Skipped workflow '{}'{}: {}", name, id, reason)
                }
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Create/update decision for one local file
pub fn classify_push(
    local: &WorkflowRecord,
    matched: &MatchResult,
    path: &Path,
    minimal: bool,
) -> ReconciliationAction {
    match matched {
        MatchResult::Unmatched => {
            ReconciliationAction::new(ActionKind::Create, Direction::Push, &local.name, None).at(path)
        }
        MatchResult::ById(remote) => {
            let kind = if DriftDetector::content(minimal).has_drift(local, Some(remote)) {
                ActionKind::Update
            } else {
                ActionKind::NoChange
            };
            ReconciliationAction::new(kind, Direction::Push, &local.name, remote.id()).at(path)
        }
        MatchResult::ByName(remote) => {
            ReconciliationAction::new(ActionKind::Update, Direction::Push, &local.name, remote.id())
                .at(path)
        }
    }
}

/// Activation decision, evaluated after the create/update step
///
/// `desired` is the local `active` flag (forced to `true` by `--activate-all`),
/// `current` the server state. An unset `desired` never flips anything.
/// `id` is `None` only for a workflow a dry run would create. `path` is the
/// local file the flag was read from.
pub fn classify_activation(
    name: &str,
    id: Option<&str>,
    path: Option<&Path>,
    desired: Option<bool>,
    current: bool,
) -> Option<ReconciliationAction> {
    let kind = match (desired, current) {
        (Some(true), false) => ActionKind::Activate,
        (Some(false), true) => ActionKind::Deactivate,
        _ => return None,
    };
    let mut action = ReconciliationAction::new(kind, Direction::Push, name, id);
    action.path = path.map(Path::to_path_buf);
    Some(action)
}

/// Delete every remote workflow whose id is not in `keep`
pub fn classify_prune(remote_list: &[WorkflowRecord], keep: &HashSet<String>) -> Vec<ReconciliationAction> {
    remote_list
        .iter()
        .filter_map(|remote| {
            let id = remote.id()?;
            (!keep.contains(id)).then(|| {
                ReconciliationAction::new(ActionKind::Delete, Direction::Push, &remote.name, Some(id))
            })
        })
        .collect()
}

/// A file whose id the index assigned to another file is left alone
///
/// `name` is the workflow name decoded from the file, empty when it could not
/// be read.
pub fn classify_shadowed(
    entry: &LocalFileEntry,
    name: &str,
    owner: &LocalFileEntry,
) -> ReconciliationAction {
    ReconciliationAction::new(ActionKind::Skip, Direction::Push, name, entry.id.as_deref())
        .at(&entry.path)
        .because(format!(
            "ID is already tracked by {}",
            owner.relative_path.display()
        ))
}

/// Pull-direction settings the classifier needs
#[derive(Debug, Clone, Copy)]
pub struct PullPolicy<'a> {
    pub root: &'a Path,
    /// Explicitly requested output format
    pub output: Option<FileFormat>,
    pub overwrite: bool,
    /// Materialise remote workflows no local file tracks
    pub all: bool,
}

/// File decision for one remote workflow
///
/// `drifted` is only consulted when `tracked` is set: whether that file differs
/// from `remote`.
pub fn classify_pull(
    remote: &WorkflowRecord,
    tracked: Option<&LocalFileEntry>,
    drifted: bool,
    policy: &PullPolicy<'_>,
) -> ReconciliationAction {
    let Some(id) = remote.id() else {
        return ReconciliationAction::new(ActionKind::Skip, Direction::Pull, &remote.name, None)
            .because("remote workflow has no ID");
    };
    if remote.name.trim().is_empty() {
        return ReconciliationAction::new(ActionKind::Skip, Direction::Pull, &remote.name, Some(id))
            .because("remote workflow has no name");
    }

    let Some(entry) = tracked else {
        if !policy.all {
            return ReconciliationAction::new(ActionKind::Skip, Direction::Pull, &remote.name, Some(id))
                .because("not tracked by any local file");
        }
        let format = policy.output.unwrap_or(FileFormat::Json);
        let target = default_path(policy.root, remote, format);
        if target.exists() && !policy.overwrite {
            return ReconciliationAction::new(ActionKind::Skip, Direction::Pull, &remote.name, Some(id))
                .at(&target)
                .because(format!(
                    "file {} already exists (use --overwrite to replace it)",
                    target.display()
                ));
        }
        return ReconciliationAction::new(ActionKind::Create, Direction::Pull, &remote.name, Some(id))
            .at(target);
    };

    let owning_dir = entry.path.parent().unwrap_or(policy.root);

    if policy.overwrite {
        let format = policy.output.unwrap_or(entry.format);
        let target = default_path(owning_dir, remote, format);
        let previous = (target != entry.path).then(|| entry.path.clone());
        return ReconciliationAction::new(ActionKind::Update, Direction::Pull, &remote.name, Some(id))
            .at(target)
            .moved_from(previous);
    }

    if let Some(format) = policy.output.filter(|&format| format != entry.format) {
        let target = default_path(owning_dir, remote, format);
        return ReconciliationAction::new(ActionKind::Convert, Direction::Pull, &remote.name, Some(id))
            .at(target)
            .moved_from(Some(entry.path.clone()));
    }

    let kind = if drifted {
        ActionKind::Update
    } else {
        ActionKind::NoChange
    };
    ReconciliationAction::new(kind, Direction::Pull, &remote.name, Some(id)).at(&entry.path)
}

/// Turn a pull write into a Skip when its target belongs to someone else
///
/// A target is taken when it was already written in this run (`written`), or
/// when the index has it as the file of a different workflow id.
pub fn guard_pull_target(
    action: ReconciliationAction,
    index: &LocalIndex,
    written: &HashSet<PathBuf>,
) -> ReconciliationAction {
    if !matches!(
        action.kind,
        ActionKind::Create | ActionKind::Update | ActionKind::Convert
    ) {
        return action;
    }
    let Some(target) = action.path.as_deref() else { return action };

    let reason = if written.contains(target) {
        format!("file {} was already written in this run", target.display())
    } else {
        match index.owner_of(target).and_then(|owner| owner.id.as_deref()) {
            Some(owner) if Some(owner) != action.id.as_deref() => {
                format!("file {} is tracked by workflow ID {}", target.display(), owner)
            }
            _ => return action,
        }
    };
    ReconciliationAction {
        kind: ActionKind::Skip,
        previous_path: None,
        reason: Some(reason),
        ..action
    }
}
