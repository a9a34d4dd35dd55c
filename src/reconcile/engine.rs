//! Reconciliation driver
//!
//! Owns one run's transient state (local index, remote list, report) and walks
//! the workflows strictly one after another. The push and pull passes live in
//! `push.rs` and `pull.rs`; this file holds what they share.

use crate::api::WorkflowClient;
use crate::error::SyncError;
use crate::reconcile::classify::{ActionKind, ReconciliationAction};
use crate::workflow::FileFormat;
use std::io::Write;
use std::path::PathBuf;

/// Flags of a push (`workflows sync`) run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub directory: PathBuf,
    pub dry_run: bool,
    /// Delete remote workflows no local file tracks
    pub prune: bool,
    pub recursive: bool,
    pub minimal: bool,
    /// Treat every local workflow as `active: true`
    pub activate_all: bool,
}

impl SyncOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            dry_run: false,
            prune: false,
            recursive: false,
            minimal: true,
            activate_all: false,
        }
    }
}

/// Flags of a pull (`workflows refresh`) run
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub directory: PathBuf,
    pub dry_run: bool,
    /// Rewrite tracked files at their name-derived path, and replace existing
    /// untracked files on create
    pub overwrite: bool,
    pub recursive: bool,
    pub minimal: bool,
    /// Requested output format; `None` keeps each file's current format
    pub output: Option<FileFormat>,
    /// Also write remote workflows no local file tracks yet
    pub all: bool,
    /// Pull only this workflow; an untracked one lands in the root directory
    pub workflow_id: Option<String>,
}

impl RefreshOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            dry_run: false,
            overwrite: false,
            recursive: false,
            minimal: true,
            output: None,
            all: false,
            workflow_id: None,
        }
    }
}

/// Terminal state of one classified action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Executed,
    Simulated,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub action: ReconciliationAction,
    pub disposition: Disposition,
}

/// A failure scoped to one file or workflow
#[derive(Debug)]
pub struct ItemFailure {
    /// File path or workflow name the failure belongs to
    pub item: String,
    pub error: SyncError,
}

/// Everything one run decided, did and failed to do
#[derive(Debug, Default)]
pub struct RunReport {
    pub actions: Vec<ActionRecord>,
    pub failures: Vec<ItemFailure>,
    /// Lines printed during the run, in order
    pub lines: Vec<String>,
}

impl RunReport {
    /// Number of executed or simulated actions of `kind`
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions
            .iter()
            .filter(|record| record.action.kind == kind && record.disposition != Disposition::Skipped)
            .count()
    }

    /// Number of actions of `kind` regardless of disposition
    pub fn classified(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|record| record.action.kind == kind).count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn actions_of(&self, kind: ActionKind) -> impl Iterator<Item = &ReconciliationAction> {
        self.actions
            .iter()
            .filter(move |record| record.action.kind == kind)
            .map(|record| &record.action)
    }
}

/// Drives push and pull runs against one `WorkflowClient`
pub struct Reconciler<C> {
    pub(crate) client: C,
    out: Box<dyn Write + Send>,
}

impl<C: WorkflowClient> Reconciler<C> {
    /// Reconciler printing its action lines to stdout
    pub fn new(client: C) -> Self {
        Self::with_output(client, Box::new(std::io::stdout()))
    }

    pub fn with_output(client: C, out: Box<dyn Write + Send>) -> Self {
        Self { client, out }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub(crate) fn say(&mut self, report: &mut RunReport, line: String) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            tracing::debug!("Failed to write output line: {}", e);
        }
        report.lines.push(line);
    }

    /// Print and store an action with its final disposition
    pub(crate) fn record(
        &mut self,
        report: &mut RunReport,
        action: ReconciliationAction,
        disposition: Disposition,
    ) {
        let line = action.describe(disposition == Disposition::Simulated);
        tracing::info!("📋 {} [{:?}] {}", action.kind, disposition, action.name);
        self.say(report, line);
        report.actions.push(ActionRecord {
            action,
            disposition,
        });
    }

    /// Print and store a per-item failure; the run goes on
    pub(crate) fn fail(&mut self, report: &mut RunReport, item: impl Into<String>, error: SyncError) {
        let item = item.into();
        tracing::warn!("⚠️ {}: {}", item, error);
        self.say(report, format!("Warning: {}: {}", item, error));
        report.failures.push(ItemFailure { item, error });
    }
}
