//! Pull pass: n8n -> local files

use crate::api::WorkflowClient;
use crate::error::{SyncError, SyncResult};
use crate::reconcile::classify::{
    classify_pull, guard_pull_target, ActionKind, PullPolicy, ReconciliationAction,
};
use crate::reconcile::drift::DriftDetector;
use crate::reconcile::engine::{Disposition, Reconciler, RefreshOptions, RunReport};
use crate::workflow::storage::{remove_file, render_workflow, write_file};
use crate::workflow::{FileFormat, LocalIndex, WorkflowRecord};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

impl<C: WorkflowClient> Reconciler<C> {
    /// Write remote workflows into `options.directory`
    ///
    /// Creates the directory when missing (only reported on a dry run). Failing
    /// to create or read it, or to list remote workflows, ends the run with `Err`.
    /// With `workflow_id` set only that workflow is fetched; a lookup failure is
    /// fatal too.
    pub async fn refresh(&mut self, options: &RefreshOptions) -> SyncResult<RunReport> {
        tracing::info!(
            "🔄 Refreshing workflows into {} (dry run: {})",
            options.directory.display(),
            options.dry_run
        );

        let mut report = RunReport::default();
        let root = options.directory.as_path();

        let index = if root.is_dir() {
            LocalIndex::build(root, options.recursive)?
        } else if options.dry_run {
            self.say(&mut report, format!("Would create directory {}", root.display()));
            LocalIndex::default()
        } else {
            std::fs::create_dir_all(root).map_err(|e| SyncError::directory("create", root, e))?;
            tracing::debug!("📁 Created directory {}", root.display());
            LocalIndex::default()
        };

        let remote_list = match options.workflow_id.as_deref() {
            Some(id) => vec![self.client.get_workflow(id).await?],
            None => self.client.list_workflows().await?,
        };
        if remote_list.is_empty() {
            self.say(&mut report, "No workflows found in n8n instance".to_string());
            return Ok(report);
        }

        let detector = DriftDetector::document(options.minimal);
        let policy = PullPolicy {
            root,
            output: options.output,
            overwrite: options.overwrite,
            all: options.all || options.workflow_id.is_some(),
        };

        // Targets written (or simulated) so far
        let mut written: HashSet<PathBuf> = HashSet::new();
        for remote in &remote_list {
            let tracked = remote.id().and_then(|id| index.get(id));
            let drifted = tracked
                .map(|entry| detector.file_has_drift(&entry.path, remote))
                .unwrap_or(true);
            let action = guard_pull_target(
                classify_pull(remote, tracked, drifted, &policy),
                &index,
                &written,
            );
            self.apply_pull(&mut report, &mut written, action, remote, options);
        }

        let refreshed = report.count(ActionKind::Create)
            + report.count(ActionKind::Update)
            + report.count(ActionKind::Convert);
        if refreshed == 0 {
            self.say(&mut report, "No workflows refreshed".to_string());
        }

        tracing::info!(
            "🎉 Refresh finished: {} written, {} failed",
            refreshed,
            report.failures.len()
        );
        Ok(report)
    }

    fn apply_pull(
        &mut self,
        report: &mut RunReport,
        written: &mut HashSet<PathBuf>,
        action: ReconciliationAction,
        remote: &WorkflowRecord,
        options: &RefreshOptions,
    ) {
        match action.kind {
            ActionKind::Create | ActionKind::Update | ActionKind::Convert => {}
            _ => return self.record(report, action, Disposition::Skipped),
        }
        let Some(target) = action.path.clone() else { return };
        if options.dry_run {
            written.insert(target);
            return self.record(report, action, Disposition::Simulated);
        }

        // A file written earlier in this run is never removed
        let previous = action
            .previous_path
            .as_deref()
            .filter(|previous| !written.contains(*previous));
        match write_pulled(remote, &target, previous, options.minimal) {
            Ok(()) => {
                written.insert(target);
                self.record(report, action, Disposition::Executed);
            }
            Err(e) => self.fail(report, target.display().to_string(), e),
        }
    }
}

/// Write `remote` to `target`, then drop the file it replaces
fn write_pulled(
    remote: &WorkflowRecord,
    target: &Path,
    previous: Option<&Path>,
    minimal: bool,
) -> SyncResult<()> {
    let format = FileFormat::from_path(target).unwrap_or(FileFormat::Json);
    let content = render_workflow(remote, format, minimal)?;
    write_file(target, &content)?;
    if let Some(previous) = previous.filter(|previous| *previous != target) {
        if previous.exists() {
            remove_file(previous)?;
        }
    }
    Ok(())
}
