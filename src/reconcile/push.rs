//! Push pass: local files -> n8n

use crate::api::WorkflowClient;
use crate::error::SyncResult;
use crate::reconcile::classify::{
    classify_activation, classify_prune, classify_push, classify_shadowed, ActionKind,
    ReconciliationAction,
};
use crate::reconcile::engine::{Disposition, Reconciler, RunReport, SyncOptions};
use crate::reconcile::matcher::{fetch_by_id, match_remote, MatchResult};
use crate::workflow::storage::{read_workflow, rewrite_id};
use crate::workflow::{LocalFileEntry, LocalIndex, WorkflowRecord};
use std::collections::HashSet;

/// Accumulated state of one push pass
struct PushRun {
    remote_list: Vec<WorkflowRecord>,
    /// Remote ids owned by a local file: the index ids plus every id matched by
    /// name or created during this run
    claimed: HashSet<String>,
}

impl PushRun {
    /// Remote workflows a name match may still pick
    fn unclaimed(&self) -> Vec<WorkflowRecord> {
        self.remote_list
            .iter()
            .filter(|remote| remote.id().map_or(true, |id| !self.claimed.contains(id)))
            .cloned()
            .collect()
    }
}

impl<C: WorkflowClient> Reconciler<C> {
    /// Push every workflow file in `options.directory` to the server
    ///
    /// Per-workflow failures are collected in the report. Only failing to read the
    /// directory or to list remote workflows ends the run with `Err`.
    pub async fn sync(&mut self, options: &SyncOptions) -> SyncResult<RunReport> {
        tracing::info!(
            "🚀 Syncing workflows from {} (dry run: {}, prune: {})",
            options.directory.display(),
            options.dry_run,
            options.prune
        );

        let index = LocalIndex::build(&options.directory, options.recursive)?;
        let mut run = PushRun {
            remote_list: self.client.list_workflows().await?,
            claimed: index.ids().map(str::to_string).collect(),
        };
        tracing::debug!(
            "📊 {} local files, {} remote workflows",
            index.entries().len(),
            run.remote_list.len()
        );

        let mut report = RunReport::default();
        for entry in index.entries() {
            if let Some(owner) = entry.id.as_deref().and_then(|id| index.get(id)) {
                if owner.path != entry.path {
                    self.skip_shadowed(&mut report, entry, owner);
                    continue;
                }
            }
            self.push_file(&mut report, &mut run, entry, options).await;
        }

        if options.prune {
            for action in classify_prune(&run.remote_list, &run.claimed) {
                self.delete(&mut report, action, options.dry_run).await;
            }
        }

        tracing::info!(
            "🎉 Sync finished: {} created, {} updated, {} deleted, {} failed",
            report.count(ActionKind::Create),
            report.count(ActionKind::Update),
            report.count(ActionKind::Delete),
            report.failures.len()
        );
        Ok(report)
    }

    fn skip_shadowed(&mut self, report: &mut RunReport, entry: &LocalFileEntry, owner: &LocalFileEntry) {
        let name = read_workflow(&entry.path)
            .map(|local| local.name)
            .unwrap_or_default();
        let action = classify_shadowed(entry, &name, owner);
        self.record(report, action, Disposition::Skipped);
    }

    async fn push_file(
        &mut self,
        report: &mut RunReport,
        run: &mut PushRun,
        entry: &LocalFileEntry,
        options: &SyncOptions,
    ) {
        let item = entry.path.display().to_string();
        let local = match read_workflow(&entry.path) {
            Ok(local) => local,
            Err(e) => return self.fail(report, item, e),
        };

        let fetched = match fetch_by_id(&self.client, &local).await {
            Ok(fetched) => fetched,
            Err(e) => return self.fail(report, item, e),
        };
        let candidates = if fetched.is_some() {
            Vec::new()
        } else {
            run.unclaimed()
        };
        let matched = match match_remote(&local, fetched, &candidates) {
            Ok(matched) => matched,
            Err(e) => return self.fail(report, item, e),
        };

        if let Some(id) = matched.remote().and_then(WorkflowRecord::id) {
            run.claimed.insert(id.to_string());
        }

        let mut action = classify_push(&local, &matched, &entry.path, options.minimal);
        let desired = if options.activate_all {
            Some(true)
        } else {
            local.active
        };

        // Latest known server state; drives the activation step
        let mut current = matched.remote().cloned();

        if options.dry_run {
            let disposition = if action.kind == ActionKind::NoChange {
                Disposition::Skipped
            } else {
                Disposition::Simulated
            };
            self.record(report, action, disposition);
            self.activation(report, &local.name, entry, desired, current.as_ref(), true)
                .await;
            return;
        }

        match action.kind {
            ActionKind::Create => match self.client.create_workflow(&local).await {
                Ok(created) => {
                    action.id = created.id().map(str::to_string);
                    self.record(report, action, Disposition::Executed);
                    if let Some(id) = created.id() {
                        self.write_back_id(report, entry, id);
                        run.claimed.insert(id.to_string());
                    }
                    current = Some(created);
                }
                Err(e) => return self.fail(report, item, e),
            },
            ActionKind::Update => {
                let Some(id) = action.id.clone() else { return };
                match self.client.update_workflow(&id, &local).await {
                    Ok(updated) => {
                        self.record(report, action, Disposition::Executed);
                        if matches!(matched, MatchResult::ByName(_)) {
                            self.write_back_id(report, entry, &id);
                        }
                        current = Some(updated);
                    }
                    Err(e) => self.fail(report, item, e),
                }
            }
            _ => self.record(report, action, Disposition::Skipped),
        }

        if current.as_ref().and_then(WorkflowRecord::id).is_some() {
            self.activation(report, &local.name, entry, desired, current.as_ref(), false)
                .await;
        }
    }

    /// Substitute the server id into the file after a create or a name match
    fn write_back_id(&mut self, report: &mut RunReport, entry: &LocalFileEntry, id: &str) {
        match rewrite_id(&entry.path, id) {
            Ok(true) => tracing::debug!("📝 Wrote ID {} into {}", id, entry.path.display()),
            Ok(false) => {}
            Err(e) => self.fail(report, entry.path.display().to_string(), e),
        }
    }

    /// `current` is the last known server state; its id is the activation target
    async fn activation(
        &mut self,
        report: &mut RunReport,
        name: &str,
        entry: &LocalFileEntry,
        desired: Option<bool>,
        current: Option<&WorkflowRecord>,
        dry_run: bool,
    ) {
        let id = current.and_then(WorkflowRecord::id);
        let is_active = current.map(WorkflowRecord::is_active).unwrap_or(false);
        let Some(action) = classify_activation(name, id, Some(&entry.path), desired, is_active) else {
            return;
        };
        if dry_run {
            return self.record(report, action, Disposition::Simulated);
        }
        let Some(id) = action.id.clone() else { return };

        let result = match action.kind {
            ActionKind::Activate => self.client.activate_workflow(&id).await,
            _ => self.client.deactivate_workflow(&id).await,
        };
        match result {
            Ok(_) => self.record(report, action, Disposition::Executed),
            Err(e) => self.fail(report, format!("workflow '{}' (ID: {})", name, id), e),
        }
    }

    async fn delete(&mut self, report: &mut RunReport, action: ReconciliationAction, dry_run: bool) {
        if dry_run {
            return self.record(report, action, Disposition::Simulated);
        }
        let Some(id) = action.id.clone() else { return };
        match self.client.delete_workflow(&id).await {
            Ok(()) => self.record(report, action, Disposition::Executed),
            Err(e) => self.fail(report, format!("workflow '{}' (ID: {})", action.name, id), e),
        }
    }
}
