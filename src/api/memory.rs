//! In-memory workflow server
//!
//! Behaves like a small n8n instance: sequential ids, server-stamped timestamps,
//! NotFound for unknown ids. Every mutating call is recorded so callers can
//! assert what a reconciliation pass actually did.

use crate::api::WorkflowClient;
use crate::error::{SyncError, SyncResult};
use crate::workflow::WorkflowRecord;
use chrono::Utc;
use std::sync::Mutex;

/// A mutating call received by `MemoryClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationCall {
    Create { name: String },
    Update { id: String },
    Delete { id: String },
    Activate { id: String },
    Deactivate { id: String },
}

#[derive(Debug, Default)]
struct State {
    workflows: Vec<WorkflowRecord>,
    next_id: u64,
    calls: Vec<MutationCall>,
    /// Ids whose next mutating call fails with a 500
    failing: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryClient {
    state: Mutex<State>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::with_workflows(Vec::new())
    }

    /// Seed the server; new ids continue after the highest numeric seeded id
    pub fn with_workflows(workflows: Vec<WorkflowRecord>) -> Self {
        let highest = workflows
            .iter()
            .filter_map(|w| w.id().and_then(|id| id.parse::<u64>().ok()))
            .max()
            .unwrap_or(0);
        Self {
            state: Mutex::new(State {
                workflows,
                next_id: highest + 1,
                ..Default::default()
            }),
        }
    }

    /// Make mutating calls against `id` fail with a server error
    pub fn fail_mutations_for(&self, id: &str) {
        self.lock().failing.push(id.to_string());
    }

    pub fn workflows(&self) -> Vec<WorkflowRecord> {
        self.lock().workflows.clone()
    }

    pub fn workflow(&self, id: &str) -> Option<WorkflowRecord> {
        self.lock()
            .workflows
            .iter()
            .find(|w| w.id() == Some(id))
            .cloned()
    }

    pub fn calls(&self) -> Vec<MutationCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-call.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mutate<T>(
        &self,
        call: MutationCall,
        id: &str,
        apply: impl FnOnce(&mut Vec<WorkflowRecord>, usize) -> T,
    ) -> SyncResult<T> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.iter().any(|f| f == id) {
            return Err(SyncError::Transport {
                status: Some(500),
                message: format!("simulated failure for workflow {}", id),
            });
        }
        let position = state
            .workflows
            .iter()
            .position(|w| w.id() == Some(id))
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
        Ok(apply(&mut state.workflows, position))
    }

    fn set_active(&self, id: &str, active: bool) -> SyncResult<WorkflowRecord> {
        let call = if active {
            MutationCall::Activate { id: id.to_string() }
        } else {
            MutationCall::Deactivate { id: id.to_string() }
        };
        self.mutate(call, id, |workflows, position| {
            let workflow = &mut workflows[position];
            workflow.active = Some(active);
            workflow.updated_at = Some(Utc::now());
            workflow.clone()
        })
    }
}

impl WorkflowClient for MemoryClient {
    async fn list_workflows(&self) -> SyncResult<Vec<WorkflowRecord>> {
        Ok(self.workflows())
    }

    async fn get_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        self.workflow(id)
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }

    async fn create_workflow(&self, workflow: &WorkflowRecord) -> SyncResult<WorkflowRecord> {
        let mut state = self.lock();
        state.calls.push(MutationCall::Create {
            name: workflow.name.clone(),
        });

        let id = state.next_id.to_string();
        state.next_id += 1;

        let now = Utc::now();
        let created = WorkflowRecord {
            id: Some(id),
            name: workflow.name.clone(),
            active: Some(false),
            nodes: workflow.nodes.clone(),
            connections: workflow.connections.clone(),
            settings: workflow.settings.clone(),
            static_data: workflow.static_data.clone(),
            tags: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        state.workflows.push(created.clone());
        Ok(created)
    }

    async fn update_workflow(&self, id: &str, workflow: &WorkflowRecord) -> SyncResult<WorkflowRecord> {
        let call = MutationCall::Update { id: id.to_string() };
        self.mutate(call, id, |workflows, position| {
            let stored = &mut workflows[position];
            stored.name = workflow.name.clone();
            stored.nodes = workflow.nodes.clone();
            stored.connections = workflow.connections.clone();
            stored.settings = workflow.settings.clone();
            stored.static_data = workflow.static_data.clone();
            stored.updated_at = Some(Utc::now());
            stored.clone()
        })
    }

    async fn delete_workflow(&self, id: &str) -> SyncResult<()> {
        let call = MutationCall::Delete { id: id.to_string() };
        self.mutate(call, id, |workflows, position| {
            workflows.remove(position);
        })
    }

    async fn activate_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        self.set_active(id, true)
    }

    async fn deactivate_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        self.set_active(id, false)
    }
}
