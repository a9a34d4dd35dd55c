//! n8n API Layer
//!
//! This module provides the transport seam the reconciler talks through:
//! - `WorkflowClient`: the seven workflow operations of the n8n public API
//! - `HttpClient`: reqwest implementation against a live instance
//! - `MemoryClient`: in-memory implementation for tests and dry experiments

use crate::error::SyncResult;
use crate::workflow::WorkflowRecord;

// reqwest-backed client for the n8n REST API
pub mod client;

// In-memory server double
pub mod memory;

pub use client::HttpClient;
pub use memory::{MemoryClient, MutationCall};

/// Workflow operations consumed by the reconciliation engine
///
/// Implementations report a missing workflow as `SyncError::NotFound` and any
/// other non-2xx status or network failure as `SyncError::Transport`.
#[allow(async_fn_in_trait)]
pub trait WorkflowClient {
    /// List workflows on the instance (first page only)
    async fn list_workflows(&self) -> SyncResult<Vec<WorkflowRecord>>;

    async fn get_workflow(&self, id: &str) -> SyncResult<WorkflowRecord>;

    /// Create a workflow; the returned record carries the server-assigned id
    async fn create_workflow(&self, workflow: &WorkflowRecord) -> SyncResult<WorkflowRecord>;

    async fn update_workflow(&self, id: &str, workflow: &WorkflowRecord) -> SyncResult<WorkflowRecord>;

    async fn delete_workflow(&self, id: &str) -> SyncResult<()>;

    async fn activate_workflow(&self, id: &str) -> SyncResult<WorkflowRecord>;

    async fn deactivate_workflow(&self, id: &str) -> SyncResult<WorkflowRecord>;
}

impl<T: WorkflowClient> WorkflowClient for &T {
    async fn list_workflows(&self) -> SyncResult<Vec<WorkflowRecord>> {
        (**self).list_workflows().await
    }

    async fn get_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        (**self).get_workflow(id).await
    }

    async fn create_workflow(&self, workflow: &WorkflowRecord) -> SyncResult<WorkflowRecord> {
        (**self).create_workflow(workflow).await
    }

    async fn update_workflow(&self, id: &str, workflow: &WorkflowRecord) -> SyncResult<WorkflowRecord> {
        (**self).update_workflow(id, workflow).await
    }

    async fn delete_workflow(&self, id: &str) -> SyncResult<()> {
        (**self).delete_workflow(id).await
    }

    async fn activate_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        (**self).activate_workflow(id).await
    }

    async fn deactivate_workflow(&self, id: &str) -> SyncResult<WorkflowRecord> {
        (**self).deactivate_workflow(id).await
    }
}
