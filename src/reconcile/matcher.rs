//! Pairing local workflows with remote ones
//!
//! Id first, exact name second. A name shared by several remote workflows is an
//! error for that one workflow, never a guess.

use crate::api::WorkflowClient;
use crate::error::{SyncError, SyncResult};
use crate::workflow::WorkflowRecord;

/// Outcome of pairing a local workflow with a remote one
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// The local id exists on the server
    ById(WorkflowRecord),
    /// No usable id; exactly one remote workflow carries the same name
    ByName(WorkflowRecord),
    Unmatched,
}

impl MatchResult {
    pub fn remote(&self) -> Option<&WorkflowRecord> {
        match self {
            Self::ById(remote) | Self::ByName(remote) => Some(remote),
            Self::Unmatched => None,
        }
    }
}

/// Resolve the match for `local`
///
/// `fetched_by_id` is the result of looking the local id up on the server, `None`
/// when the file has no id or the server no longer knows it.
pub fn match_remote(
    local: &WorkflowRecord,
    fetched_by_id: Option<WorkflowRecord>,
    remote_list: &[WorkflowRecord],
) -> SyncResult<MatchResult> {
    if let Some(remote) = fetched_by_id {
        return Ok(MatchResult::ById(remote));
    }

    let candidates: Vec<&WorkflowRecord> = remote_list
        .iter()
        .filter(|remote| remote.name == local.name)
        .collect();

    match candidates.as_slice() {
        [] => Ok(MatchResult::Unmatched),
        [only] => Ok(MatchResult::ByName((*only).clone())),
        many => Err(SyncError::AmbiguousMatch {
            name: local.name.clone(),
            ids: many
                .iter()
                .map(|remote| remote.id().unwrap_or("?").to_string())
                .collect(),
        }),
    }
}

/// Look up the local id on the server, absorbing `NotFound`
pub async fn fetch_by_id<C: WorkflowClient>(
    client: &C,
    local: &WorkflowRecord,
) -> SyncResult<Option<WorkflowRecord>> {
    let Some(id) = local.id() else { return Ok(None) };
    match client.get_workflow(id).await {
        Ok(remote) => Ok(Some(remote)),
        Err(e) if e.is_not_found() => {
            tracing::debug!("Stale workflow ID {} for '{}'", id, local.name);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Resolve a user-supplied identifier: workflow id first, then exact name
pub async fn find_by_identifier<C: WorkflowClient>(
    client: &C,
    identifier: &str,
) -> SyncResult<WorkflowRecord> {
    match client.get_workflow(identifier).await {
        Ok(remote) => return Ok(remote),
        Err(e) if !e.is_not_found() => return Err(e),
        Err(_) => {}
    }

    let wanted = WorkflowRecord::new(identifier);
    let remote_list = client.list_workflows().await?;
    match match_remote(&wanted, None, &remote_list)? {
        MatchResult::ById(remote) | MatchResult::ByName(remote) => Ok(remote),
        MatchResult::Unmatched => Err(SyncError::NotFound(identifier.to_string())),
    }
}
