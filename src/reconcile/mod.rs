//! Reconciliation Layer
//!
//! This module decides and carries out what keeps a workflow directory and an
//! n8n instance in step:
//! - Drift detection on normalized records
//! - Matching local files with remote workflows
//! - Action classification for push, pull, activation and prune
//! - The driver executing or simulating each action

// Canonical comparison of two records
pub mod drift;

// Id-then-name pairing
pub mod matcher;

// Pure decision tables
pub mod classify;

// Options, run report and the shared driver
pub mod engine;

// Local -> remote pass
pub mod push;

// Remote -> local pass
pub mod pull;

pub use classify::{ActionKind, Direction, ReconciliationAction};
pub use drift::{has_drift, DriftDetector, DriftScope};
pub use engine::{
    ActionRecord, Disposition, ItemFailure, Reconciler, RefreshOptions, RunReport, SyncOptions,
};
pub use matcher::{find_by_identifier, match_remote, MatchResult};
