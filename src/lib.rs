//! n8n-sync: keep a directory of n8n workflow files and an n8n instance in step
//!
//! This library provides the reconciliation core behind the `n8n-sync` CLI:
//! push (`sync`), pull (`refresh`), drift detection and prune.

// Instance URL and API key resolution
pub mod config;

// Error taxonomy shared by the core
pub mod error;

// Workflow record layer - types, normalization, files and the local index
pub mod workflow;

// n8n API layer - the client trait and its implementations
pub mod api;

// Reconciliation layer - drift, matching, classification and the driver
pub mod reconcile;

// Re-export commonly used types for external consumers
pub use api::{HttpClient, MemoryClient, WorkflowClient};
pub use config::Config;
pub use error::{SyncError, SyncResult};
pub use reconcile::{Reconciler, RefreshOptions, RunReport, SyncOptions};
pub use workflow::{FileFormat, LocalIndex, WorkflowRecord};
