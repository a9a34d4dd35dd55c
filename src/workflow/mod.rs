//! Workflow Record Layer
//!
//! This module handles workflow definitions, their canonical form and their
//! files on disk:
//! - Type definitions (WorkflowRecord, Node, Tag)
//! - Normalization into the minimal canonical form
//! - JSON/YAML file persistence
//! - The id -> file index built from a workflow directory

// Core workflow type definitions
pub mod types;

// Canonical form shared by file output and drift comparison
pub mod normalize;

// JSON/YAML read/write helpers
pub mod storage;

// Directory scan and id -> file index
pub mod registry;

// Re-export commonly used types
pub use normalize::{normalize, normalize_value};
pub use registry::{LocalFileEntry, LocalIndex};
pub use storage::{sanitize_filename, FileFormat};
pub use types::{Node, Tag, WorkflowRecord};
