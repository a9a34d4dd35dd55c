//! Error taxonomy for the reconciliation core
//!
//! Every fallible operation in `workflow`, `api` and `reconcile` returns `SyncError`.
//! The driver decides per variant whether a failure stays scoped to one workflow
//! or aborts the whole run (see `SyncError::is_fatal`).

use std::path::{Path, PathBuf};

/// Result alias used across the core
pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Malformed workflow file or response body
    #[error("failed to decode {context}: {message}")]
    Decode { context: String, message: String },

    /// Remote workflow id is absent on the server
    #[error("workflow not found: {0}")]
    NotFound(String),

    /// A name resolves to more than one remote workflow
    #[error("multiple remote workflows are named '{name}' (IDs: {})", .ids.join(", "))]
    AmbiguousMatch { name: String, ids: Vec<String> },

    /// Non-2xx status or network failure
    #[error("{}", transport_message(.status, .message))]
    Transport { status: Option<u16>, message: String },

    /// Cannot read, write or create a file or directory
    #[error("failed to {action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory-level filesystem failure that aborts the whole run
    #[error("failed to {action} directory {}: {source}", .path.display())]
    Directory {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("API returned status {}: {}", code, message),
        None => format!("request failed: {}", message),
    }
}

impl SyncError {
    pub fn decode(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn filesystem(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn directory(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Directory {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Only directory-level failures end a run; everything else is scoped to one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_display_includes_status_and_body() {
        let err = SyncError::Transport {
            status: Some(500),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API returned status 500: boom");

        let err = SyncError::Transport {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "request failed: connection refused");
    }

    #[test]
    fn only_directory_errors_are_fatal() {
        let io = || std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(SyncError::directory("read", Path::new("wf"), io()).is_fatal());
        assert!(!SyncError::filesystem("write", Path::new("wf/a.json"), io()).is_fatal());
        assert!(!SyncError::NotFound("1".into()).is_fatal());
        assert!(!SyncError::AmbiguousMatch {
            name: "A".into(),
            ids: vec!["1".into(), "2".into()],
        }
        .is_fatal());
    }

    #[test]
    fn ambiguous_match_lists_candidate_ids() {
        let err = SyncError::AmbiguousMatch {
            name: "Shared".into(),
            ids: vec!["4".into(), "7".into()],
        };
        assert_eq!(
            err.to_string(),
            "multiple remote workflows are named 'Shared' (IDs: 4, 7)"
        );
    }
}
