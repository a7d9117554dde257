//! Filesystem and workflow-storage errors.

use std::path::PathBuf;

use thiserror::Error;

/// An I/O failure wrapped with the path it happened on. Surfaced to the
/// caller as-is; there is no silent retry.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("workflow '{name}' not found at {}", path.display())]
    WorkflowNotFound { name: String, path: PathBuf },
}

impl StorageError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_operation_and_path() {
        let err = StorageError::io(
            "create directory",
            "/tmp/out",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("create directory"));
        assert!(text.contains("/tmp/out"));
    }

    #[test]
    fn workflow_not_found_names_workflow() {
        let err = StorageError::WorkflowNotFound {
            name: "demo".to_string(),
            path: PathBuf::from("workflows/demo/actions.json"),
        };
        assert!(err.to_string().contains("demo"));
    }
}
