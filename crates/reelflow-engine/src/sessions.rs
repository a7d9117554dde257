//! Browser session persistence.
//!
//! Cookie state is saved per named session under `sessions/<name>.json` and
//! restored before a run's first action. A missing session file is a warning,
//! not a failure.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use reelflow_browser::{CdpError, Cookie, PageSession};
use reelflow_protocols::StorageError;

use crate::storage;

#[derive(Debug, Error)]
pub enum SessionPersistError {
    #[error(transparent)]
    Cdp(#[from] CdpError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Saves and restores named browser sessions.
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join("sessions").join(format!("{name}.json"))
    }

    /// Capture the page's cookies under `name`.
    pub async fn save(&self, session: &PageSession, name: &str) -> Result<(), SessionPersistError> {
        let cookies = session.get_cookies().await?;
        let path = self.path(name);
        let value = serde_json::to_value(&cookies)
            .map_err(|source| StorageError::InvalidJson {
                path: path.clone(),
                source,
            })?;
        if let Some(parent) = path.parent() {
            storage::ensure_dir(parent)?;
        }
        storage::write_json(&path, &value)?;
        info!("session saved to {}", path.display());
        Ok(())
    }

    /// Restore cookies saved under `name`. Returns false (with a warning)
    /// when no such session exists.
    pub async fn restore(
        &self,
        session: &PageSession,
        name: &str,
    ) -> Result<bool, SessionPersistError> {
        let path = self.path(name);
        if !path.exists() {
            warn!("session file not found: {}", path.display());
            return Ok(false);
        }

        let cookies = read_cookies(&path)?;
        session.set_cookies(&cookies).await?;
        info!("session loaded from {}", path.display());
        Ok(true)
    }
}

fn read_cookies(path: &Path) -> Result<Vec<Cookie>, StorageError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| StorageError::io("read", path, e))?;
    serde_json::from_str(&content).map_err(|source| StorageError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn session_paths_are_name_scoped() {
        let store = SessionStore::new("/srv/reelflow");
        assert_eq!(
            store.path("staging"),
            PathBuf::from("/srv/reelflow/sessions/staging.json")
        );
    }

    #[test]
    fn cookies_round_trip_through_the_file_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        let cookies = vec![Cookie {
            name: "sid".to_string(),
            value: "abc123".to_string(),
            domain: "example.com".to_string(),
            path: "/".to_string(),
            expires: Some(1_900_000_000.0),
            http_only: true,
            secure: true,
        }];

        let value = serde_json::to_value(&cookies).unwrap();
        storage::write_json(&path, &value).unwrap();

        let loaded = read_cookies(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "sid");
        assert!(loaded[0].http_only);
    }

    #[test]
    fn malformed_session_files_surface_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[{").unwrap();

        let err = read_cookies(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
