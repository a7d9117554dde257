//! Workflow storage and output-batch layout.
//!
//! On disk:
//!
//! ```text
//! workflows/<name>/actions.json   the action list
//! workflows/<name>/config.json    optional per-workflow overrides
//! output/<name>_<timestamp>/      one batch per run (artifacts, timeline)
//! output/temp-videos/             raw capture spool
//! sessions/<name>.json            saved browser sessions
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use reelflow_protocols::StorageError;

/// Loads and scaffolds named workflow definitions under `workflows/`.
pub struct WorkflowStore {
    root: PathBuf,
}

impl WorkflowStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn workflows_dir(&self) -> PathBuf {
        self.root.join("workflows")
    }

    pub fn actions_path(&self, name: &str) -> PathBuf {
        self.workflows_dir().join(name).join("actions.json")
    }

    /// Load a workflow's raw action list.
    pub fn load_actions(&self, name: &str) -> Result<Value, StorageError> {
        let path = self.actions_path(name);
        if !path.exists() {
            return Err(StorageError::WorkflowNotFound {
                name: name.to_string(),
                path,
            });
        }

        let content =
            fs::read_to_string(&path).map_err(|e| StorageError::io("read", path.clone(), e))?;
        serde_json::from_str(&content).map_err(|source| StorageError::InvalidJson { path, source })
    }

    /// Names of every stored workflow (directories with an actions.json),
    /// sorted.
    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        let dir = self.workflows_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| StorageError::io("read", dir.clone(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io("read", dir.clone(), e))?;
            let path = entry.path();
            if path.is_dir() && path.join("actions.json").exists() {
                if let Some(name) = path.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Scaffold a new workflow: a sample action list plus a sample config.
    pub fn create_template(&self, name: &str) -> Result<PathBuf, StorageError> {
        let dir = self.workflows_dir().join(name);
        ensure_dir(&dir)?;

        let actions = serde_json::json!([
            {
                "type": "goto",
                "url": "https://example.com",
                "description": "Navigate to example.com"
            },
            {
                "type": "waitForSelector",
                "selector": "h1",
                "description": "Wait for page to load"
            },
            {
                "type": "screenshot",
                "description": "Take a screenshot"
            }
        ]);
        write_json(&dir.join("actions.json"), &actions)?;

        let config = serde_json::json!({
            "browser": {"headless": false},
            "video": {"fps": 30}
        });
        write_json(&dir.join("config.json"), &config)?;

        info!("created workflow template: {name}");
        Ok(dir)
    }
}

/// One run's output directory, timestamped per batch.
#[derive(Debug, Clone)]
pub struct OutputBatch {
    pub dir: PathBuf,
    pub screenshots_dir: PathBuf,
}

impl OutputBatch {
    /// Create `output/<name>_<timestamp>/` with its screenshots child.
    pub fn create(root: &Path, workflow_name: &str) -> Result<Self, StorageError> {
        let dir = root
            .join("output")
            .join(format!("{workflow_name}_{}", generate_timestamp()));
        let screenshots_dir = dir.join("screenshots");
        ensure_dir(&screenshots_dir)?;
        Ok(Self {
            dir,
            screenshots_dir,
        })
    }
}

/// The raw-capture spool directory.
pub fn temp_videos_dir(root: &Path) -> PathBuf {
    root.join("output").join("temp-videos")
}

/// Newest capture file in the spool, by modification time.
pub fn latest_capture(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "webm"))
        .max_by_key(|p| {
            p.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        })
}

/// Filesystem-safe local timestamp for batch directory names.
pub fn generate_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

pub fn ensure_dir(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).map_err(|e| StorageError::io("create directory", path, e))
}

pub fn write_json(path: &Path, value: &Value) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| {
        StorageError::InvalidJson {
            path: path.to_path_buf(),
            source,
        }
    })?;
    fs::write(path, content).map_err(|e| StorageError::io("write", path, e))
}

pub fn copy_file(from: &Path, to: &Path) -> Result<(), StorageError> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| StorageError::io("copy", to, e))
}

pub fn remove_file(path: &Path) -> Result<(), StorageError> {
    fs::remove_file(path).map_err(|e| StorageError::io("remove", path, e))
}
