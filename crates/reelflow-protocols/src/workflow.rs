//! Workflow definition and run results.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use reelflow_config::WorkflowOverrides;

use crate::action::Action;

/// A named, ordered sequence of actions.
///
/// Constructed by loading a stored definition, validated once before
/// execution, and never mutated during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub actions: Vec<Action>,
    /// Per-workflow configuration override, merged over the global config
    /// field-by-field before execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<WorkflowOverrides>,
}

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Capture and encode video. Off for `run` (timeline log only).
    pub record: bool,
    /// Restore a saved browser session by name before the first action.
    pub load_session: Option<String>,
    /// Persist the browser session under this name after a successful run.
    pub save_session: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            record: true,
            load_session: None,
            save_session: None,
        }
    }
}

/// Outcome of one workflow run. The orchestrator never exits the process;
/// exit-code decisions belong to the CLI layer.
#[derive(Debug)]
pub struct ExecutionResult {
    pub success: bool,
    /// The encoded video when one was produced; on encoder failure this is
    /// the preserved raw capture instead.
    pub video_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub error: Option<String>,
    /// Index of the action whose dispatch aborted the run.
    pub failed_action: Option<usize>,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn succeeded(
        video_path: Option<PathBuf>,
        output_dir: PathBuf,
        duration: Duration,
    ) -> Self {
        Self {
            success: true,
            video_path,
            output_dir: Some(output_dir),
            error: None,
            failed_action: None,
            duration,
        }
    }
}
