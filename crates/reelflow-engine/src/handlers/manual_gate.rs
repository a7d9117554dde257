//! Manual-gate handler: a blocking wait released by human intervention.
//!
//! Three mutually exclusive release strategies, chosen by which field is
//! present (selector > text > signal file). Exceeding the bound is a hard
//! failure, not a soft skip. The guidance overlay, when shown, is removed
//! on every exit path including the timeout failure.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{info, warn};

use reelflow_protocols::action::ManualGateAction;
use reelflow_protocols::page::MessageOptions;
use reelflow_protocols::{
    Action, ExecutionContext, HandlerError, PageError, SessionPage, StorageError,
};

use crate::registry::ActionHandler;

/// Marker file polled for in signal-file mode, relative to the working
/// directory.
pub const GATE_MARKER_FILE: &str = ".continue";

const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(300);
const MARKER_POLL: Duration = Duration::from_secs(1);

pub struct ManualGateHandler {
    marker_path: PathBuf,
}

impl Default for ManualGateHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualGateHandler {
    pub fn new() -> Self {
        Self {
            marker_path: PathBuf::from(GATE_MARKER_FILE),
        }
    }

    /// Poll a different marker location; used by tests.
    pub fn with_marker_path(marker_path: impl Into<PathBuf>) -> Self {
        Self {
            marker_path: marker_path.into(),
        }
    }

    fn gate_timeout_error(timeout: Duration) -> HandlerError {
        HandlerError::GateTimeout {
            elapsed_secs: timeout.as_secs(),
        }
    }

    async fn wait_for_release(
        &self,
        gate: &ManualGateAction,
        page: &dyn SessionPage,
        timeout: Duration,
    ) -> Result<(), HandlerError> {
        if let Some(selector) = &gate.continue_selector {
            info!("waiting for selector {selector} (up to {}s)", timeout.as_secs());
            return page
                .wait_for_selector(selector, Some(timeout.as_millis() as u64))
                .await
                .map_err(|e| match e {
                    PageError::Timeout(_) => Self::gate_timeout_error(timeout),
                    other => HandlerError::Page(other),
                });
        }

        if let Some(text) = &gate.continue_text {
            info!("waiting for text \"{text}\" (up to {}s)", timeout.as_secs());
            return page
                .wait_for_text(text, timeout.as_millis() as u64)
                .await
                .map_err(|e| match e {
                    PageError::Timeout(_) => Self::gate_timeout_error(timeout),
                    other => HandlerError::Page(other),
                });
        }

        // Signal-file mode: poll for the marker, consume it on detection.
        info!(
            "waiting for marker file {} (up to {}s)",
            self.marker_path.display(),
            timeout.as_secs()
        );
        let started = Instant::now();
        loop {
            if tokio::fs::try_exists(&self.marker_path).await.unwrap_or(false) {
                tokio::fs::remove_file(&self.marker_path)
                    .await
                    .map_err(|e| {
                        HandlerError::Storage(StorageError::io(
                            "remove",
                            self.marker_path.clone(),
                            e,
                        ))
                    })?;
                info!("manual action completed (marker file detected)");
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(Self::gate_timeout_error(timeout));
            }
            tokio::time::sleep(MARKER_POLL).await;
        }
    }
}

#[async_trait]
impl ActionHandler for ManualGateHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::WaitForManualAction(gate) = action else {
            return Err(HandlerError::UnexpectedPayload {
                expected: "waitForManualAction",
            });
        };

        let timeout = gate
            .timeout
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_GATE_TIMEOUT);
        let prompt = gate
            .message
            .clone()
            .or_else(|| gate.meta.description.clone())
            .unwrap_or_else(|| "Please complete the manual action".to_string());
        info!("manual action required: {prompt}");

        let overlay_shown = gate.show_overlay == Some(true);
        if overlay_shown {
            let overlay = gate.overlay_options.clone().unwrap_or_default();
            let options = MessageOptions {
                message: overlay.instruction.unwrap_or_else(|| prompt.clone()),
                title: overlay.title,
                position: None,
                duration_ms: 0,
                style: Default::default(),
                close_button: false,
                backdrop: overlay.backdrop != Some(false),
                progress: overlay.progress == Some(true),
            };
            page.show_message(&options).await?;
        }

        let result = self.wait_for_release(gate, page, timeout).await;

        // Cleanup happens on every exit path; a secondary failure must not
        // mask the gate outcome.
        if overlay_shown {
            if let Err(e) = page.remove_overlay().await {
                warn!("failed to remove gate overlay: {e}");
            }
        }

        result
    }
}
