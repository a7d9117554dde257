//! The workflow orchestrator.
//!
//! One run walks `Loaded -> Validated -> Running -> {Succeeded, Failed}`,
//! with a forced finalizing phase on both terminal paths: whatever happened
//! in the action loop, the page is closed, any partial capture is salvaged
//! through the encoder, the timeline log is finalized exactly once, and the
//! browser is released. The orchestrator never exits the process; exit-code
//! decisions belong to the CLI layer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use reelflow_browser::{BrowserController, CdpPage, ScreencastRecorder};
use reelflow_config::{merge_configs, ConfigError, ConfigLoader, RecordingConfig};
use reelflow_protocols::{
    Action, DispatchError, ExecutionContext, ExecutionResult, RunOptions, SessionPage,
    StorageError, ValidationFailure, Workflow,
};

use crate::handlers::register_default_handlers;
use crate::registry::{ActionRegistry, RegistryError};
use crate::sessions::SessionStore;
use crate::storage::{self, OutputBatch, WorkflowStore};
use crate::timeline::{TimelineLogger, TrackConfig};
use crate::validate::validate_workflow;
use crate::VideoEncoder;

/// Fixed pause between actions so recordings stay followable.
const INTER_ACTION_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Loads, validates, and executes workflows rooted at one project
/// directory.
pub struct WorkflowRunner {
    root: PathBuf,
    registry: Arc<ActionRegistry>,
}

impl WorkflowRunner {
    /// A runner with the default handler set bound for every action tag.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let registry = ActionRegistry::new();
        register_default_handlers(&registry)?;
        Ok(Self::with_registry(root, Arc::new(registry)))
    }

    /// A runner over a caller-assembled registry (e.g. dry-run handlers).
    pub fn with_registry(root: impl Into<PathBuf>, registry: Arc<ActionRegistry>) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    pub fn store(&self) -> WorkflowStore {
        WorkflowStore::new(&self.root)
    }

    /// Load a named workflow into its raw (unvalidated) form, with any
    /// sibling config override attached.
    pub fn load_raw(&self, name: &str) -> Result<Value, LoadError> {
        let actions = self.store().load_actions(name)?;
        let mut raw = json!({"name": name, "actions": actions});
        if let Some(overrides) = ConfigLoader::load_workflow_overrides(&self.root, name)? {
            raw["config"] = serde_json::to_value(overrides).map_err(|source| {
                StorageError::InvalidJson {
                    path: ConfigLoader::workflow_config_path(&self.root, name),
                    source,
                }
            })?;
        }
        Ok(raw)
    }

    /// Validate a raw workflow, reporting every issue at once.
    pub fn validate(&self, raw: &Value) -> Result<Workflow, ValidationFailure> {
        validate_workflow(raw)
    }

    /// The merged configuration a workflow would run under.
    pub fn effective_config(&self, workflow: &Workflow) -> Result<RecordingConfig, ConfigError> {
        let global = ConfigLoader::load_global(&self.root)?;
        Ok(merge_configs(&global, workflow.config.as_ref()))
    }

    /// Execute a validated workflow to completion or first failure.
    pub async fn execute(&self, workflow: &Workflow, options: &RunOptions) -> ExecutionResult {
        let started = Instant::now();
        info!("starting workflow: {}", workflow.name);

        let config = match self.effective_config(workflow) {
            Ok(config) => config,
            Err(e) => return fail_before_resources(e.to_string(), started),
        };

        let batch = match OutputBatch::create(&self.root, &workflow.name) {
            Ok(batch) => batch,
            Err(e) => return fail_before_resources(e.to_string(), started),
        };

        let track_config = TrackConfig {
            skip_all_cues: config.video.skip_all_vtt == Some(true),
            skip_all_chapters: config.video.skip_all_chapters == Some(true),
        };
        let mut logger = match TimelineLogger::new(&batch.dir, &workflow.name, track_config) {
            Ok(logger) => logger,
            Err(e) => return fail_before_resources(e.to_string(), started),
        };

        let controller = BrowserController::new(config.browser.clone());
        if let Err(e) = controller.connect().await {
            soft(logger.finalize(elapsed_ms(started)), "finalize timeline log");
            return failed(e.to_string(), None, Some(batch.dir), None, started);
        }
        let session = match controller.open_page().await {
            Ok(session) => session,
            Err(e) => {
                soft(controller.shutdown().await, "shut down browser");
                soft(logger.finalize(elapsed_ms(started)), "finalize timeline log");
                return failed(e.to_string(), None, Some(batch.dir), None, started);
            }
        };

        let session_store = SessionStore::new(&self.root);
        if let Some(name) = &options.load_session {
            soft(
                session_store.restore(&session, name).await,
                "restore browser session",
            );
        }

        let mut recorder = None;
        if options.record {
            let capture_path = storage::temp_videos_dir(&self.root)
                .join(format!("capture_{}.webm", storage::generate_timestamp()));
            match ScreencastRecorder::start(
                session.clone(),
                capture_path,
                config.video.size,
                config.video.fps,
            )
            .await
            {
                Ok(r) => recorder = Some(r),
                Err(e) => warn!("video capture unavailable for this run: {e}"),
            }
        }

        let page = CdpPage::new(session.clone(), &config.browser);
        let ctx = ExecutionContext::new(&batch.dir);

        let loop_result = self
            .run_actions(&page, &workflow.actions, &mut logger, &ctx)
            .await;

        if loop_result.is_ok() {
            info!("workflow completed successfully");
            if let Some(name) = &options.save_session {
                soft(
                    session_store.save(&session, name).await,
                    "save browser session",
                );
            }
        }

        // Close the page first so the capture is flushed; everything after
        // this point is salvage and must not mask the loop outcome.
        soft(page.close().await, "close page");

        let mut capture = None;
        if let Some(rec) = recorder {
            match rec.stop().await {
                Ok(path) if path.exists() => capture = Some(path),
                Ok(path) => warn!("capture file missing at {}", path.display()),
                Err(e) => warn!("screencast capture failed: {e}"),
            }
        }
        if capture.is_none() && options.record {
            // Last resort: anything the spool still holds.
            capture = storage::latest_capture(&storage::temp_videos_dir(&self.root));
        }

        soft(logger.emit_tracks(), "emit cue/chapter tracks");

        let mut video_path = None;
        if let Some(capture_path) = capture {
            video_path = Some(
                self.encode_capture(&capture_path, &batch, logger.chapter_path())
                    .await,
            );
        }

        let duration = started.elapsed();
        soft(logger.finalize(duration.as_millis() as u64), "finalize timeline log");
        info!("timecode log saved to {}", logger.log_path().display());

        soft(controller.shutdown().await, "shut down browser");

        match loop_result {
            Ok(()) => ExecutionResult::succeeded(video_path, batch.dir, duration),
            Err(dispatch) => ExecutionResult {
                success: false,
                video_path,
                output_dir: Some(batch.dir),
                failed_action: Some(dispatch.index()),
                error: Some(dispatch.to_string()),
                duration,
            },
        }
    }

    /// Drive the action loop against an existing page: dispatch strictly in
    /// order, log start/complete/failure, abort on the first error.
    pub async fn run_actions(
        &self,
        page: &dyn SessionPage,
        actions: &[Action],
        logger: &mut TimelineLogger,
        ctx: &ExecutionContext,
    ) -> Result<(), DispatchError> {
        for (index, action) in actions.iter().enumerate() {
            info!(
                "[{}/{}] {}: {}",
                index + 1,
                actions.len(),
                action.tag(),
                action.label()
            );
            soft(logger.record_start(action, index), "log action start");

            let action_started = Instant::now();
            match self.registry.dispatch(action, page, ctx, index).await {
                Ok(()) => {
                    let duration = action_started.elapsed().as_millis() as u64;
                    soft(
                        logger.record_complete(action, index, duration),
                        "log action completion",
                    );
                }
                Err(e) => {
                    soft(logger.record_failure(action, index, &e), "log action failure");
                    return Err(e);
                }
            }

            tokio::time::sleep(INTER_ACTION_DELAY).await;
        }
        Ok(())
    }

    /// Move the raw capture into the batch and run the encoder; every
    /// downgrade keeps some artifact.
    async fn encode_capture(
        &self,
        capture: &std::path::Path,
        batch: &OutputBatch,
        chapter_path: &std::path::Path,
    ) -> PathBuf {
        let webm = batch.dir.join("video.webm");
        if let Err(e) = storage::copy_file(capture, &webm) {
            warn!("failed to move capture into batch: {e}");
            return capture.to_path_buf();
        }
        if let Err(e) = storage::remove_file(capture) {
            warn!("failed to clean capture spool: {e}");
        }

        let mp4 = batch.dir.join("video.mp4");
        VideoEncoder::convert_and_cleanup(&webm, &mp4, Some(chapter_path)).await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn fail_before_resources(error: String, started: Instant) -> ExecutionResult {
    failed(error, None, None, None, started)
}

fn failed(
    error: String,
    video_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    failed_action: Option<usize>,
    started: Instant,
) -> ExecutionResult {
    ExecutionResult {
        success: false,
        video_path,
        output_dir,
        error: Some(error),
        failed_action,
        duration: started.elapsed(),
    }
}

/// Log-and-continue for salvage steps: a secondary failure must never mask
/// the primary outcome.
fn soft<T, E: std::fmt::Display>(result: Result<T, E>, what: &str) {
    if let Err(e) = result {
        warn!("best-effort step failed ({what}): {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockPage;
    use reelflow_protocols::PageError;
    use serde_json::json;
    use tempfile::TempDir;

    fn runner(dir: &TempDir) -> WorkflowRunner {
        WorkflowRunner::new(dir.path()).unwrap()
    }

    fn actions(raw: Value) -> Vec<Action> {
        serde_json::from_value(raw).unwrap()
    }

    fn logger(dir: &TempDir) -> TimelineLogger {
        TimelineLogger::new(dir.path(), "test", TrackConfig::default()).unwrap()
    }

    fn sample_actions() -> Vec<Action> {
        actions(json!([
            {"type": "goto", "url": "https://example.com"},
            {"type": "waitForSelector", "selector": "h1"},
            {"type": "screenshot", "filename": "shot"}
        ]))
    }

    #[tokio::test(start_paused = true)]
    async fn a_successful_run_records_an_entry_per_action() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);
        let mut logger = logger(&dir);

        let mut page = MockPage::new();
        page.expect_navigate().times(1).returning(|_| Ok(()));
        page.expect_wait_for_selector()
            .times(1)
            .returning(|_, _| Ok(()));
        page.expect_screenshot().times(1).returning(|_, _| Ok(()));

        let ctx = ExecutionContext::new(dir.path());
        runner
            .run_actions(&page, &sample_actions(), &mut logger, &ctx)
            .await
            .unwrap();

        let entries = logger.timeline().entries();
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.duration_ms.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn a_failing_action_aborts_the_loop_at_its_index() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);
        let mut logger = logger(&dir);

        let mut page = MockPage::new();
        page.expect_navigate().times(1).returning(|_| Ok(()));
        page.expect_wait_for_selector()
            .times(1)
            .returning(|_, _| Err(PageError::Timeout("h1 never appeared".into())));
        // screenshot must never run.

        let ctx = ExecutionContext::new(dir.path());
        let err = runner
            .run_actions(&page, &sample_actions(), &mut logger, &ctx)
            .await
            .unwrap_err();

        assert_eq!(err.index(), 1);
        assert!(err.to_string().contains("action 1"));

        logger.finalize(2000).unwrap();
        let log = std::fs::read_to_string(logger.log_path()).unwrap();
        assert!(log.contains("[ERROR]"));
        assert!(log.contains("h1 never appeared"));
        assert_eq!(log.matches("Total duration:").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn finalize_happens_exactly_once_for_failures_at_any_index() {
        for failing_index in [0usize, 1, 2] {
            let dir = TempDir::new().unwrap();
            let runner = runner(&dir);
            let mut logger = logger(&dir);

            let mut page = MockPage::new();
            let nav_fails = failing_index == 0;
            page.expect_navigate().returning(move |_| {
                if nav_fails {
                    Err(PageError::Navigation("refused".into()))
                } else {
                    Ok(())
                }
            });
            let wait_fails = failing_index == 1;
            page.expect_wait_for_selector().returning(move |_, _| {
                if wait_fails {
                    Err(PageError::Timeout("t".into()))
                } else {
                    Ok(())
                }
            });
            page.expect_screenshot()
                .returning(|_, _| Err(PageError::Io(std::io::Error::other("disk full"))));

            let ctx = ExecutionContext::new(dir.path());
            let err = runner
                .run_actions(&page, &sample_actions(), &mut logger, &ctx)
                .await
                .unwrap_err();
            assert_eq!(err.index(), failing_index);

            // Both terminal paths of the orchestrator route through one
            // finalize; the logger additionally refuses a duplicate.
            logger.finalize(1000).unwrap();
            logger.finalize(1000).unwrap();
            let log = std::fs::read_to_string(logger.log_path()).unwrap();
            assert_eq!(log.matches("Total duration:").count(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_successful_loop_also_finalizes_exactly_once() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);
        let mut logger = logger(&dir);

        let mut page = MockPage::new();
        page.expect_navigate().returning(|_| Ok(()));
        page.expect_wait_for_selector().returning(|_, _| Ok(()));
        page.expect_screenshot().returning(|_, _| Ok(()));

        let ctx = ExecutionContext::new(dir.path());
        runner
            .run_actions(&page, &sample_actions(), &mut logger, &ctx)
            .await
            .unwrap();
        logger.finalize(3000).unwrap();

        let log = std::fs::read_to_string(logger.log_path()).unwrap();
        assert_eq!(log.matches("Total duration:").count(), 1);
        assert_eq!(log.matches("[Completed #").count(), 3);
    }

    #[test]
    fn load_raw_attaches_sibling_config_overrides() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir);
        runner.store().create_template("demo").unwrap();

        let raw = runner.load_raw("demo").unwrap();
        assert_eq!(raw["name"], "demo");
        assert_eq!(raw["actions"].as_array().unwrap().len(), 3);
        assert_eq!(raw["config"]["browser"]["headless"], false);

        let workflow = runner.validate(&raw).unwrap();
        assert_eq!(workflow.actions.len(), 3);
    }

    #[test]
    fn load_raw_surfaces_missing_workflows() {
        let dir = TempDir::new().unwrap();
        let err = runner(&dir).load_raw("ghost").unwrap_err();
        assert!(matches!(err, LoadError::Storage(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn dry_run_registry_substitutes_without_touching_the_session() {
        use crate::registry::ActionHandler;
        use async_trait::async_trait;
        use reelflow_protocols::HandlerError;

        struct DryRun;

        #[async_trait]
        impl ActionHandler for DryRun {
            async fn execute(
                &self,
                action: &Action,
                _page: &dyn SessionPage,
                _ctx: &ExecutionContext,
            ) -> Result<(), HandlerError> {
                tracing::info!("dry-run: {}", action.label());
                Ok(())
            }
        }

        let dir = TempDir::new().unwrap();
        let registry = ActionRegistry::new();
        for tag in reelflow_protocols::action::ACTION_TAGS {
            registry.register(tag, std::sync::Arc::new(DryRun)).unwrap();
        }
        let runner = WorkflowRunner::with_registry(dir.path(), Arc::new(registry));
        let mut logger = logger(&dir);

        // No expectations: any session call would panic the mock.
        let page = MockPage::new();
        let ctx = ExecutionContext::new(dir.path());
        runner
            .run_actions(&page, &sample_actions(), &mut logger, &ctx)
            .await
            .unwrap();
        assert_eq!(logger.timeline().entries().len(), 3);
    }
}
