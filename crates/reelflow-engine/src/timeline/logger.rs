//! The timeline's I/O shell: timecode log, cue track, chapter track.

use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use tracing::warn;

use reelflow_protocols::{Action, StorageError};

use super::tracks::{
    derive_chapters, derive_cues, format_clock, format_duration_human, render_chapters, render_vtt,
};
use super::{Timeline, TrackConfig};

const LOG_FILE: &str = "timecode.txt";
const VTT_FILE: &str = "markers.vtt";
const CHAPTER_FILE: &str = "chapters.txt";
const RULE_WIDTH: usize = 80;

/// Writes the run narrative as it happens and emits the derived tracks.
///
/// `finalize` must run exactly once per run, on success and failure alike,
/// so the log file is always well-formed. `emit_tracks` is independent of
/// `finalize`: the chapter file has to exist before the encoder runs, while
/// the plain-text log is only closed out afterwards.
pub struct TimelineLogger {
    timeline: Timeline,
    origin: Instant,
    log_path: PathBuf,
    vtt_path: PathBuf,
    chapter_path: PathBuf,
    finalized: bool,
}

impl TimelineLogger {
    pub fn new(
        output_dir: &Path,
        workflow_name: &str,
        config: TrackConfig,
    ) -> Result<Self, StorageError> {
        let log_path = output_dir.join(LOG_FILE);
        let header = format!(
            "Workflow: {workflow_name}\nStarted at: {}\n{}\n\nTIME\t\tDURATION\tACTION\t\t\tDESCRIPTION\n{}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "=".repeat(RULE_WIDTH),
            "-".repeat(RULE_WIDTH),
        );
        std::fs::write(&log_path, header)
            .map_err(|e| StorageError::io("write", log_path.clone(), e))?;

        Ok(Self {
            timeline: Timeline::new(config),
            origin: Instant::now(),
            log_path,
            vtt_path: output_dir.join(VTT_FILE),
            chapter_path: output_dir.join(CHAPTER_FILE),
            finalized: false,
        })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn chapter_path(&self) -> &Path {
        &self.chapter_path
    }

    pub fn vtt_path(&self) -> &Path {
        &self.vtt_path
    }

    fn raw_elapsed_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn append(&self, line: &str) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)
            .map_err(|e| StorageError::io("append", self.log_path.clone(), e))?;
        writeln!(file, "{line}").map_err(|e| StorageError::io("append", self.log_path.clone(), e))
    }

    /// Record an action start: one timeline entry, one log line.
    pub fn record_start(&mut self, action: &Action, _index: usize) -> Result<(), StorageError> {
        let elapsed = self.timeline.record_start(action, self.raw_elapsed_ms());
        let line = format!(
            "{}\t\t+0ms\t\t{:<20}\t{}",
            format_clock(elapsed),
            action.tag(),
            action.label()
        );
        self.append(&line)
    }

    /// Annotate the last entry with its wall-clock duration.
    pub fn record_complete(
        &mut self,
        _action: &Action,
        index: usize,
        duration_ms: u64,
    ) -> Result<(), StorageError> {
        self.timeline.record_complete(duration_ms);
        let elapsed = self.timeline.rebase(self.raw_elapsed_ms());
        let line = format!(
            "{}\t\t+{duration_ms}ms\t\t[Completed #{}]",
            format_clock(elapsed),
            index + 1
        );
        self.append(&line)
    }

    /// Append an error marker; the entries recorded so far stay untouched.
    pub fn record_failure(
        &mut self,
        action: &Action,
        _index: usize,
        error: &dyn Display,
    ) -> Result<(), StorageError> {
        let message = error.to_string();
        self.timeline
            .record_error(action, self.raw_elapsed_ms(), &message);
        let elapsed = self.timeline.rebase(self.raw_elapsed_ms());
        let line = format!(
            "{}\t\t[ERROR]\t\t{}\t\t{message}",
            format_clock(elapsed),
            action.tag()
        );
        self.append(&line)
    }

    /// Deterministically (re)generate the cue and chapter files from the
    /// current entries. Callable before `finalize`.
    pub fn emit_tracks(&self) -> Result<(), StorageError> {
        let vtt = render_vtt(&derive_cues(&self.timeline));
        std::fs::write(&self.vtt_path, vtt)
            .map_err(|e| StorageError::io("write", self.vtt_path.clone(), e))?;

        let chapters = render_chapters(&derive_chapters(&self.timeline));
        std::fs::write(&self.chapter_path, chapters)
            .map_err(|e| StorageError::io("write", self.chapter_path.clone(), e))?;
        Ok(())
    }

    /// Close out the log with the summary footer and emit the tracks.
    ///
    /// The orchestrator calls this exactly once per run; a second call is a
    /// bug upstream and is refused without rewriting the footer.
    pub fn finalize(&mut self, total_duration_ms: u64) -> Result<(), StorageError> {
        if self.finalized {
            warn!("timeline already finalized; ignoring repeated finalize");
            return Ok(());
        }
        self.finalized = true;

        let footer = format!(
            "\n{}\nTotal duration: {}\nCompleted at: {}\n",
            "-".repeat(RULE_WIDTH),
            format_duration_human(total_duration_ms),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        self.append(&footer)?;
        self.emit_tracks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn action(raw: serde_json::Value) -> Action {
        serde_json::from_value(raw).unwrap()
    }

    fn logger(dir: &TempDir) -> TimelineLogger {
        TimelineLogger::new(dir.path(), "demo", TrackConfig::default()).unwrap()
    }

    #[test]
    fn header_names_the_workflow() {
        let dir = TempDir::new().unwrap();
        let logger = logger(&dir);
        let content = std::fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.starts_with("Workflow: demo\nStarted at: "));
        assert!(content.contains("TIME\t\tDURATION\tACTION"));
    }

    #[test]
    fn start_complete_and_error_lines_are_appended_in_order() {
        let dir = TempDir::new().unwrap();
        let mut logger = logger(&dir);
        let goto = action(json!({"type": "goto", "url": "https://a.dev"}));
        let click = action(json!({"type": "click", "selector": "#b"}));

        logger.record_start(&goto, 0).unwrap();
        logger.record_complete(&goto, 0, 42).unwrap();
        logger.record_start(&click, 1).unwrap();
        logger
            .record_failure(&click, 1, &"element not found: #b")
            .unwrap();

        let content = std::fs::read_to_string(logger.log_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        let body: Vec<&str> = lines
            .iter()
            .skip_while(|l| !l.starts_with('-'))
            .skip(1)
            .copied()
            .collect();

        assert!(body[0].contains("goto"));
        assert!(body[0].contains("Navigate to https://a.dev"));
        assert!(body[1].contains("[Completed #1]"));
        assert!(body[1].contains("+42ms"));
        assert!(body[2].contains("Click #b"));
        assert!(body[3].contains("[ERROR]"));
        assert!(body[3].contains("element not found"));
    }

    #[test]
    fn emit_tracks_writes_both_files_before_finalize() {
        let dir = TempDir::new().unwrap();
        let mut logger = logger(&dir);
        logger
            .record_start(&action(json!({"type": "goto", "url": "https://a.dev"})), 0)
            .unwrap();

        logger.emit_tracks().unwrap();

        let vtt = std::fs::read_to_string(logger.vtt_path()).unwrap();
        assert!(vtt.starts_with("WEBVTT"));
        let chapters = std::fs::read_to_string(logger.chapter_path()).unwrap();
        assert!(chapters.starts_with(";FFMETADATA1"));
    }

    #[test]
    fn finalize_writes_one_footer_and_refuses_to_repeat() {
        let dir = TempDir::new().unwrap();
        let mut logger = logger(&dir);
        logger
            .record_start(&action(json!({"type": "screenshot"})), 0)
            .unwrap();

        logger.finalize(65_002).unwrap();
        logger.finalize(99_999).unwrap();

        let content = std::fs::read_to_string(logger.log_path()).unwrap();
        assert_eq!(content.matches("Total duration:").count(), 1);
        assert!(content.contains("Total duration: 1m 5s 2ms"));
        assert_eq!(content.matches("Completed at:").count(), 1);
    }
}
