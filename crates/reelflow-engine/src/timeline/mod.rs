//! The timeline: a time-correlated narrative of one run.
//!
//! Split into a pure core ([`Timeline`], no I/O, fully deterministic given
//! elapsed values) and an I/O shell ([`TimelineLogger`]) that owns the
//! on-disk artifacts. The cue and chapter tracks are derived projections of
//! the same entry list; they never feed back into it.

mod logger;
pub mod tracks;

pub use logger::TimelineLogger;

use reelflow_protocols::Action;

/// Whole-run track suppression, from the video configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackConfig {
    pub skip_all_cues: bool,
    pub skip_all_chapters: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Start,
    Error,
}

/// One timestamped record of an action's occurrence.
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    /// Milliseconds since the timeline origin (re-zeroed on the first
    /// navigation).
    pub elapsed_ms: u64,
    pub tag: &'static str,
    pub description: String,
    /// Wall-clock duration, annotated on completion.
    pub duration_ms: Option<u64>,
    pub kind: EntryKind,
    pub skip_cue: bool,
    pub skip_chapter: bool,
}

/// Append-only entry list with the elapsed-clock origin policy.
///
/// The origin starts at logger creation and is re-zeroed the first time a
/// navigation action is recorded, so the timeline aligns with recording
/// start rather than process start. After that reset the elapsed values are
/// monotonically non-decreasing.
#[derive(Debug)]
pub struct Timeline {
    config: TrackConfig,
    entries: Vec<TimelineEntry>,
    /// Raw elapsed value the origin was re-based to.
    origin_ms: u64,
    navigated: bool,
}

impl Timeline {
    pub fn new(config: TrackConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            origin_ms: 0,
            navigated: false,
        }
    }

    pub fn config(&self) -> TrackConfig {
        self.config
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Rebase a raw elapsed value onto the current origin.
    pub fn rebase(&self, raw_elapsed_ms: u64) -> u64 {
        raw_elapsed_ms.saturating_sub(self.origin_ms)
    }

    /// Record an action start at `raw_elapsed_ms` since timeline creation.
    /// Returns the entry's rebased elapsed value.
    pub fn record_start(&mut self, action: &Action, raw_elapsed_ms: u64) -> u64 {
        if !self.navigated && action.is_navigation() {
            self.origin_ms = raw_elapsed_ms;
            self.navigated = true;
        }

        let elapsed_ms = self.rebase(raw_elapsed_ms);
        self.entries.push(TimelineEntry {
            elapsed_ms,
            tag: action.tag(),
            description: action.label(),
            duration_ms: None,
            kind: EntryKind::Start,
            skip_cue: action.skip_cue(),
            skip_chapter: action.skip_chapter(),
        });
        elapsed_ms
    }

    /// Annotate the most recent entry with its actual duration.
    pub fn record_complete(&mut self, duration_ms: u64) {
        if let Some(last) = self.entries.last_mut() {
            last.duration_ms = Some(duration_ms);
        }
    }

    /// Append an error marker entry; prior entries are untouched.
    pub fn record_error(&mut self, action: &Action, raw_elapsed_ms: u64, message: &str) {
        let elapsed_ms = self.rebase(raw_elapsed_ms);
        self.entries.push(TimelineEntry {
            elapsed_ms,
            tag: action.tag(),
            description: message.to_string(),
            duration_ms: None,
            kind: EntryKind::Error,
            skip_cue: true,
            skip_chapter: true,
        });
    }
}
