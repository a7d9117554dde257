//! Derived tracks: subtitle cues and chapter metadata.
//!
//! Both are deterministic read-only projections of the timeline entry list.
//! Cues span a fixed 3000ms window; chapter N ends where chapter N+1 starts
//! and the final chapter is open-ended. Entries that opted out (and error
//! markers) are excluded.

use thiserror::Error;

use super::{EntryKind, Timeline};

/// Display window of one subtitle cue.
pub const CUE_WINDOW_MS: u64 = 3000;

/// A time-windowed caption, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// A named section of the output video, `[start, next_start)`; the last
/// chapter has no end bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub start_ms: u64,
    pub end_ms: Option<u64>,
    pub title: String,
}

/// Project the cue track out of the timeline.
pub fn derive_cues(timeline: &Timeline) -> Vec<Cue> {
    if timeline.config().skip_all_cues {
        return Vec::new();
    }
    timeline
        .entries()
        .iter()
        .filter(|e| e.kind == EntryKind::Start && !e.skip_cue)
        .map(|e| Cue {
            start_ms: e.elapsed_ms,
            end_ms: e.elapsed_ms + CUE_WINDOW_MS,
            text: e.description.clone(),
        })
        .collect()
}

/// Project the chapter track out of the timeline.
pub fn derive_chapters(timeline: &Timeline) -> Vec<Chapter> {
    if timeline.config().skip_all_chapters {
        return Vec::new();
    }
    let starts: Vec<(u64, &str)> = timeline
        .entries()
        .iter()
        .filter(|e| e.kind == EntryKind::Start && !e.skip_chapter)
        .map(|e| (e.elapsed_ms, e.description.as_str()))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, (start_ms, title))| Chapter {
            start_ms: *start_ms,
            end_ms: starts.get(i + 1).map(|(next, _)| *next),
            title: (*title).to_string(),
        })
        .collect()
}

/// Render the WebVTT cue file.
pub fn render_vtt(cues: &[Cue]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_vtt_timestamp(cue.start_ms),
            format_vtt_timestamp(cue.end_ms),
            cue.text
        ));
    }
    out
}

/// Render the ffmetadata chapter file.
pub fn render_chapters(chapters: &[Chapter]) -> String {
    let mut out = String::from(";FFMETADATA1\n");
    for chapter in chapters {
        out.push_str("\n[CHAPTER]\nTIMEBASE=1/1000\n");
        out.push_str(&format!("START={}\n", chapter.start_ms));
        if let Some(end) = chapter.end_ms {
            out.push_str(&format!("END={end}\n"));
        }
        out.push_str(&format!("title={}\n", chapter.title));
    }
    out
}

#[derive(Debug, Error)]
pub enum ChapterParseError {
    #[error("missing ffmetadata header")]
    MissingHeader,
    #[error("chapter {0} has no START")]
    MissingStart(usize),
    #[error("invalid value in chapter {0}: {1}")]
    InvalidValue(usize, String),
}

/// Parse a chapter file back into its windows and titles. Round-trips with
/// [`render_chapters`].
pub fn parse_chapters(content: &str) -> Result<Vec<Chapter>, ChapterParseError> {
    let mut lines = content.lines();
    if lines.next().map(str::trim) != Some(";FFMETADATA1") {
        return Err(ChapterParseError::MissingHeader);
    }

    let mut chapters = Vec::new();
    let mut current: Option<(Option<u64>, Option<u64>, Option<String>)> = None;

    fn flush(
        chapters: &mut Vec<Chapter>,
        current: Option<(Option<u64>, Option<u64>, Option<String>)>,
    ) -> Result<(), ChapterParseError> {
        if let Some((start, end, title)) = current {
            let index = chapters.len();
            let start = start.ok_or(ChapterParseError::MissingStart(index))?;
            chapters.push(Chapter {
                start_ms: start,
                end_ms: end,
                title: title.unwrap_or_default(),
            });
        }
        Ok(())
    }

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "[CHAPTER]" {
            flush(&mut chapters, current.take())?;
            current = Some((None, None, None));
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(chapter) = current.as_mut() else {
            continue;
        };
        let index = chapters.len();
        match key {
            "START" => {
                chapter.0 = Some(value.parse().map_err(|_| {
                    ChapterParseError::InvalidValue(index, format!("START={value}"))
                })?);
            }
            "END" => {
                chapter.1 = Some(value.parse().map_err(|_| {
                    ChapterParseError::InvalidValue(index, format!("END={value}"))
                })?);
            }
            "title" => chapter.2 = Some(value.to_string()),
            _ => {}
        }
    }
    flush(&mut chapters, current)?;

    Ok(chapters)
}

/// `HH:MM:SS.mmm`, for VTT cue timestamps.
pub fn format_vtt_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{:03}", ms % 1000)
}

/// `MM:SS.mmm`, for the plain-text timecode log.
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}.{:03}", ms % 1000)
}

/// Human-readable total duration for the log footer.
pub fn format_duration_human(ms: u64) -> String {
    let seconds = ms / 1000;
    let rem_ms = ms % 1000;
    if seconds >= 60 {
        format!("{}m {}s {}ms", seconds / 60, seconds % 60, rem_ms)
    } else {
        format!("{seconds}s {rem_ms}ms")
    }
}
