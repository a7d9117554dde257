//! Video encoding: the external ffmpeg step.
//!
//! Two passes: transcode the raw capture to H.264 MP4, then remux the
//! chapter metadata in. Failures downgrade, never lose material: a failed
//! transcode keeps the raw capture as the artifact, a failed chapter pass
//! keeps the chapterless MP4.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

use crate::storage;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("ffmpeg executable not found; install ffmpeg for video encoding")]
    FfmpegMissing,

    #[error("failed to spawn ffmpeg: {0}")]
    Spawn(std::io::Error),

    #[error("ffmpeg exited with {status}: {stderr_tail}")]
    Failed {
        status: std::process::ExitStatus,
        stderr_tail: String,
    },

    #[error(transparent)]
    Storage(#[from] reelflow_protocols::StorageError),
}

/// Invokes ffmpeg to produce the distribution artifact.
pub struct VideoEncoder;

impl VideoEncoder {
    /// Transcode `capture` to `output_mp4`, attach chapters when available,
    /// and delete the raw capture on success.
    ///
    /// Returns the artifact path: the MP4 on success, the preserved raw
    /// capture when encoding fails.
    pub async fn convert_and_cleanup(
        capture: &Path,
        output_mp4: &Path,
        chapter_file: Option<&Path>,
    ) -> PathBuf {
        match Self::convert(capture, output_mp4, chapter_file).await {
            Ok(()) => {
                if let Err(e) = storage::remove_file(capture) {
                    warn!("failed to delete raw capture: {e}");
                }
                output_mp4.to_path_buf()
            }
            Err(e) => {
                warn!("video encoding failed, keeping raw capture: {e}");
                capture.to_path_buf()
            }
        }
    }

    async fn convert(
        capture: &Path,
        output_mp4: &Path,
        chapter_file: Option<&Path>,
    ) -> Result<(), EncodeError> {
        run_ffmpeg(&transcode_args(capture, output_mp4)).await?;
        info!("video transcoded to {}", output_mp4.display());

        let Some(chapters) = chapter_file.filter(|p| p.exists()) else {
            return Ok(());
        };

        // Chapters go in via a second remux pass; losing them is not worth
        // losing the video.
        let temp = temp_output(output_mp4);
        match run_ffmpeg(&chapter_args(output_mp4, chapters, &temp)).await {
            Ok(()) => {
                storage::remove_file(output_mp4)?;
                storage::copy_file(&temp, output_mp4)?;
                storage::remove_file(&temp)?;
                info!("chapters attached from {}", chapters.display());
            }
            Err(e) => {
                warn!("failed to attach chapters, keeping video without them: {e}");
                let _ = storage::remove_file(&temp);
            }
        }
        Ok(())
    }
}

fn temp_output(output: &Path) -> PathBuf {
    output.with_extension("tmp.mp4")
}

/// Pass 1: capture -> H.264/AAC MP4.
fn transcode_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "fast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "128k".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Pass 2: remux with the ffmetadata chapter track attached.
fn chapter_args(input: &Path, chapters: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-i".to_string(),
        chapters.to_string_lossy().into_owned(),
        "-map".to_string(),
        "0".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-map_metadata".to_string(),
        "0".to_string(),
        "-map_chapters".to_string(),
        "1".to_string(),
        "-movflags".to_string(),
        "use_metadata_tags".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

async fn run_ffmpeg(args: &[String]) -> Result<(), EncodeError> {
    let output = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EncodeError::FfmpegMissing
            } else {
                EncodeError::Spawn(e)
            }
        })?;

    if !output.status.success() {
        let text = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = text.lines().rev().take(5).collect();
        return Err(EncodeError::Failed {
            status: output.status,
            stderr_tail: tail.into_iter().rev().collect::<Vec<_>>().join(" | "),
        });
    }
    Ok(())
}
