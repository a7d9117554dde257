//! Screencast capture.
//!
//! Receives `Page.screencastFrame` events, acknowledges each one, and feeds
//! the JPEG frames into an ffmpeg `image2pipe` process at a constant frame
//! rate (repeating the latest frame between screencast updates), producing
//! the raw `capture.webm` the encoder later remuxes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use reelflow_config::Dimensions;

use crate::error::BrowserError;
use crate::session::PageSession;

/// An in-progress screencast capture bound to one page session.
pub struct ScreencastRecorder {
    session: Arc<PageSession>,
    output: PathBuf,
    child: Child,
    writer: tokio::task::JoinHandle<Result<(), BrowserError>>,
}

impl ScreencastRecorder {
    /// Start capturing `session` into `output` (a .webm path).
    pub async fn start(
        session: Arc<PageSession>,
        output: PathBuf,
        size: Dimensions,
        fps: u32,
    ) -> Result<Self, BrowserError> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BrowserError::Io)?;
        }

        let args = ffmpeg_capture_args(size, fps, &output);
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BrowserError::Capture(
                        "ffmpeg executable not found; install ffmpeg for video capture"
                            .to_string(),
                    )
                } else {
                    BrowserError::Capture(format!("failed to spawn ffmpeg: {e}"))
                }
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| BrowserError::Capture("failed to open ffmpeg stdin".to_string()))?;

        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();
        session.set_frame_sink(frame_tx);
        session
            .start_screencast(size.width, size.height)
            .await
            .map_err(BrowserError::Cdp)?;

        let writer_session = session.clone();
        let writer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval(fps));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut latest: Option<Vec<u8>> = None;

            loop {
                tokio::select! {
                    frame = frame_rx.recv() => match frame {
                        Some(frame) => {
                            if let Err(e) =
                                writer_session.ack_screencast_frame(frame.session_id).await
                            {
                                warn!("screencast ack failed: {e}");
                            }
                            match base64::engine::general_purpose::STANDARD.decode(&frame.data) {
                                Ok(bytes) => latest = Some(bytes),
                                Err(e) => warn!("dropping undecodable frame: {e}"),
                            }
                        }
                        // Sink cleared: flush the tail and stop.
                        None => break,
                    },
                    _ = ticker.tick() => {
                        if let Some(bytes) = &latest {
                            stdin
                                .write_all(bytes)
                                .await
                                .map_err(|e| BrowserError::Capture(
                                    format!("failed to write frame to ffmpeg: {e}"),
                                ))?;
                        }
                    }
                }
            }

            stdin
                .flush()
                .await
                .map_err(|e| BrowserError::Capture(format!("failed to flush ffmpeg: {e}")))?;
            drop(stdin);
            Ok(())
        });

        debug!("screencast capture started -> {}", output.display());
        Ok(Self {
            session,
            output,
            child,
            writer,
        })
    }

    /// Stop the screencast and finalize the capture file.
    pub async fn stop(self) -> Result<PathBuf, BrowserError> {
        if let Err(e) = self.session.stop_screencast().await {
            // The page may already be closed; the capture is still usable.
            debug!("stop_screencast: {e}");
        }
        self.session.clear_frame_sink();

        self.writer
            .await
            .map_err(|e| BrowserError::Capture(format!("capture writer panicked: {e}")))??;

        let output = self
            .child
            .wait_with_output()
            .await
            .map_err(|e| BrowserError::Capture(format!("failed waiting for ffmpeg: {e}")))?;
        if !output.status.success() {
            return Err(BrowserError::Capture(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        debug!("capture finalized at {}", self.output.display());
        Ok(self.output)
    }
}

fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1) as f64)
}

/// ffmpeg arguments for the raw capture: JPEG frames on stdin, VP8 webm out.
fn ffmpeg_capture_args(size: Dimensions, fps: u32, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-f".to_string(),
        "image2pipe".to_string(),
        "-framerate".to_string(),
        fps.to_string(),
        "-i".to_string(),
        "-".to_string(),
        "-vf".to_string(),
        format!("scale={}:{}", size.width, size.height),
        "-c:v".to_string(),
        "libvpx".to_string(),
        "-b:v".to_string(),
        "2M".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let tail: Vec<&str> = text.lines().rev().take(5).collect();
    tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
}
