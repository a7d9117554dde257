//! Per-page event routing.
//!
//! The CDP client delivers every event for a session into one channel; this
//! router fans it out to the two consumers reelflow has: navigation waits
//! (network-idle lifecycle events) and the screencast recorder.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::trace;

use crate::protocol::{CdpMessage, LifecycleEvent, ScreencastFrame};

/// Routes a session's raw CDP events.
///
/// Network-idle lifecycle events bump a generation counter observable
/// through a watch channel; screencast frames are forwarded to whichever
/// sink is currently installed (frames are dropped when no recorder is
/// attached).
pub(crate) struct PageEventRouter {
    network_idle: watch::Receiver<u64>,
    frame_sink: Arc<Mutex<Option<mpsc::UnboundedSender<ScreencastFrame>>>>,
    task: tokio::task::JoinHandle<()>,
}

impl PageEventRouter {
    pub fn spawn(mut events: mpsc::UnboundedReceiver<CdpMessage>) -> Self {
        let (idle_tx, idle_rx) = watch::channel(0u64);
        let frame_sink: Arc<Mutex<Option<mpsc::UnboundedSender<ScreencastFrame>>>> =
            Arc::new(Mutex::new(None));

        let sink = frame_sink.clone();
        let task = tokio::spawn(async move {
            while let Some(message) = events.recv().await {
                let Some(method) = message.method.as_deref() else {
                    continue;
                };
                match method {
                    "Page.lifecycleEvent" => {
                        let Some(params) = message.params else {
                            continue;
                        };
                        if let Ok(event) = serde_json::from_value::<LifecycleEvent>(params) {
                            trace!(name = %event.name, "lifecycle event");
                            if event.name == "networkIdle" {
                                idle_tx.send_modify(|generation| *generation += 1);
                            }
                        }
                    }
                    "Page.screencastFrame" => {
                        let Some(params) = message.params else {
                            continue;
                        };
                        if let Ok(frame) = serde_json::from_value::<ScreencastFrame>(params) {
                            if let Some(tx) = sink.lock().as_ref() {
                                let _ = tx.send(frame);
                            }
                        }
                    }
                    _ => {}
                }
            }
        });

        Self {
            network_idle: idle_rx,
            frame_sink,
            task,
        }
    }

    /// A watch over the network-idle generation counter. Snapshot the value
    /// before navigating, then wait for it to advance.
    pub fn network_idle(&self) -> watch::Receiver<u64> {
        self.network_idle.clone()
    }

    /// Install the screencast frame sink; replaces any previous one.
    pub fn set_frame_sink(&self, tx: mpsc::UnboundedSender<ScreencastFrame>) {
        *self.frame_sink.lock() = Some(tx);
    }

    /// Remove the screencast frame sink; subsequent frames are dropped.
    pub fn clear_frame_sink(&self) {
        *self.frame_sink.lock() = None;
    }
}

impl Drop for PageEventRouter {
    fn drop(&mut self) {
        self.task.abort();
    }
}
