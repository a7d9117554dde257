//! Browser backend for reelflow.
//!
//! Drives a Chromium-family browser over the Chrome DevTools Protocol
//! (CDP): pure Rust, no Node.js sidecar.
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │ reelflow-engine │ ◄──────────────► │  Chromium        │
//! │  (via this      │       CDP        │  (launched with  │
//! │   crate)        │                  │   debug port)    │
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! The crate owns the browser process lifecycle ([`BrowserController`]),
//! one CDP connection ([`CdpClient`]), per-page sessions ([`PageSession`]),
//! screencast capture to a raw video file ([`ScreencastRecorder`]), and the
//! on-page overlay/notification injector ([`OverlayInjector`]).
//!
//! [`CdpPage`] adapts a page session to the `SessionPage` contract the
//! dispatch handlers execute against.

mod client;
mod controller;
mod error;
mod events;
mod overlay;
mod page;
mod protocol;
mod recorder;
mod session;

pub use client::CdpClient;
pub use controller::{BrowserController, DEFAULT_DEBUG_PORT};
pub use error::{BrowserError, CdpError};
pub use overlay::OverlayInjector;
pub use page::CdpPage;
pub use protocol::{Cookie, ScreencastFrame};
pub use recorder::ScreencastRecorder;
pub use session::PageSession;
