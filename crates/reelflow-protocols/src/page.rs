//! The page-session contract.
//!
//! The browser-automation engine is an external collaborator; this trait is
//! the narrow seam the dispatch handlers talk through. The CDP-backed
//! implementation lives in `reelflow-browser`; tests substitute a mock.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PageError;

/// Placement of an injected on-page notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessagePosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Center,
}

/// Severity styling of an injected on-page notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStyle {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

/// Options for an injected on-page notification or gate overlay.
#[derive(Debug, Clone)]
pub struct MessageOptions {
    pub message: String,
    pub title: Option<String>,
    pub position: Option<MessagePosition>,
    /// Milliseconds before auto-removal; 0 keeps the overlay up until it is
    /// dismissed or removed explicitly.
    pub duration_ms: u64,
    pub style: MessageStyle,
    pub close_button: bool,
    pub backdrop: bool,
    pub progress: bool,
}

impl MessageOptions {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            title: None,
            position: None,
            duration_ms: 5000,
            style: MessageStyle::Info,
            close_button: true,
            backdrop: false,
            progress: false,
        }
    }
}

/// A live, stateful browser page driven by exactly one workflow run.
///
/// Operational policy is fixed by the implementation: `navigate` returns
/// only once the page reports network-idle (bounded by the configured
/// navigation timeout), element operations fail if the target is not
/// actionable within the default timeout, and `evaluate` runs the script
/// verbatim — the workflow author is trusted.
#[async_trait]
pub trait SessionPage: Send + Sync {
    /// Navigate and wait for network-idle.
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// Click the element matching a CSS selector.
    async fn click(&self, selector: &str) -> Result<(), PageError>;

    /// Replace field content atomically (clear, then set).
    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError>;

    /// Append text key-by-key with `delay_ms` between keystrokes.
    async fn type_text(&self, selector: &str, text: &str, delay_ms: u64) -> Result<(), PageError>;

    /// Send one synthetic key event (e.g. "Enter", "Tab", "ArrowDown").
    async fn press_key(&self, key: &str) -> Result<(), PageError>;

    /// Hover over the element matching a CSS selector.
    async fn hover(&self, selector: &str) -> Result<(), PageError>;

    /// Put a checkbox/radio into the requested state.
    async fn set_checked(&self, selector: &str, checked: bool) -> Result<(), PageError>;

    /// Select option values in a `<select>` element.
    async fn select_option(&self, selector: &str, values: &[String]) -> Result<(), PageError>;

    /// Block until the selector is visible; `None` uses the session default
    /// timeout.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout_ms: Option<u64>,
    ) -> Result<(), PageError>;

    /// Block until the page's visible text contains the substring.
    async fn wait_for_text(&self, text: &str, timeout_ms: u64) -> Result<(), PageError>;

    /// Evaluate a script verbatim and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<Value, PageError>;

    /// Capture the current view (or the full scrollable page) to a file.
    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), PageError>;

    /// Inject a transient styled notification.
    async fn show_message(&self, options: &MessageOptions) -> Result<(), PageError>;

    /// Remove any injected overlay and backdrop.
    async fn remove_overlay(&self) -> Result<(), PageError>;

    /// Close the page, flushing any in-progress capture.
    async fn close(&self) -> Result<(), PageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_use_kebab_case_wire_names() {
        let pos: MessagePosition = serde_json::from_str("\"bottom-right\"").unwrap();
        assert_eq!(pos, MessagePosition::BottomRight);
        assert_eq!(
            serde_json::to_string(&MessagePosition::TopCenter).unwrap(),
            "\"top-center\""
        );
    }

    #[test]
    fn style_defaults_to_info() {
        assert_eq!(MessageStyle::default(), MessageStyle::Info);
        let style: MessageStyle = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(style, MessageStyle::Warning);
    }

    #[test]
    fn message_options_defaults() {
        let opts = MessageOptions::new("hello");
        assert_eq!(opts.duration_ms, 5000);
        assert!(opts.close_button);
        assert!(!opts.backdrop);
    }
}
