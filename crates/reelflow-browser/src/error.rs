//! Browser-layer errors.

use thiserror::Error;

/// Errors raised by the CDP transport and page sessions.
#[derive(Debug, Error)]
pub enum CdpError {
    #[error("browser not reachable at {0}")]
    BrowserNotAvailable(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("CDP protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("invalid CDP response: {0}")]
    InvalidResponse(String),

    #[error("session closed")]
    SessionClosed,

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the browser process lifecycle and capture.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no Chromium-family browser found; install Chrome or Chromium")]
    BrowserNotFound,

    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("browser not connected")]
    NotConnected,

    #[error("capture failed: {0}")]
    Capture(String),

    #[error(transparent)]
    Cdp(#[from] CdpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_names_code_and_message() {
        let err = CdpError::Protocol {
            code: -32000,
            message: "node not found".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("-32000"));
        assert!(text.contains("node not found"));
    }

    #[test]
    fn browser_error_wraps_cdp() {
        let err: BrowserError = CdpError::SessionClosed.into();
        assert!(err.to_string().contains("session closed"));
    }
}
