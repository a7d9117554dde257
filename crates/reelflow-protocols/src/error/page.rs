//! Page-session errors.

use thiserror::Error;

/// Failure of one page operation, as reported by the session backend.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
