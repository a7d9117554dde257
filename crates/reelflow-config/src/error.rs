//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// A malformed or schema-invalid configuration file. Raised before any
/// browser session is opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {}: {details}", path.display())]
    Invalid { path: PathBuf, details: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_offending_path() {
        let err = ConfigError::Invalid {
            path: PathBuf::from("recording-config.json"),
            details: "video.fps: must be positive".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("recording-config.json"));
        assert!(text.contains("video.fps"));
    }
}
