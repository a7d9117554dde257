//! Configuration for reelflow.
//!
//! Two JSON files feed a run: the global `recording-config.json` (with a
//! `.default` fallback and built-in defaults) and an optional per-workflow
//! `config.json` that overrides it field-by-field. Malformed or
//! schema-invalid files abort before any browser session is opened.

mod error;
mod loader;
mod merge;
mod schema;
mod validate;

pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE, GLOBAL_CONFIG_FILE};
pub use merge::merge_configs;
pub use schema::{
    BrowserConfig, BrowserOverrides, Dimensions, DimensionsOverride, RecordingConfig, VideoConfig,
    VideoOverrides, WorkflowOverrides,
};
pub use validate::validate_config;
