//! Configuration loading.
//!
//! Global precedence: `recording-config.json`, then
//! `recording-config.default.json`, then built-in defaults. Per-workflow
//! overrides live at `workflows/<name>/config.json` and are optional.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;
use crate::schema::{RecordingConfig, WorkflowOverrides};
use crate::validate::validate_config;

pub const GLOBAL_CONFIG_FILE: &str = "recording-config.json";
pub const DEFAULT_CONFIG_FILE: &str = "recording-config.default.json";

/// Loads and schema-checks configuration files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the global configuration, walking the precedence chain rooted
    /// at `root` (usually the working directory).
    pub fn load_global(root: &Path) -> Result<RecordingConfig, ConfigError> {
        for candidate in [GLOBAL_CONFIG_FILE, DEFAULT_CONFIG_FILE] {
            let path = root.join(candidate);
            if path.exists() {
                debug!(path = %path.display(), "loading global config");
                return Self::load_global_file(&path);
            }
        }
        debug!("no config files found, using built-in defaults");
        Ok(RecordingConfig::default())
    }

    /// Load one specific global config file.
    pub fn load_global_file(path: &Path) -> Result<RecordingConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RecordingConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let issues = validate_config(&config);
        if !issues.is_empty() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                details: issues.join(", "),
            });
        }
        Ok(config)
    }

    /// Load a workflow's override file if it exists.
    pub fn load_workflow_overrides(
        root: &Path,
        workflow: &str,
    ) -> Result<Option<WorkflowOverrides>, ConfigError> {
        let path = Self::workflow_config_path(root, workflow);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let overrides: WorkflowOverrides =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "loaded workflow config overrides");
        Ok(Some(overrides))
    }

    pub fn workflow_config_path(root: &Path, workflow: &str) -> PathBuf {
        root.join("workflows").join(workflow).join("config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, content: &str) {
        fs::write(root.join(name), content).unwrap();
    }

    #[test]
    fn missing_files_fall_back_to_builtin_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_global(dir.path()).unwrap();
        assert_eq!(config, RecordingConfig::default());
    }

    #[test]
    fn user_config_wins_over_default_file() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            GLOBAL_CONFIG_FILE,
            r#"{"browser":{"headless":true,"slowMo":0,"viewport":{"width":800,"height":600}},
                "video":{"size":{"width":800,"height":600},"fps":24}}"#,
        );
        write(
            dir.path(),
            DEFAULT_CONFIG_FILE,
            r#"{"browser":{"headless":false,"slowMo":0,"viewport":{"width":1,"height":1}},
                "video":{"size":{"width":1,"height":1},"fps":1}}"#,
        );

        let config = ConfigLoader::load_global(dir.path()).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.video.fps, 24);
    }

    #[test]
    fn malformed_json_is_a_parse_error_with_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), GLOBAL_CONFIG_FILE, "{not json");

        let err = ConfigLoader::load_global(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(GLOBAL_CONFIG_FILE));
    }

    #[test]
    fn schema_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            GLOBAL_CONFIG_FILE,
            r#"{"browser":{"headless":false,"slowMo":0,"viewport":{"width":1920,"height":1080}},
                "video":{"size":{"width":1920,"height":1080},"fps":0}}"#,
        );

        let err = ConfigLoader::load_global(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("fps"));
    }

    #[test]
    fn workflow_overrides_are_optional() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigLoader::load_workflow_overrides(dir.path(), "demo")
            .unwrap()
            .is_none());

        let workflow_dir = dir.path().join("workflows/demo");
        fs::create_dir_all(&workflow_dir).unwrap();
        fs::write(
            workflow_dir.join("config.json"),
            r#"{"browser":{"headless":true}}"#,
        )
        .unwrap();

        let overrides = ConfigLoader::load_workflow_overrides(dir.path(), "demo")
            .unwrap()
            .unwrap();
        assert_eq!(overrides.browser.unwrap().headless, Some(true));
    }
}
