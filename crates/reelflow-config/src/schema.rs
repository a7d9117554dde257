//! Configuration schema.

use serde::{Deserialize, Serialize};

/// Width/height pair used for both the viewport and the video size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Browser-session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    pub headless: bool,
    /// Extra delay in milliseconds after each input operation, for
    /// followable recordings.
    #[serde(default)]
    pub slow_mo: u64,
    pub viewport: Dimensions,
    /// Default timeout for element operations, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_timeout: Option<u64>,
    /// Timeout for navigations, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_timeout: Option<u64>,
}

/// Video capture and encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
    pub size: Dimensions,
    pub fps: u32,
    /// Suppress the subtitle-cue track for the whole run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_all_vtt: Option<bool>,
    /// Suppress the chapter track for the whole run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_all_chapters: Option<bool>,
}

/// The global configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    pub browser: BrowserConfig,
    pub video: VideoConfig,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            browser: BrowserConfig {
                headless: false,
                slow_mo: 0,
                viewport: Dimensions {
                    width: 1920,
                    height: 1080,
                },
                default_timeout: Some(30_000),
                navigation_timeout: Some(30_000),
            },
            video: VideoConfig {
                size: Dimensions {
                    width: 1920,
                    height: 1080,
                },
                fps: 30,
                skip_all_vtt: None,
                skip_all_chapters: None,
            },
        }
    }
}

/// Partial width/height override; unspecified axes inherit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Per-workflow browser overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow_mo: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<DimensionsOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_timeout: Option<u64>,
}

/// Per-workflow video overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<DimensionsOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_all_vtt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_all_chapters: Option<bool>,
}

/// A workflow's optional sibling configuration file: every field optional,
/// overriding the global value where present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoOverrides>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_builtins() {
        let config = RecordingConfig::default();
        assert!(!config.browser.headless);
        assert_eq!(config.browser.viewport.width, 1920);
        assert_eq!(config.browser.default_timeout, Some(30_000));
        assert_eq!(config.video.fps, 30);
    }

    #[test]
    fn global_config_parses_camel_case() {
        let raw = json!({
            "browser": {
                "headless": true,
                "slowMo": 100,
                "viewport": {"width": 1280, "height": 720},
                "navigationTimeout": 15000
            },
            "video": {"size": {"width": 1280, "height": 720}, "fps": 25}
        });
        let config: RecordingConfig = serde_json::from_value(raw).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.slow_mo, 100);
        assert_eq!(config.browser.navigation_timeout, Some(15_000));
        assert_eq!(config.browser.default_timeout, None);
        assert_eq!(config.video.fps, 25);
    }

    #[test]
    fn overrides_parse_partially() {
        let raw = json!({"browser": {"viewport": {"width": 1280}}});
        let overrides: WorkflowOverrides = serde_json::from_value(raw).unwrap();
        let browser = overrides.browser.unwrap();
        assert_eq!(browser.viewport.unwrap().width, Some(1280));
        assert_eq!(browser.viewport.unwrap().height, None);
        assert!(overrides.video.is_none());
    }
}
