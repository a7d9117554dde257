//! Global/workflow configuration merge.
//!
//! Workflow values override global values field-by-field: shallow per
//! top-level key, with `viewport` and `size` merged one level deeper.
//! Unspecified workflow fields inherit the global value.

use crate::schema::{Dimensions, DimensionsOverride, RecordingConfig, WorkflowOverrides};

/// Apply a workflow's overrides on top of the global configuration.
pub fn merge_configs(
    global: &RecordingConfig,
    overrides: Option<&WorkflowOverrides>,
) -> RecordingConfig {
    let Some(overrides) = overrides else {
        return global.clone();
    };

    let mut merged = global.clone();

    if let Some(browser) = &overrides.browser {
        if let Some(headless) = browser.headless {
            merged.browser.headless = headless;
        }
        if let Some(slow_mo) = browser.slow_mo {
            merged.browser.slow_mo = slow_mo;
        }
        if let Some(viewport) = &browser.viewport {
            merged.browser.viewport = merge_dimensions(merged.browser.viewport, viewport);
        }
        if let Some(timeout) = browser.default_timeout {
            merged.browser.default_timeout = Some(timeout);
        }
        if let Some(timeout) = browser.navigation_timeout {
            merged.browser.navigation_timeout = Some(timeout);
        }
    }

    if let Some(video) = &overrides.video {
        if let Some(size) = &video.size {
            merged.video.size = merge_dimensions(merged.video.size, size);
        }
        if let Some(fps) = video.fps {
            merged.video.fps = fps;
        }
        if let Some(skip) = video.skip_all_vtt {
            merged.video.skip_all_vtt = Some(skip);
        }
        if let Some(skip) = video.skip_all_chapters {
            merged.video.skip_all_chapters = Some(skip);
        }
    }

    merged
}

fn merge_dimensions(base: Dimensions, overrides: &DimensionsOverride) -> Dimensions {
    Dimensions {
        width: overrides.width.unwrap_or(base.width),
        height: overrides.height.unwrap_or(base.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BrowserOverrides, VideoOverrides};

    #[test]
    fn no_overrides_returns_global_unchanged() {
        let global = RecordingConfig::default();
        assert_eq!(merge_configs(&global, None), global);
    }

    #[test]
    fn viewport_merges_one_level_deeper() {
        // Global headless=false + 1920x1080; the workflow sets only
        // viewport.width=1280, so height must inherit.
        let mut global = RecordingConfig::default();
        global.browser.headless = false;
        global.browser.viewport = Dimensions {
            width: 1920,
            height: 1080,
        };

        let overrides = WorkflowOverrides {
            browser: Some(BrowserOverrides {
                viewport: Some(DimensionsOverride {
                    width: Some(1280),
                    height: None,
                }),
                ..Default::default()
            }),
            video: None,
        };

        let merged = merge_configs(&global, Some(&overrides));
        assert!(!merged.browser.headless);
        assert_eq!(merged.browser.viewport.width, 1280);
        assert_eq!(merged.browser.viewport.height, 1080);
    }

    #[test]
    fn scalar_overrides_replace_and_others_inherit() {
        let global = RecordingConfig::default();
        let overrides = WorkflowOverrides {
            browser: Some(BrowserOverrides {
                headless: Some(true),
                navigation_timeout: Some(10_000),
                ..Default::default()
            }),
            video: Some(VideoOverrides {
                fps: Some(24),
                skip_all_chapters: Some(true),
                ..Default::default()
            }),
        };

        let merged = merge_configs(&global, Some(&overrides));
        assert!(merged.browser.headless);
        assert_eq!(merged.browser.navigation_timeout, Some(10_000));
        assert_eq!(merged.browser.default_timeout, Some(30_000));
        assert_eq!(merged.video.fps, 24);
        assert_eq!(merged.video.skip_all_chapters, Some(true));
        assert_eq!(merged.video.size, global.video.size);
    }

    #[test]
    fn empty_override_sections_change_nothing() {
        let global = RecordingConfig::default();
        let overrides = WorkflowOverrides {
            browser: Some(BrowserOverrides::default()),
            video: Some(VideoOverrides::default()),
        };
        assert_eq!(merge_configs(&global, Some(&overrides)), global);
    }
}
