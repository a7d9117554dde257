//! Semantic validation of configuration values.

use crate::schema::RecordingConfig;

/// Check value ranges, collecting every defect as a `field: message` line.
pub fn validate_config(config: &RecordingConfig) -> Vec<String> {
    let mut issues = Vec::new();

    if config.browser.viewport.width == 0 {
        issues.push("browser.viewport.width: must be positive".to_string());
    }
    if config.browser.viewport.height == 0 {
        issues.push("browser.viewport.height: must be positive".to_string());
    }
    if config.browser.default_timeout == Some(0) {
        issues.push("browser.defaultTimeout: must be positive".to_string());
    }
    if config.browser.navigation_timeout == Some(0) {
        issues.push("browser.navigationTimeout: must be positive".to_string());
    }

    if config.video.size.width == 0 {
        issues.push("video.size.width: must be positive".to_string());
    }
    if config.video.size.height == 0 {
        issues.push("video.size.height: must be positive".to_string());
    }
    if config.video.fps == 0 {
        issues.push("video.fps: must be positive".to_string());
    } else if config.video.fps > 60 {
        issues.push("video.fps: must be 60 or lower".to_string());
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordingConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&RecordingConfig::default()).is_empty());
    }

    #[test]
    fn all_defects_are_collected() {
        let mut config = RecordingConfig::default();
        config.browser.viewport.width = 0;
        config.video.fps = 0;
        config.browser.default_timeout = Some(0);

        let issues = validate_config(&config);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().any(|i| i.contains("viewport.width")));
        assert!(issues.iter().any(|i| i.contains("fps")));
        assert!(issues.iter().any(|i| i.contains("defaultTimeout")));
    }

    #[test]
    fn fps_above_sixty_is_rejected() {
        let mut config = RecordingConfig::default();
        config.video.fps = 120;
        let issues = validate_config(&config);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("60 or lower"));
    }
}
