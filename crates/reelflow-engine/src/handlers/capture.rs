//! Screenshot handler.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use reelflow_protocols::action::ScreenshotAction;
use reelflow_protocols::{Action, ExecutionContext, HandlerError, SessionPage};

use crate::registry::ActionHandler;

/// Captures the current view or the full scrollable page.
///
/// Output resolution precedence: explicit `path` (absolute used verbatim,
/// relative reduced to its stem inside the batch screenshots directory) >
/// explicit `filename` > a generated timestamp-based name. Name collisions
/// are the caller's responsibility.
pub struct ScreenshotHandler;

pub(crate) fn resolve_screenshot_path(
    action: &ScreenshotAction,
    ctx: &ExecutionContext,
) -> PathBuf {
    if let Some(path) = &action.path {
        let path = Path::new(path);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "screenshot".to_string());
        return ctx.screenshots_dir().join(format!("{stem}.png"));
    }

    if let Some(filename) = &action.filename {
        return ctx.screenshots_dir().join(format!("{filename}.png"));
    }

    let stamp = chrono::Utc::now().timestamp_millis();
    ctx.screenshots_dir().join(format!("screenshot_{stamp}.png"))
}

#[async_trait]
impl ActionHandler for ScreenshotHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Screenshot(shot) = action else {
            return Err(HandlerError::UnexpectedPayload {
                expected: "screenshot",
            });
        };

        let path = resolve_screenshot_path(shot, ctx);
        page.screenshot(&path, shot.full_page.unwrap_or(false))
            .await?;
        debug!("screenshot captured to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockPage;
    use serde_json::json;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("/tmp/batch")
    }

    fn shot(raw: serde_json::Value) -> ScreenshotAction {
        let Action::Screenshot(shot) = serde_json::from_value(raw).unwrap() else {
            panic!("expected screenshot action");
        };
        shot
    }

    #[test]
    fn absolute_path_is_used_verbatim() {
        let action = shot(json!({"type": "screenshot", "path": "/var/shots/final.png"}));
        assert_eq!(
            resolve_screenshot_path(&action, &ctx()),
            PathBuf::from("/var/shots/final.png")
        );
    }

    #[test]
    fn relative_path_is_reduced_to_its_stem_inside_the_batch() {
        let action = shot(json!({"type": "screenshot", "path": "nested/dir/result.png"}));
        assert_eq!(
            resolve_screenshot_path(&action, &ctx()),
            PathBuf::from("/tmp/batch/screenshots/result.png")
        );
    }

    #[test]
    fn path_takes_precedence_over_filename() {
        let action = shot(json!({
            "type": "screenshot",
            "path": "/var/shots/a.png",
            "filename": "b"
        }));
        assert_eq!(
            resolve_screenshot_path(&action, &ctx()),
            PathBuf::from("/var/shots/a.png")
        );
    }

    #[test]
    fn filename_lands_in_the_screenshots_directory() {
        let action = shot(json!({"type": "screenshot", "filename": "landing"}));
        assert_eq!(
            resolve_screenshot_path(&action, &ctx()),
            PathBuf::from("/tmp/batch/screenshots/landing.png")
        );
    }

    #[test]
    fn generated_names_are_timestamped() {
        let action = shot(json!({"type": "screenshot"}));
        let path = resolve_screenshot_path(&action, &ctx());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".png"));
    }

    #[tokio::test]
    async fn full_page_flag_reaches_the_session() {
        let mut page = MockPage::new();
        page.expect_screenshot()
            .withf(|path, full_page| path.ends_with("whole.png") && *full_page)
            .times(1)
            .returning(|_, _| Ok(()));

        let action: Action = serde_json::from_value(
            json!({"type": "screenshot", "filename": "whole", "fullPage": true}),
        )
        .unwrap();
        ScreenshotHandler
            .execute(&action, &page, &ctx())
            .await
            .unwrap();
    }
}
