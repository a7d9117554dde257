//! Wait handlers.

use std::time::Duration;

use async_trait::async_trait;

use reelflow_protocols::{Action, ExecutionContext, HandlerError, SessionPage};

use crate::registry::ActionHandler;

/// Blocks until a selector becomes visible. No polling interval is exposed;
/// the wait is the session's native primitive under its default timeout.
pub struct WaitForSelectorHandler;

#[async_trait]
impl ActionHandler for WaitForSelectorHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::WaitForSelector(wait) = action else {
            return Err(HandlerError::UnexpectedPayload {
                expected: "waitForSelector",
            });
        };
        page.wait_for_selector(&wait.selector, None).await?;
        Ok(())
    }
}

/// Blocks for a fixed number of milliseconds with no side effect.
pub struct WaitForTimeoutHandler;

#[async_trait]
impl ActionHandler for WaitForTimeoutHandler {
    async fn execute(
        &self,
        action: &Action,
        _page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::WaitForTimeout(wait) = action else {
            return Err(HandlerError::UnexpectedPayload {
                expected: "waitForTimeout",
            });
        };
        tokio::time::sleep(Duration::from_millis(wait.timeout)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockPage;
    use serde_json::json;

    #[tokio::test]
    async fn wait_for_selector_delegates_to_the_session_wait() {
        let mut page = MockPage::new();
        page.expect_wait_for_selector()
            .withf(|s, timeout| s == ".ready" && timeout.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        let action: Action =
            serde_json::from_value(json!({"type": "waitForSelector", "selector": ".ready"}))
                .unwrap();
        WaitForSelectorHandler
            .execute(&action, &page, &ExecutionContext::new("/tmp/out"))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_timeout_sleeps_without_touching_the_session() {
        // MockPage with no expectations panics on any call.
        let page = MockPage::new();
        let action: Action =
            serde_json::from_value(json!({"type": "waitForTimeout", "timeout": 1500})).unwrap();

        let started = tokio::time::Instant::now();
        WaitForTimeoutHandler
            .execute(&action, &page, &ExecutionContext::new("/tmp/out"))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }
}
