//! On-page notification handler.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use reelflow_protocols::page::MessageOptions;
use reelflow_protocols::{Action, ExecutionContext, HandlerError, SessionPage};

use crate::registry::ActionHandler;

/// Hard ceiling on the blocking `waitForClose` variant.
const CLOSE_WAIT_CEILING: Duration = Duration::from_secs(300);
const CLOSE_POLL: Duration = Duration::from_millis(250);

/// Injects a transient styled notification. With `duration == 0` and
/// `waitForClose`, blocks until the operator dismisses it, bounded by a
/// five-minute ceiling.
pub struct ShowMessageHandler;

#[async_trait]
impl ActionHandler for ShowMessageHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::ShowMessage(message) = action else {
            return Err(HandlerError::UnexpectedPayload {
                expected: "showMessage",
            });
        };

        let options = MessageOptions {
            message: message.message.clone(),
            title: None,
            position: message.position,
            duration_ms: message.duration.unwrap_or(5000),
            style: message.style.unwrap_or_default(),
            close_button: message.close_button != Some(false),
            backdrop: false,
            progress: false,
        };
        page.show_message(&options).await?;

        if message.wait_for_close == Some(true) && options.duration_ms == 0 {
            let started = Instant::now();
            loop {
                let gone = page
                    .evaluate("document.querySelector('.reelflow-overlay') === null")
                    .await?;
                if gone.as_bool().unwrap_or(false) {
                    break;
                }
                if started.elapsed() >= CLOSE_WAIT_CEILING {
                    return Err(HandlerError::MessageNotClosed {
                        elapsed_secs: CLOSE_WAIT_CEILING.as_secs(),
                    });
                }
                tokio::time::sleep(CLOSE_POLL).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockPage;
    use reelflow_protocols::page::MessageStyle;
    use serde_json::json;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("/tmp/out")
    }

    #[tokio::test]
    async fn defaults_are_applied_to_the_injected_options() {
        let mut page = MockPage::new();
        page.expect_show_message()
            .withf(|opts| {
                opts.message == "hello"
                    && opts.duration_ms == 5000
                    && opts.style == MessageStyle::Info
                    && opts.close_button
            })
            .times(1)
            .returning(|_| Ok(()));

        let action: Action =
            serde_json::from_value(json!({"type": "showMessage", "message": "hello"})).unwrap();
        ShowMessageHandler
            .execute(&action, &page, &ctx())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_for_close_returns_once_the_overlay_is_gone() {
        let mut page = MockPage::new();
        page.expect_show_message().returning(|_| Ok(()));
        let mut polls = 0;
        page.expect_evaluate().returning(move |_| {
            polls += 1;
            Ok(serde_json::Value::Bool(polls > 2))
        });

        let action: Action = serde_json::from_value(json!({
            "type": "showMessage",
            "message": "close me",
            "duration": 0,
            "waitForClose": true
        }))
        .unwrap();
        ShowMessageHandler
            .execute(&action, &page, &ctx())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_close_is_bounded_by_the_ceiling() {
        let mut page = MockPage::new();
        page.expect_show_message().returning(|_| Ok(()));
        page.expect_evaluate()
            .returning(|_| Ok(serde_json::Value::Bool(false)));

        let action: Action = serde_json::from_value(json!({
            "type": "showMessage",
            "message": "never closed",
            "duration": 0,
            "waitForClose": true
        }))
        .unwrap();
        let err = ShowMessageHandler
            .execute(&action, &page, &ctx())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HandlerError::MessageNotClosed { elapsed_secs: 300 }
        ));
    }

    #[tokio::test]
    async fn nonzero_duration_never_blocks() {
        let mut page = MockPage::new();
        page.expect_show_message().returning(|_| Ok(()));
        // No evaluate expectation: polling would panic the mock.

        let action: Action = serde_json::from_value(json!({
            "type": "showMessage",
            "message": "auto hide",
            "duration": 1000,
            "waitForClose": true
        }))
        .unwrap();
        ShowMessageHandler
            .execute(&action, &page, &ctx())
            .await
            .unwrap();
    }
}
