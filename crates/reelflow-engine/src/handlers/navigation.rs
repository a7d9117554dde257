//! Navigation handler.

use async_trait::async_trait;
use tracing::debug;

use reelflow_protocols::{Action, ExecutionContext, HandlerError, SessionPage};

use crate::registry::ActionHandler;

/// Navigates and returns once the page reports network-idle; the bound is
/// the session's configured navigation timeout.
pub struct GotoHandler;

#[async_trait]
impl ActionHandler for GotoHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Goto(goto) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "goto" });
        };

        page.navigate(&goto.url).await?;
        debug!("navigated to {}", goto.url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockPage;
    use reelflow_protocols::action::{ActionMeta, GotoAction};
    use reelflow_protocols::PageError;

    fn goto(url: &str) -> Action {
        Action::Goto(GotoAction {
            url: url.to_string(),
            meta: ActionMeta::default(),
        })
    }

    #[tokio::test]
    async fn navigates_to_the_declared_url() {
        let mut page = MockPage::new();
        page.expect_navigate()
            .withf(|url| url == "https://example.com")
            .times(1)
            .returning(|_| Ok(()));

        let ctx = ExecutionContext::new("/tmp/out");
        GotoHandler
            .execute(&goto("https://example.com"), &page, &ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn navigation_failures_propagate() {
        let mut page = MockPage::new();
        page.expect_navigate()
            .returning(|_| Err(PageError::Navigation("net::ERR_NAME_NOT_RESOLVED".into())));

        let ctx = ExecutionContext::new("/tmp/out");
        let err = GotoHandler
            .execute(&goto("https://nope.invalid"), &page, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Page(PageError::Navigation(_))));
    }

    #[tokio::test]
    async fn wrong_variant_is_a_registration_mismatch() {
        let page = MockPage::new();
        let ctx = ExecutionContext::new("/tmp/out");
        let action: Action =
            serde_json::from_value(serde_json::json!({"type": "press", "key": "Enter"})).unwrap();

        let err = GotoHandler.execute(&action, &page, &ctx).await.unwrap_err();
        assert!(matches!(err, HandlerError::UnexpectedPayload { .. }));
    }
}
