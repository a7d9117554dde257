//! Script evaluation handler.

use async_trait::async_trait;

use reelflow_protocols::{Action, ExecutionContext, HandlerError, SessionPage};

use crate::registry::ActionHandler;

/// Executes the action's script verbatim inside the page. No sanitization
/// happens here: the workflow author is a trusted party.
pub struct EvaluateHandler;

#[async_trait]
impl ActionHandler for EvaluateHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Evaluate(eval) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "evaluate" });
        };
        page.evaluate(&eval.script).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockPage;
    use reelflow_protocols::PageError;
    use serde_json::json;

    #[tokio::test]
    async fn the_script_is_passed_through_unmodified() {
        let script = "document.title = 'x'; localStorage.clear();";
        let mut page = MockPage::new();
        page.expect_evaluate()
            .withf(move |s| s == script)
            .times(1)
            .returning(|_| Ok(serde_json::Value::Null));

        let action: Action =
            serde_json::from_value(json!({"type": "evaluate", "script": script})).unwrap();
        EvaluateHandler
            .execute(&action, &page, &ExecutionContext::new("/tmp/out"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn page_script_errors_propagate() {
        let mut page = MockPage::new();
        page.expect_evaluate()
            .returning(|_| Err(PageError::Script("ReferenceError: nope".into())));

        let action: Action =
            serde_json::from_value(json!({"type": "evaluate", "script": "nope()"})).unwrap();
        let err = EvaluateHandler
            .execute(&action, &page, &ExecutionContext::new("/tmp/out"))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Page(PageError::Script(_))));
    }
}
