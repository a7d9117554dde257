//! Element interaction handlers: click, fill, type, press, hover, check,
//! uncheck, select.
//!
//! All of them fail if the target is not actionable within the session's
//! default timeout; none of that policy is configurable per call.

use async_trait::async_trait;
use tracing::debug;

use reelflow_protocols::{Action, ExecutionContext, HandlerError, SessionPage};

use crate::registry::ActionHandler;

/// Default inter-key delay for `type`, simulating human input.
const DEFAULT_TYPE_DELAY_MS: u64 = 50;

pub struct ClickHandler;

#[async_trait]
impl ActionHandler for ClickHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Click(click) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "click" });
        };
        page.click(&click.selector).await?;
        debug!("clicked {}", click.selector);
        Ok(())
    }
}

/// Replaces field content atomically: the page clears, then sets.
pub struct FillHandler;

#[async_trait]
impl ActionHandler for FillHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Fill(fill) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "fill" });
        };
        page.fill(&fill.selector, &fill.value).await?;
        Ok(())
    }
}

/// Appends text key-by-key; the delay is the action's `delay` or 50ms.
pub struct TypeHandler;

#[async_trait]
impl ActionHandler for TypeHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Type(typing) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "type" });
        };
        let delay = typing.delay.unwrap_or(DEFAULT_TYPE_DELAY_MS);
        page.type_text(&typing.selector, &typing.text, delay).await?;
        Ok(())
    }
}

pub struct PressHandler;

#[async_trait]
impl ActionHandler for PressHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Press(press) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "press" });
        };
        page.press_key(&press.key).await?;
        debug!("pressed {}", press.key);
        Ok(())
    }
}

pub struct HoverHandler;

#[async_trait]
impl ActionHandler for HoverHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Hover(hover) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "hover" });
        };
        page.hover(&hover.selector).await?;
        Ok(())
    }
}

pub struct CheckHandler;

#[async_trait]
impl ActionHandler for CheckHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Check(check) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "check" });
        };
        page.set_checked(&check.selector, true).await?;
        Ok(())
    }
}

pub struct UncheckHandler;

#[async_trait]
impl ActionHandler for UncheckHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::Uncheck(uncheck) = action else {
            return Err(HandlerError::UnexpectedPayload { expected: "uncheck" });
        };
        page.set_checked(&uncheck.selector, false).await?;
        Ok(())
    }
}

pub struct SelectOptionHandler;

#[async_trait]
impl ActionHandler for SelectOptionHandler {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        _ctx: &ExecutionContext,
    ) -> Result<(), HandlerError> {
        let Action::SelectOption(select) = action else {
            return Err(HandlerError::UnexpectedPayload {
                expected: "selectOption",
            });
        };
        page.select_option(&select.selector, &select.value.to_vec())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockPage;
    use serde_json::json;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new("/tmp/out")
    }

    fn action(raw: serde_json::Value) -> Action {
        serde_json::from_value(raw).unwrap()
    }

    #[tokio::test]
    async fn click_targets_the_selector() {
        let mut page = MockPage::new();
        page.expect_click()
            .withf(|s| s == "#submit")
            .times(1)
            .returning(|_| Ok(()));

        ClickHandler
            .execute(&action(json!({"type": "click", "selector": "#submit"})), &page, &ctx())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fill_passes_selector_and_value() {
        let mut page = MockPage::new();
        page.expect_fill()
            .withf(|s, v| s == "#name" && v == "Ada")
            .times(1)
            .returning(|_, _| Ok(()));

        FillHandler
            .execute(
                &action(json!({"type": "fill", "selector": "#name", "value": "Ada"})),
                &page,
                &ctx(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn type_defaults_to_a_50ms_inter_key_delay() {
        let mut page = MockPage::new();
        page.expect_type_text()
            .withf(|s, t, delay| s == "#q" && t == "hi" && *delay == 50)
            .times(1)
            .returning(|_, _, _| Ok(()));

        TypeHandler
            .execute(
                &action(json!({"type": "type", "selector": "#q", "text": "hi"})),
                &page,
                &ctx(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn type_delay_is_exposed_as_a_parameter() {
        let mut page = MockPage::new();
        page.expect_type_text()
            .withf(|_, _, delay| *delay == 5)
            .times(1)
            .returning(|_, _, _| Ok(()));

        TypeHandler
            .execute(
                &action(json!({"type": "type", "selector": "#q", "text": "hi", "delay": 5})),
                &page,
                &ctx(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn check_and_uncheck_set_opposite_states() {
        let mut page = MockPage::new();
        page.expect_set_checked()
            .withf(|s, checked| s == "#opt" && *checked)
            .times(1)
            .returning(|_, _| Ok(()));
        page.expect_set_checked()
            .withf(|s, checked| s == "#opt" && !*checked)
            .times(1)
            .returning(|_, _| Ok(()));

        CheckHandler
            .execute(&action(json!({"type": "check", "selector": "#opt"})), &page, &ctx())
            .await
            .unwrap();
        UncheckHandler
            .execute(&action(json!({"type": "uncheck", "selector": "#opt"})), &page, &ctx())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn select_option_normalizes_single_values_to_a_list() {
        let mut page = MockPage::new();
        page.expect_select_option()
            .withf(|s, values| s == "#lang" && values.len() == 1 && values[0] == "en")
            .times(1)
            .returning(|_, _| Ok(()));

        SelectOptionHandler
            .execute(
                &action(json!({"type": "selectOption", "selector": "#lang", "value": "en"})),
                &page,
                &ctx(),
            )
            .await
            .unwrap();
    }
}
