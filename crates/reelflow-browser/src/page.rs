//! `SessionPage` implementation over a CDP page session.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use reelflow_config::BrowserConfig;
use reelflow_protocols::page::{MessageOptions, SessionPage};
use reelflow_protocols::PageError;

use crate::error::CdpError;
use crate::overlay::OverlayInjector;
use crate::session::PageSession;

const FALLBACK_TIMEOUT_MS: u64 = 30_000;

/// A CDP-backed page carrying the session's configured timeouts.
///
/// `slow_mo` adds a pause after every input operation so recordings stay
/// followable at normal playback speed.
pub struct CdpPage {
    session: Arc<PageSession>,
    overlay: OverlayInjector,
    default_timeout_ms: u64,
    navigation_timeout_ms: u64,
    slow_mo_ms: u64,
}

impl CdpPage {
    pub fn new(session: Arc<PageSession>, config: &BrowserConfig) -> Self {
        Self {
            session,
            overlay: OverlayInjector::new(),
            default_timeout_ms: config.default_timeout.unwrap_or(FALLBACK_TIMEOUT_MS),
            navigation_timeout_ms: config.navigation_timeout.unwrap_or(FALLBACK_TIMEOUT_MS),
            slow_mo_ms: config.slow_mo,
        }
    }

    /// The underlying CDP session, for capture and cookie plumbing.
    pub fn session(&self) -> &Arc<PageSession> {
        &self.session
    }

    async fn pace(&self) {
        if self.slow_mo_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.slow_mo_ms)).await;
        }
    }
}

fn map_err(err: CdpError) -> PageError {
    match err {
        CdpError::Timeout(msg) => PageError::Timeout(msg),
        CdpError::ElementNotFound(msg) => PageError::ElementNotFound(msg),
        CdpError::NavigationFailed(msg) => PageError::Navigation(msg),
        CdpError::JavaScript(msg) => PageError::Script(msg),
        CdpError::Io(source) => PageError::Io(source),
        other => PageError::Session(other.to_string()),
    }
}

#[async_trait]
impl SessionPage for CdpPage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.session
            .navigate(url, self.navigation_timeout_ms)
            .await
            .map_err(map_err)
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        self.session
            .click_selector(selector, self.default_timeout_ms)
            .await
            .map_err(map_err)?;
        self.pace().await;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError> {
        self.session
            .fill(selector, value, self.default_timeout_ms)
            .await
            .map_err(map_err)?;
        self.pace().await;
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str, delay_ms: u64) -> Result<(), PageError> {
        self.session
            .type_text(selector, text, delay_ms, self.default_timeout_ms)
            .await
            .map_err(map_err)?;
        self.pace().await;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        self.session.press_key(key).await.map_err(map_err)?;
        self.pace().await;
        Ok(())
    }

    async fn hover(&self, selector: &str) -> Result<(), PageError> {
        self.session
            .hover_selector(selector, self.default_timeout_ms)
            .await
            .map_err(map_err)?;
        self.pace().await;
        Ok(())
    }

    async fn set_checked(&self, selector: &str, checked: bool) -> Result<(), PageError> {
        self.session
            .set_checked(selector, checked, self.default_timeout_ms)
            .await
            .map_err(map_err)?;
        self.pace().await;
        Ok(())
    }

    async fn select_option(&self, selector: &str, values: &[String]) -> Result<(), PageError> {
        self.session
            .select_option(selector, values, self.default_timeout_ms)
            .await
            .map_err(map_err)?;
        self.pace().await;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout_ms: Option<u64>,
    ) -> Result<(), PageError> {
        let timeout = timeout_ms.unwrap_or(self.default_timeout_ms);
        self.session
            .wait_for_selector(selector, timeout)
            .await
            .map_err(map_err)
    }

    async fn wait_for_text(&self, text: &str, timeout_ms: u64) -> Result<(), PageError> {
        self.session
            .wait_for_text(text, timeout_ms)
            .await
            .map_err(map_err)
    }

    async fn evaluate(&self, script: &str) -> Result<Value, PageError> {
        self.session.evaluate(script).await.map_err(map_err)
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), PageError> {
        self.session
            .screenshot(path, full_page)
            .await
            .map_err(map_err)
    }

    async fn show_message(&self, options: &MessageOptions) -> Result<(), PageError> {
        self.overlay
            .show_message(&self.session, options)
            .await
            .map_err(map_err)
    }

    async fn remove_overlay(&self) -> Result<(), PageError> {
        self.overlay.remove(&self.session).await.map_err(map_err)
    }

    async fn close(&self) -> Result<(), PageError> {
        self.session.close().await.map_err(map_err)
    }
}
