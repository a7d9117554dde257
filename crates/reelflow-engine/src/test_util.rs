//! Shared test doubles.

use std::path::Path;

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use reelflow_protocols::page::{MessageOptions, SessionPage};
use reelflow_protocols::PageError;

mock! {
    pub Page {}

    #[async_trait]
    impl SessionPage for Page {
        async fn navigate(&self, url: &str) -> Result<(), PageError>;
        async fn click(&self, selector: &str) -> Result<(), PageError>;
        async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError>;
        async fn type_text(&self, selector: &str, text: &str, delay_ms: u64) -> Result<(), PageError>;
        async fn press_key(&self, key: &str) -> Result<(), PageError>;
        async fn hover(&self, selector: &str) -> Result<(), PageError>;
        async fn set_checked(&self, selector: &str, checked: bool) -> Result<(), PageError>;
        async fn select_option(&self, selector: &str, values: &[String]) -> Result<(), PageError>;
        async fn wait_for_selector(&self, selector: &str, timeout_ms: Option<u64>) -> Result<(), PageError>;
        async fn wait_for_text(&self, text: &str, timeout_ms: u64) -> Result<(), PageError>;
        async fn evaluate(&self, script: &str) -> Result<Value, PageError>;
        async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), PageError>;
        async fn show_message(&self, options: &MessageOptions) -> Result<(), PageError>;
        async fn remove_overlay(&self) -> Result<(), PageError>;
        async fn close(&self) -> Result<(), PageError>;
    }
}
