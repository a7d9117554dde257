//! Action dispatch registry.
//!
//! The single seam between what an action means and how it is performed.
//! Handlers are registered per wire tag before execution begins and are
//! independently substitutable; a dry-run handler can log without ever
//! touching the session.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use reelflow_protocols::{Action, DispatchError, ExecutionContext, HandlerError, SessionPage};

/// Performs one action type against a live session.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        ctx: &ExecutionContext,
    ) -> Result<(), HandlerError>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("handler already registered for action type `{0}`")]
    Duplicate(String),
}

/// Maps an action's wire tag to its handler.
pub struct ActionRegistry {
    handlers: DashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Bind a handler to a tag. Duplicate tags are rejected.
    pub fn register(
        &self,
        tag: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) -> Result<(), RegistryError> {
        let tag = tag.into();
        if self.handlers.contains_key(&tag) {
            return Err(RegistryError::Duplicate(tag));
        }
        debug!("registered handler for `{tag}`");
        self.handlers.insert(tag, handler);
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<String> {
        self.handlers.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolve the handler for `action` and invoke it.
    ///
    /// Both failure modes wrap the action index and payload: a missing
    /// handler and a handler's own error. The raw cause is preserved as the
    /// error source.
    pub async fn dispatch(
        &self,
        action: &Action,
        page: &dyn SessionPage,
        ctx: &ExecutionContext,
        index: usize,
    ) -> Result<(), DispatchError> {
        let tag = action.tag();
        let handler = self
            .handlers
            .get(tag)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::Unregistered {
                tag: tag.to_string(),
                index,
                action: Box::new(action.clone()),
            })?;

        handler
            .execute(action, page, ctx)
            .await
            .map_err(|source| DispatchError::HandlerFailed {
                tag: tag.to_string(),
                index,
                action: Box::new(action.clone()),
                source,
            })
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
