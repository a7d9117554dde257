//! Dispatch and handler errors.

use thiserror::Error;

use super::{PageError, StorageError};
use crate::action::Action;

/// Failure inside a single handler's execution.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The manual gate's bound elapsed without a release condition firing.
    #[error("manual action timed out after {elapsed_secs} seconds")]
    GateTimeout { elapsed_secs: u64 },

    /// The blocking notification was never dismissed within the hard ceiling.
    #[error("notification was not closed within {elapsed_secs} seconds")]
    MessageNotClosed { elapsed_secs: u64 },

    /// A handler was invoked with an action variant it does not implement;
    /// indicates a registration mismatch, not a workflow defect.
    #[error("handler received unexpected payload (expected `{expected}`)")]
    UnexpectedPayload { expected: &'static str },
}

/// Failure raised by the dispatch registry. Always carries the offending
/// action index and the action payload; the raw cause is wrapped, never
/// swallowed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no handler registered for action type `{tag}` (action {index})")]
    Unregistered {
        tag: String,
        index: usize,
        action: Box<Action>,
    },

    #[error("action {index} (`{tag}`) failed: {source}")]
    HandlerFailed {
        tag: String,
        index: usize,
        action: Box<Action>,
        #[source]
        source: HandlerError,
    },
}

impl DispatchError {
    pub fn index(&self) -> usize {
        match self {
            DispatchError::Unregistered { index, .. } => *index,
            DispatchError::HandlerFailed { index, .. } => *index,
        }
    }

    pub fn action(&self) -> &Action {
        match self {
            DispatchError::Unregistered { action, .. } => action,
            DispatchError::HandlerFailed { action, .. } => action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionMeta, PressAction};

    fn press_enter() -> Action {
        Action::Press(PressAction {
            key: "Enter".to_string(),
            meta: ActionMeta::default(),
        })
    }

    #[test]
    fn unregistered_names_tag_and_index() {
        let err = DispatchError::Unregistered {
            tag: "press".to_string(),
            index: 4,
            action: Box::new(press_enter()),
        };
        let text = err.to_string();
        assert!(text.contains("`press`"));
        assert!(text.contains("action 4"));
        assert_eq!(err.index(), 4);
        assert_eq!(err.action().tag(), "press");
    }

    #[test]
    fn handler_failure_preserves_source() {
        use std::error::Error as _;

        let err = DispatchError::HandlerFailed {
            tag: "press".to_string(),
            index: 1,
            action: Box::new(press_enter()),
            source: HandlerError::Page(PageError::ElementNotFound("#x".to_string())),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("action 1"));
    }

    #[test]
    fn gate_timeout_names_elapsed_seconds() {
        let err = HandlerError::GateTimeout { elapsed_secs: 2 };
        assert!(err.to_string().contains("2 seconds"));
    }
}
