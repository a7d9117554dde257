//! Workflow validation errors.

use serde::Serialize;
use thiserror::Error;

/// One structural or semantic defect found in a raw workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    /// Index of the offending action, when the defect is inside one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_index: Option<usize>,
    /// Dotted field path relative to the action (or the workflow root).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationIssue {
    pub fn workflow(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action_index: None,
            field: Some(field.into()),
        }
    }

    pub fn action(index: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action_index: Some(index),
            field: Some(field.into()),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (field: {field})")?;
        }
        if let Some(index) = self.action_index {
            write!(f, " (action {index})")?;
        }
        Ok(())
    }
}

/// Rejection of a whole workflow: the ordered, non-empty list of every
/// defect found in one pass. No side effects have occurred.
#[derive(Debug, Clone, Error)]
#[error("workflow validation failed with {} issue(s)", issues.len())]
pub struct ValidationFailure {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFailure {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        debug_assert!(!issues.is_empty());
        Self { issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_display_includes_field_and_index() {
        let issue = ValidationIssue::action(3, "url", "url must be a valid URL");
        let text = issue.to_string();
        assert!(text.contains("url must be a valid URL"));
        assert!(text.contains("field: url"));
        assert!(text.contains("action 3"));
    }

    #[test]
    fn failure_reports_issue_count() {
        let failure = ValidationFailure::new(vec![
            ValidationIssue::workflow("name", "name must not be empty"),
            ValidationIssue::action(0, "type", "unknown action type"),
        ]);
        assert!(failure.to_string().contains("2 issue(s)"));
    }
}
