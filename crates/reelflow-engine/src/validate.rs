//! Workflow validation.
//!
//! Structural and semantic checks over the raw JSON value, before any
//! execution. Validation never partially accepts: every defect across every
//! action is collected in one pass, and the typed [`Workflow`] is only
//! produced when the issue list is empty. No I/O, no side effects.

use serde_json::Value;
use url::Url;

use reelflow_protocols::{ValidationFailure, ValidationIssue, Workflow};

const POSITIONS: [&str; 7] = [
    "top-left",
    "top-center",
    "top-right",
    "bottom-left",
    "bottom-center",
    "bottom-right",
    "center",
];
const STYLES: [&str; 4] = ["info", "warning", "error", "success"];

/// Validate a raw value purporting to be a workflow.
pub fn validate_workflow(raw: &Value) -> Result<Workflow, ValidationFailure> {
    let mut issues = Vec::new();

    let Some(object) = raw.as_object() else {
        return Err(ValidationFailure::new(vec![ValidationIssue::workflow(
            "",
            "workflow must be a JSON object",
        )]));
    };

    match object.get("name") {
        Some(Value::String(name)) if !name.is_empty() => {}
        Some(Value::String(_)) => {
            issues.push(ValidationIssue::workflow("name", "name must not be empty"));
        }
        Some(_) => issues.push(ValidationIssue::workflow("name", "name must be a string")),
        None => issues.push(ValidationIssue::workflow("name", "name is required")),
    }

    match object.get("actions") {
        Some(Value::Array(actions)) => {
            for (index, action) in actions.iter().enumerate() {
                validate_action(index, action, &mut issues);
            }
        }
        Some(_) => issues.push(ValidationIssue::workflow(
            "actions",
            "actions must be an array",
        )),
        None => issues.push(ValidationIssue::workflow("actions", "actions is required")),
    }

    if let Some(config) = object.get("config") {
        if serde_json::from_value::<reelflow_config::WorkflowOverrides>(config.clone()).is_err() {
            issues.push(ValidationIssue::workflow(
                "config",
                "config does not match the workflow override schema",
            ));
        }
    }

    if !issues.is_empty() {
        return Err(ValidationFailure::new(issues));
    }

    // Structure is clean; the typed parse can only fail if the model and
    // this validator disagree, which is itself worth surfacing.
    serde_json::from_value::<Workflow>(raw.clone()).map_err(|e| {
        ValidationFailure::new(vec![ValidationIssue::workflow(
            "",
            format!("workflow did not parse after validation: {e}"),
        )])
    })
}

fn validate_action(index: usize, raw: &Value, issues: &mut Vec<ValidationIssue>) {
    let Some(object) = raw.as_object() else {
        issues.push(ValidationIssue::action(index, "", "action must be an object"));
        return;
    };

    let mut check = FieldChecker {
        index,
        object,
        issues,
    };

    // Common optional fields.
    check.optional_string("description");
    check.optional_bool("skipVtt");
    check.optional_bool("skipChapter");

    let Some(tag) = object.get("type") else {
        check.issue("type", "type is required");
        return;
    };
    let Some(tag) = tag.as_str() else {
        check.issue("type", "type must be a string");
        return;
    };

    match tag {
        "goto" => {
            if let Some(u) = check.required_string("url") {
                if Url::parse(&u).is_err() {
                    check.issue("url", "url must be a valid URL");
                }
            }
        }
        "click" | "hover" | "check" | "uncheck" | "waitForSelector" => {
            check.required_selector();
        }
        "fill" => {
            check.required_selector();
            check.required_string("value");
        }
        "type" => {
            check.required_selector();
            check.required_string("text");
            check.optional_unsigned("delay");
        }
        "press" => {
            check.required_non_empty_string("key");
        }
        "screenshot" => {
            check.optional_string("path");
            check.optional_string("filename");
            check.optional_bool("fullPage");
        }
        "waitForTimeout" => {
            check.required_positive("timeout");
        }
        "waitForManualAction" => {
            check.optional_string("message");
            check.optional_string("continueSelector");
            check.optional_string("continueText");
            check.optional_positive("timeout");
            check.optional_bool("showOverlay");
            check.optional_overlay_options("overlayOptions");
        }
        "selectOption" => {
            check.required_selector();
            check.required_select_value("value");
        }
        "evaluate" => {
            check.required_non_empty_string("script");
        }
        "showMessage" => {
            check.required_string("message");
            check.optional_enum("position", &POSITIONS);
            check.optional_unsigned("duration");
            check.optional_enum("style", &STYLES);
            check.optional_bool("closeButton");
            check.optional_bool("waitForClose");
        }
        unknown => {
            check.issue("type", format!("unknown action type `{unknown}`"));
        }
    }
}

/// Per-action field checks that push issues instead of failing fast.
struct FieldChecker<'a> {
    index: usize,
    object: &'a serde_json::Map<String, Value>,
    issues: &'a mut Vec<ValidationIssue>,
}

impl FieldChecker<'_> {
    fn issue(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues
            .push(ValidationIssue::action(self.index, field, message));
    }

    fn required_string(&mut self, field: &str) -> Option<String> {
        match self.object.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.issue(field, format!("{field} must be a string"));
                None
            }
            None => {
                self.issue(field, format!("{field} is required"));
                None
            }
        }
    }

    fn required_non_empty_string(&mut self, field: &str) -> Option<String> {
        let value = self.required_string(field)?;
        if value.is_empty() {
            self.issue(field, format!("{field} must not be empty"));
            return None;
        }
        Some(value)
    }

    fn required_selector(&mut self) {
        self.required_non_empty_string("selector");
    }

    fn optional_string(&mut self, field: &str) {
        if let Some(value) = self.object.get(field) {
            if !value.is_string() {
                self.issue(field, format!("{field} must be a string"));
            }
        }
    }

    fn optional_bool(&mut self, field: &str) {
        if let Some(value) = self.object.get(field) {
            if !value.is_boolean() {
                self.issue(field, format!("{field} must be a boolean"));
            }
        }
    }

    fn required_positive(&mut self, field: &str) {
        match self.object.get(field) {
            Some(value) => self.check_positive(field, value),
            None => self.issue(field, format!("{field} is required")),
        }
    }

    fn optional_positive(&mut self, field: &str) {
        if let Some(value) = self.object.get(field) {
            self.check_positive(field, value);
        }
    }

    fn check_positive(&mut self, field: &str, value: &Value) {
        match value.as_u64() {
            Some(n) if n > 0 => {}
            _ => self.issue(field, format!("{field} must be a positive integer")),
        }
    }

    fn optional_unsigned(&mut self, field: &str) {
        if let Some(value) = self.object.get(field) {
            if value.as_u64().is_none() {
                self.issue(field, format!("{field} must be a non-negative integer"));
            }
        }
    }

    fn optional_enum(&mut self, field: &str, allowed: &[&str]) {
        if let Some(value) = self.object.get(field) {
            match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                _ => self.issue(
                    field,
                    format!("{field} must be one of: {}", allowed.join(", ")),
                ),
            }
        }
    }

    fn required_select_value(&mut self, field: &str) {
        match self.object.get(field) {
            Some(Value::String(_)) => {}
            Some(Value::Array(items)) => {
                if !items.iter().all(Value::is_string) {
                    self.issue(field, format!("{field} array must contain only strings"));
                }
            }
            Some(_) => self.issue(
                field,
                format!("{field} must be a string or an array of strings"),
            ),
            None => self.issue(field, format!("{field} is required")),
        }
    }

    fn optional_overlay_options(&mut self, field: &str) {
        let Some(value) = self.object.get(field) else {
            return;
        };
        let Some(options) = value.as_object() else {
            self.issue(field, format!("{field} must be an object"));
            return;
        };
        for key in ["title", "instruction"] {
            if let Some(v) = options.get(key) {
                if !v.is_string() {
                    self.issue(format!("{field}.{key}"), format!("{key} must be a string"));
                }
            }
        }
        for key in ["backdrop", "progress"] {
            if let Some(v) = options.get(key) {
                if !v.is_boolean() {
                    self.issue(format!("{field}.{key}"), format!("{key} must be a boolean"));
                }
            }
        }
    }
}
