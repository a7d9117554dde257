//! The action model: one closed sum type for every operation a workflow can
//! declare.
//!
//! The `type` field of the JSON object selects the variant; each variant
//! carries exactly its operation-specific parameters. Adding an action type
//! means adding a variant here and a handler registration — dispatch and
//! logging are otherwise untouched.

use serde::{Deserialize, Serialize};

use crate::page::{MessagePosition, MessageStyle};

/// Fields shared by every action variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMeta {
    /// Human label used by the timeline logger; a default is generated
    /// from the payload when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Suppress this action from the subtitle-cue track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_vtt: Option<bool>,
    /// Suppress this action from the chapter track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_chapter: Option<bool>,
}

/// One or many option values for a `selectOption` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectValue {
    One(String),
    Many(Vec<String>),
}

impl SelectValue {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            SelectValue::One(v) => vec![v.clone()],
            SelectValue::Many(vs) => vs.clone(),
        }
    }
}

/// Overlay options for the manual-gate guidance modal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GotoAction {
    pub url: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickAction {
    pub selector: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillAction {
    pub selector: String,
    pub value: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAction {
    pub selector: String,
    pub text: String,
    /// Inter-key delay in milliseconds; defaults to 50 to simulate human
    /// input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressAction {
    pub key: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverAction {
    pub selector: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotAction {
    /// Explicit output path; takes precedence over `filename`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Bare filename resolved inside the batch screenshots directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_page: Option<bool>,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForSelectorAction {
    pub selector: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForTimeoutAction {
    /// Milliseconds to pause; must be positive.
    pub timeout: u64,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualGateAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Release when this selector becomes visible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_selector: Option<String>,
    /// Release when the page's visible text contains this substring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_text: Option<String>,
    /// Overall bound in milliseconds; defaults to five minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_overlay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_options: Option<OverlayOptions>,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOptionAction {
    pub selector: String,
    pub value: SelectValue,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAction {
    pub selector: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncheckAction {
    pub selector: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAction {
    /// Executed verbatim inside the page; the workflow author is trusted.
    pub script: String,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowMessageAction {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<MessagePosition>,
    /// Milliseconds before the notification auto-hides; 0 keeps it up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<MessageStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_button: Option<bool>,
    /// With `duration == 0`, block until the operator dismisses it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_close: Option<bool>,
    #[serde(flatten)]
    pub meta: ActionMeta,
}

/// One declarative workflow step.
///
/// The wire discriminant is the `type` field; the tag set is closed and
/// matched exhaustively wherever behavior depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "goto")]
    Goto(GotoAction),
    #[serde(rename = "click")]
    Click(ClickAction),
    #[serde(rename = "fill")]
    Fill(FillAction),
    #[serde(rename = "type")]
    Type(TypeAction),
    #[serde(rename = "press")]
    Press(PressAction),
    #[serde(rename = "hover")]
    Hover(HoverAction),
    #[serde(rename = "screenshot")]
    Screenshot(ScreenshotAction),
    #[serde(rename = "waitForSelector")]
    WaitForSelector(WaitForSelectorAction),
    #[serde(rename = "waitForTimeout")]
    WaitForTimeout(WaitForTimeoutAction),
    #[serde(rename = "waitForManualAction")]
    WaitForManualAction(ManualGateAction),
    #[serde(rename = "selectOption")]
    SelectOption(SelectOptionAction),
    #[serde(rename = "check")]
    Check(CheckAction),
    #[serde(rename = "uncheck")]
    Uncheck(UncheckAction),
    #[serde(rename = "evaluate")]
    Evaluate(EvaluateAction),
    #[serde(rename = "showMessage")]
    ShowMessage(ShowMessageAction),
}

/// Every wire tag, in declaration order. Used to prove dispatch totality.
pub const ACTION_TAGS: [&str; 15] = [
    "goto",
    "click",
    "fill",
    "type",
    "press",
    "hover",
    "screenshot",
    "waitForSelector",
    "waitForTimeout",
    "waitForManualAction",
    "selectOption",
    "check",
    "uncheck",
    "evaluate",
    "showMessage",
];

impl Action {
    /// The wire discriminant for this action.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::Goto(_) => "goto",
            Action::Click(_) => "click",
            Action::Fill(_) => "fill",
            Action::Type(_) => "type",
            Action::Press(_) => "press",
            Action::Hover(_) => "hover",
            Action::Screenshot(_) => "screenshot",
            Action::WaitForSelector(_) => "waitForSelector",
            Action::WaitForTimeout(_) => "waitForTimeout",
            Action::WaitForManualAction(_) => "waitForManualAction",
            Action::SelectOption(_) => "selectOption",
            Action::Check(_) => "check",
            Action::Uncheck(_) => "uncheck",
            Action::Evaluate(_) => "evaluate",
            Action::ShowMessage(_) => "showMessage",
        }
    }

    pub fn meta(&self) -> &ActionMeta {
        match self {
            Action::Goto(a) => &a.meta,
            Action::Click(a) => &a.meta,
            Action::Fill(a) => &a.meta,
            Action::Type(a) => &a.meta,
            Action::Press(a) => &a.meta,
            Action::Hover(a) => &a.meta,
            Action::Screenshot(a) => &a.meta,
            Action::WaitForSelector(a) => &a.meta,
            Action::WaitForTimeout(a) => &a.meta,
            Action::WaitForManualAction(a) => &a.meta,
            Action::SelectOption(a) => &a.meta,
            Action::Check(a) => &a.meta,
            Action::Uncheck(a) => &a.meta,
            Action::Evaluate(a) => &a.meta,
            Action::ShowMessage(a) => &a.meta,
        }
    }

    /// The human label for the timeline: the author's description when
    /// given, otherwise a default generated from the payload.
    pub fn label(&self) -> String {
        if let Some(desc) = &self.meta().description {
            return desc.clone();
        }
        match self {
            Action::Goto(a) => format!("Navigate to {}", a.url),
            Action::Click(a) => format!("Click {}", a.selector),
            Action::Fill(a) => format!("Fill {} with \"{}\"", a.selector, a.value),
            Action::Type(a) => format!("Type text in {}", a.selector),
            Action::Press(a) => format!("Press {}", a.key),
            Action::Hover(a) => format!("Hover over {}", a.selector),
            Action::Screenshot(a) => match &a.filename {
                Some(name) => format!("Take screenshot ({name})"),
                None => "Take screenshot".to_string(),
            },
            Action::WaitForSelector(a) => format!("Wait for {}", a.selector),
            Action::WaitForTimeout(a) => format!("Wait {}ms", a.timeout),
            Action::WaitForManualAction(a) => a
                .message
                .clone()
                .unwrap_or_else(|| "Wait for manual action".to_string()),
            Action::SelectOption(a) => format!("Select option in {}", a.selector),
            Action::Check(a) => format!("Check {}", a.selector),
            Action::Uncheck(a) => format!("Uncheck {}", a.selector),
            Action::Evaluate(_) => "Execute JavaScript".to_string(),
            Action::ShowMessage(_) => "Show message".to_string(),
        }
    }

    /// Whether this action opted out of the subtitle-cue track.
    pub fn skip_cue(&self) -> bool {
        self.meta().skip_vtt == Some(true)
    }

    /// Whether this action opted out of the chapter track.
    pub fn skip_chapter(&self) -> bool {
        self.meta().skip_chapter == Some(true)
    }

    /// True for navigation actions; the timeline clock re-origins on the
    /// first one so the log aligns with recording start.
    pub fn is_navigation(&self) -> bool {
        matches!(self, Action::Goto(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn goto_round_trips_through_wire_format() {
        let raw = json!({
            "type": "goto",
            "url": "https://example.com",
            "description": "Open the homepage"
        });
        let action: Action = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(action.tag(), "goto");
        assert_eq!(action.label(), "Open the homepage");

        let back = serde_json::to_value(&action).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let raw = json!({"type": "teleport", "url": "https://example.com"});
        assert!(serde_json::from_value::<Action>(raw).is_err());
    }

    #[test]
    fn select_value_accepts_string_or_array() {
        let one: Action =
            serde_json::from_value(json!({"type": "selectOption", "selector": "#s", "value": "a"}))
                .unwrap();
        let many: Action = serde_json::from_value(
            json!({"type": "selectOption", "selector": "#s", "value": ["a", "b"]}),
        )
        .unwrap();

        match (one, many) {
            (Action::SelectOption(o), Action::SelectOption(m)) => {
                assert_eq!(o.value.to_vec(), vec!["a"]);
                assert_eq!(m.value.to_vec(), vec!["a", "b"]);
            }
            _ => panic!("expected selectOption variants"),
        }
    }

    #[test]
    fn default_labels_are_generated_from_payload() {
        let click: Action =
            serde_json::from_value(json!({"type": "click", "selector": "#go"})).unwrap();
        assert_eq!(click.label(), "Click #go");

        let wait: Action =
            serde_json::from_value(json!({"type": "waitForTimeout", "timeout": 1200})).unwrap();
        assert_eq!(wait.label(), "Wait 1200ms");

        let shot: Action =
            serde_json::from_value(json!({"type": "screenshot", "filename": "result"})).unwrap();
        assert_eq!(shot.label(), "Take screenshot (result)");
    }

    #[test]
    fn skip_flags_default_off() {
        let action: Action =
            serde_json::from_value(json!({"type": "press", "key": "Enter"})).unwrap();
        assert!(!action.skip_cue());
        assert!(!action.skip_chapter());

        let muted: Action = serde_json::from_value(
            json!({"type": "press", "key": "Enter", "skipVtt": true, "skipChapter": true}),
        )
        .unwrap();
        assert!(muted.skip_cue());
        assert!(muted.skip_chapter());
    }

    #[test]
    fn only_goto_is_navigation() {
        let goto: Action =
            serde_json::from_value(json!({"type": "goto", "url": "https://a.dev"})).unwrap();
        let click: Action =
            serde_json::from_value(json!({"type": "click", "selector": "#x"})).unwrap();
        assert!(goto.is_navigation());
        assert!(!click.is_navigation());
    }

    #[test]
    fn manual_gate_parses_all_release_fields() {
        let action: Action = serde_json::from_value(json!({
            "type": "waitForManualAction",
            "message": "Log in",
            "continueSelector": ".dashboard",
            "timeout": 60000,
            "showOverlay": true,
            "overlayOptions": {"title": "Manual step", "backdrop": true}
        }))
        .unwrap();

        let Action::WaitForManualAction(gate) = action else {
            panic!("expected manual gate");
        };
        assert_eq!(gate.continue_selector.as_deref(), Some(".dashboard"));
        assert_eq!(gate.timeout, Some(60000));
        assert_eq!(
            gate.overlay_options.unwrap().title.as_deref(),
            Some("Manual step")
        );
    }
}
