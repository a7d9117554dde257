//! CDP wire types for the domains reelflow drives.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An outgoing CDP command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// An incoming CDP message: either a command response (`id` set) or an
/// event (`method` set).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdpMessage {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpRemoteError>,
    pub method: Option<String>,
    pub params: Option<Value>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CdpRemoteError {
    pub code: i64,
    pub message: String,
}

/// Response of `GET /json/version`.
#[derive(Debug, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// One page target from `GET /json/list` or `PUT /json/new`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventType {
    MousePressed,
    MouseReleased,
    MouseMoved,
    MouseWheel,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventType {
    KeyDown,
    KeyUp,
    Char,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    Png,
    Jpeg,
}

/// Box model quads for a DOM node; eight coordinates per quad.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxModel {
    pub content: Vec<f64>,
    pub width: f64,
    pub height: f64,
}

/// Payload of a `Page.screencastFrame` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreencastFrame {
    /// Base64-encoded image data.
    pub data: String,
    /// Frame number to acknowledge with `Page.screencastFrameAck`.
    pub session_id: i64,
}

/// Payload of a `Page.lifecycleEvent` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub name: String,
}

/// A browser cookie, as used for session persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_absent_session_id() {
        let req = CdpRequest {
            id: 1,
            method: "Page.enable".to_string(),
            params: None,
            session_id: None,
        };
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(encoded, json!({"id": 1, "method": "Page.enable"}));
    }

    #[test]
    fn message_distinguishes_responses_from_events() {
        let response: CdpMessage =
            serde_json::from_value(json!({"id": 7, "result": {"frameId": "f"}})).unwrap();
        assert_eq!(response.id, Some(7));
        assert!(response.method.is_none());

        let event: CdpMessage = serde_json::from_value(json!({
            "method": "Page.lifecycleEvent",
            "params": {"name": "networkIdle"},
            "sessionId": "s1"
        }))
        .unwrap();
        assert!(event.id.is_none());
        assert_eq!(event.method.as_deref(), Some("Page.lifecycleEvent"));
        assert_eq!(event.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn input_enums_use_cdp_wire_names() {
        assert_eq!(
            serde_json::to_value(MouseEventType::MousePressed).unwrap(),
            json!("mousePressed")
        );
        assert_eq!(
            serde_json::to_value(KeyEventType::KeyDown).unwrap(),
            json!("keyDown")
        );
        assert_eq!(
            serde_json::to_value(ScreenshotFormat::Jpeg).unwrap(),
            json!("jpeg")
        );
    }

    #[test]
    fn screencast_frame_parses() {
        let frame: ScreencastFrame =
            serde_json::from_value(json!({"data": "aGk=", "sessionId": 3, "metadata": {}}))
                .unwrap();
        assert_eq!(frame.session_id, 3);
        assert_eq!(frame.data, "aGk=");
    }
}
