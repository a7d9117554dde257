//! CDP page session: every operation reelflow performs against a live page.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine as _;
use futures::SinkExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use crate::client::{PendingRequest, WsSink, CALL_TIMEOUT};
use crate::error::CdpError;
use crate::events::PageEventRouter;
use crate::protocol::{
    BoxModel, CdpMessage, CdpRequest, Cookie, KeyEventType, MouseButton, MouseEventType,
    ScreencastFrame, ScreenshotFormat,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A session attached to a single page target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    /// WebSocket sender (shared with the client).
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    /// Pending requests (shared with the client).
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    /// Request ID counter (shared with the client).
    request_id: Arc<AtomicU64>,
    /// Fan-out of this session's events.
    router: PageEventRouter,
}

impl PageSession {
    pub(crate) fn new(
        target_id: String,
        session_id: String,
        ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
        pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
        request_id: Arc<AtomicU64>,
        event_rx: mpsc::UnboundedReceiver<CdpMessage>,
    ) -> Self {
        Self {
            target_id,
            session_id,
            ws_tx,
            pending,
            request_id,
            router: PageEventRouter::spawn(event_rx),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command scoped to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.call_raw(method, params, Some(self.session_id.clone()))
            .await
    }

    /// Send a browser-level command (no session scope).
    async fn call_browser(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.call_raw(method, params, None).await
    }

    async fn call_raw(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<String>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id,
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP session send: {json}");

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await?;
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("request {method} timed out")))
            }
        }
    }

    /// Enable the CDP domains reelflow drives.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        self.call("Network.enable", None).await?;
        // Lifecycle events feed the network-idle wait after navigation.
        self.call("Page.setLifecycleEventsEnabled", Some(json!({"enabled": true})))
            .await?;
        debug!("enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Navigate and block until the page reports network-idle, bounded by
    /// `timeout_ms`.
    pub async fn navigate(&self, url: &str, timeout_ms: u64) -> Result<(), CdpError> {
        let mut idle = self.router.network_idle();
        let before = *idle.borrow();

        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;
        if let Some(error) = result.get("errorText") {
            return Err(CdpError::NavigationFailed(
                error.as_str().unwrap_or("unknown error").to_string(),
            ));
        }

        let wait = async {
            loop {
                if *idle.borrow() > before {
                    return Ok::<(), CdpError>(());
                }
                if idle.changed().await.is_err() {
                    return Err(CdpError::SessionClosed);
                }
            }
        };
        tokio::time::timeout(Duration::from_millis(timeout_ms), wait)
            .await
            .map_err(|_| {
                CdpError::Timeout(format!("navigation to {url} did not reach network-idle"))
            })??;

        debug!("navigated to {url}");
        Ok(())
    }

    // ========================================================================
    // JavaScript execution
    // ========================================================================

    /// Evaluate an expression and return its JSON value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    // ========================================================================
    // DOM queries
    // ========================================================================

    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>, CdpError> {
        let doc = self
            .call("DOM.getDocument", Some(json!({"depth": 0})))
            .await?;
        let root_id = doc["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("missing document node".to_string()))?;

        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({"nodeId": root_id, "selector": selector})),
            )
            .await?;

        match result["nodeId"].as_i64() {
            Some(0) | None => Ok(None),
            Some(node_id) => Ok(Some(node_id)),
        }
    }

    /// Box model for a node; `None` when the node has no layout (hidden).
    pub async fn get_box_model(&self, node_id: i64) -> Result<Option<BoxModel>, CdpError> {
        let result = self
            .call("DOM.getBoxModel", Some(json!({"nodeId": node_id})))
            .await;

        match result {
            Ok(r) => {
                let model: BoxModel = serde_json::from_value(r["model"].clone())?;
                Ok(Some(model))
            }
            // Node not rendered or detached.
            Err(CdpError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn focus(&self, node_id: i64) -> Result<(), CdpError> {
        self.call("DOM.focus", Some(json!({"nodeId": node_id})))
            .await?;
        Ok(())
    }

    /// Poll until the selector resolves to a rendered element, returning its
    /// node id and content-box center.
    async fn wait_for_actionable(
        &self,
        selector: &str,
        timeout_ms: u64,
    ) -> Result<(i64, f64, f64), CdpError> {
        let timeout = Duration::from_millis(timeout_ms);
        let start = Instant::now();

        loop {
            if let Some(node_id) = self.query_selector(selector).await? {
                if let Some(model) = self.get_box_model(node_id).await? {
                    if model.width > 0.0 && model.height > 0.0 {
                        let (x, y) = quad_center(&model.content);
                        return Ok((node_id, x, y));
                    }
                }
            }

            if start.elapsed() > timeout {
                return Err(CdpError::Timeout(format!(
                    "element '{selector}' was not actionable within {timeout_ms}ms"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    async fn mouse_event(
        &self,
        kind: MouseEventType,
        x: f64,
        y: f64,
        click_count: u32,
    ) -> Result<(), CdpError> {
        let mut params = json!({
            "type": kind,
            "x": x,
            "y": y,
        });
        if click_count > 0 {
            params["button"] = json!(MouseButton::Left);
            params["clickCount"] = json!(click_count);
        }
        self.call("Input.dispatchMouseEvent", Some(params)).await?;
        Ok(())
    }

    /// Click at page coordinates.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<(), CdpError> {
        self.mouse_event(MouseEventType::MousePressed, x, y, 1).await?;
        self.mouse_event(MouseEventType::MouseReleased, x, y, 1).await?;
        debug!("clicked at ({x}, {y})");
        Ok(())
    }

    /// Click the element matching `selector` once it is actionable.
    pub async fn click_selector(&self, selector: &str, timeout_ms: u64) -> Result<(), CdpError> {
        let (_, x, y) = self.wait_for_actionable(selector, timeout_ms).await?;
        self.click_at(x, y).await
    }

    /// Move the pointer over the element matching `selector`.
    pub async fn hover_selector(&self, selector: &str, timeout_ms: u64) -> Result<(), CdpError> {
        let (_, x, y) = self.wait_for_actionable(selector, timeout_ms).await?;
        self.mouse_event(MouseEventType::MouseMoved, x, y, 0).await
    }

    /// Replace a field's content atomically via the element's native value
    /// setter, then fire input/change so framework listeners observe it.
    pub async fn fill(
        &self,
        selector: &str,
        value: &str,
        timeout_ms: u64,
    ) -> Result<(), CdpError> {
        let (node_id, _, _) = self.wait_for_actionable(selector, timeout_ms).await?;
        self.focus(node_id).await?;

        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return 'notfound';
                const proto = el.tagName === 'TEXTAREA'
                    ? HTMLTextAreaElement.prototype
                    : HTMLInputElement.prototype;
                const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
                setter.call(el, {val});
                el.dispatchEvent(new Event('input', {{bubbles: true}}));
                el.dispatchEvent(new Event('change', {{bubbles: true}}));
                return 'ok';
            }})()"#,
            sel = js_string(selector)?,
            val = js_string(value)?,
        );
        match self.evaluate(&script).await?.as_str() {
            Some("ok") => Ok(()),
            _ => Err(CdpError::ElementNotFound(selector.to_string())),
        }
    }

    /// Type text key-by-key with `delay_ms` between keystrokes.
    pub async fn type_text(
        &self,
        selector: &str,
        text: &str,
        delay_ms: u64,
        timeout_ms: u64,
    ) -> Result<(), CdpError> {
        let (node_id, _, _) = self.wait_for_actionable(selector, timeout_ms).await?;
        self.focus(node_id).await?;

        for ch in text.chars() {
            self.call(
                "Input.dispatchKeyEvent",
                Some(json!({
                    "type": KeyEventType::Char,
                    "text": ch.to_string(),
                })),
            )
            .await?;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        debug!("typed {} characters into {selector}", text.chars().count());
        Ok(())
    }

    /// Send one synthetic key press.
    pub async fn press_key(&self, key: &str) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchKeyEvent",
            Some(json!({"type": KeyEventType::KeyDown, "key": key})),
        )
        .await?;
        self.call(
            "Input.dispatchKeyEvent",
            Some(json!({"type": KeyEventType::KeyUp, "key": key})),
        )
        .await?;
        Ok(())
    }

    /// Put a checkbox or radio into the requested state, clicking only when
    /// the state differs.
    pub async fn set_checked(
        &self,
        selector: &str,
        checked: bool,
        timeout_ms: u64,
    ) -> Result<(), CdpError> {
        let (_, x, y) = self.wait_for_actionable(selector, timeout_ms).await?;

        let read_state = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.checked : null; }})()",
            js_string(selector)?
        );
        let current = self.evaluate(&read_state).await?;
        let current = current
            .as_bool()
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;

        if current != checked {
            self.click_at(x, y).await?;
        }
        Ok(())
    }

    /// Select option values in a `<select>` element and fire change events.
    pub async fn select_option(
        &self,
        selector: &str,
        values: &[String],
        timeout_ms: u64,
    ) -> Result<(), CdpError> {
        self.wait_for_actionable(selector, timeout_ms).await?;

        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el || !el.options) return 'notfound';
                const values = {vals};
                for (const opt of el.options) {{
                    opt.selected = values.includes(opt.value);
                }}
                el.dispatchEvent(new Event('input', {{bubbles: true}}));
                el.dispatchEvent(new Event('change', {{bubbles: true}}));
                return 'ok';
            }})()"#,
            sel = js_string(selector)?,
            vals = serde_json::to_string(values)?,
        );
        match self.evaluate(&script).await?.as_str() {
            Some("ok") => Ok(()),
            _ => Err(CdpError::ElementNotFound(selector.to_string())),
        }
    }

    // ========================================================================
    // Waits
    // ========================================================================

    /// Block until the selector resolves to a visible element.
    pub async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<(), CdpError> {
        let timeout = Duration::from_millis(timeout_ms);
        let start = Instant::now();

        loop {
            if let Some(node_id) = self.query_selector(selector).await? {
                if self.get_box_model(node_id).await?.is_some() {
                    return Ok(());
                }
            }
            if start.elapsed() > timeout {
                return Err(CdpError::Timeout(format!(
                    "waiting for selector '{selector}' timed out"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Block until the page's visible text contains `text`.
    pub async fn wait_for_text(&self, text: &str, timeout_ms: u64) -> Result<(), CdpError> {
        let timeout = Duration::from_millis(timeout_ms);
        let start = Instant::now();

        loop {
            let body = self
                .evaluate("document.body ? document.body.innerText : ''")
                .await?;
            if body.as_str().is_some_and(|t| t.contains(text)) {
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(CdpError::Timeout(format!(
                    "waiting for text \"{text}\" timed out"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    // ========================================================================
    // Capture
    // ========================================================================

    /// Capture the current view (or the full scrollable page) to `path`.
    pub async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), CdpError> {
        let result = self
            .call(
                "Page.captureScreenshot",
                Some(json!({
                    "format": ScreenshotFormat::Png,
                    "captureBeyondViewport": full_page,
                })),
            )
            .await?;

        let data = result["data"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("missing screenshot data".to_string()))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| CdpError::InvalidResponse(format!("bad screenshot payload: {e}")))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        debug!("screenshot written to {}", path.display());
        Ok(())
    }

    pub async fn start_screencast(
        &self,
        max_width: u32,
        max_height: u32,
    ) -> Result<(), CdpError> {
        self.call(
            "Page.startScreencast",
            Some(json!({
                "format": ScreenshotFormat::Jpeg,
                "quality": 70,
                "maxWidth": max_width,
                "maxHeight": max_height,
                "everyNthFrame": 1,
            })),
        )
        .await?;
        Ok(())
    }

    pub async fn ack_screencast_frame(&self, frame_session: i64) -> Result<(), CdpError> {
        self.call(
            "Page.screencastFrameAck",
            Some(json!({"sessionId": frame_session})),
        )
        .await?;
        Ok(())
    }

    pub async fn stop_screencast(&self) -> Result<(), CdpError> {
        self.call("Page.stopScreencast", None).await?;
        Ok(())
    }

    /// Route screencast frames to `tx` until the sink is cleared.
    pub(crate) fn set_frame_sink(&self, tx: mpsc::UnboundedSender<ScreencastFrame>) {
        self.router.set_frame_sink(tx);
    }

    pub(crate) fn clear_frame_sink(&self) {
        self.router.clear_frame_sink();
    }

    // ========================================================================
    // Session persistence
    // ========================================================================

    pub async fn get_cookies(&self) -> Result<Vec<Cookie>, CdpError> {
        let result = self.call("Network.getCookies", None).await?;
        let cookies: Vec<Cookie> = serde_json::from_value(result["cookies"].clone())?;
        Ok(cookies)
    }

    pub async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), CdpError> {
        self.call(
            "Network.setCookies",
            Some(json!({"cookies": serde_json::to_value(cookies)?})),
        )
        .await?;
        Ok(())
    }

    /// Close the page target, flushing any in-progress capture.
    pub async fn close(&self) -> Result<(), CdpError> {
        self.call_browser(
            "Target.closeTarget",
            Some(json!({"targetId": self.target_id})),
        )
        .await?;
        Ok(())
    }
}

/// Center point of a CDP content quad (four x,y pairs).
fn quad_center(quad: &[f64]) -> (f64, f64) {
    if quad.len() >= 8 {
        let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
        let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
        (x, y)
    } else {
        (0.0, 0.0)
    }
}

/// Encode a Rust string as a JavaScript string literal.
fn js_string(s: &str) -> Result<String, CdpError> {
    Ok(serde_json::to_string(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_center_averages_corners() {
        let quad = vec![0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0];
        assert_eq!(quad_center(&quad), (50.0, 50.0));
    }

    #[test]
    fn quad_center_tolerates_short_quads() {
        assert_eq!(quad_center(&[1.0, 2.0]), (0.0, 0.0));
    }

    #[test]
    fn js_string_escapes_quotes() {
        let encoded = js_string("a'b\"c").unwrap();
        assert_eq!(encoded, "\"a'b\\\"c\"");
    }
}
