//! On-page notification and gate-overlay injection.
//!
//! Styles are injected once per page; the guard lives on the injector
//! instance owned by the page wrapper, not in module state.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;
use tracing::debug;

use reelflow_protocols::page::{MessageOptions, MessagePosition, MessageStyle};

use crate::error::CdpError;
use crate::session::PageSession;

const STYLE_SHEET: &str = r#"
@keyframes reelflow-slide-in {
  from { transform: translateY(-20px) scale(0.95); opacity: 0; }
  to { transform: translateY(0) scale(1); opacity: 1; }
}
@keyframes reelflow-fade-in {
  from { opacity: 0; }
  to { opacity: 1; }
}
.reelflow-backdrop {
  position: fixed; inset: 0;
  background: rgba(0, 0, 0, 0.8);
  backdrop-filter: blur(4px);
  z-index: 999998;
  animation: reelflow-fade-in 0.3s ease-out;
}
.reelflow-overlay {
  position: fixed;
  z-index: 999999;
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  animation: reelflow-slide-in 0.3s ease-out;
}
.reelflow-message {
  background: rgba(26, 26, 26, 0.95);
  color: #fff;
  padding: 12px 16px;
  border-radius: 8px;
  max-width: 450px;
  position: relative;
  box-shadow: 0 4px 16px rgba(0, 0, 0, 0.3);
}
.reelflow-message::before {
  content: 'reelflow';
  position: absolute;
  top: -10px; left: 0;
  color: #fff;
  padding: 2px 10px;
  border-radius: 10px;
  font-size: 11px;
  font-weight: bold;
  letter-spacing: 0.5px;
}
.reelflow-info::before { background: #3b82f6; }
.reelflow-warning::before { background: #f59e0b; }
.reelflow-error::before { background: #ef4444; }
.reelflow-success::before { background: #10b981; }
.reelflow-message h3 {
  margin: 10px 0 4px 0;
  font-size: 16px;
  font-weight: 600;
}
.reelflow-message p {
  margin: 10px 0 0 0;
  font-size: 14px;
  line-height: 1.5;
  white-space: pre-wrap;
}
.reelflow-close {
  position: absolute;
  top: 8px; right: 8px;
  width: 22px; height: 22px;
  border: none;
  border-radius: 50%;
  background: rgba(0, 0, 0, 0.6);
  color: #fff;
  font-size: 15px;
  line-height: 22px;
  text-align: center;
  cursor: pointer;
}
.reelflow-progress {
  margin-top: 12px;
  height: 4px;
  background: #e5e7eb;
  border-radius: 2px;
  overflow: hidden;
}
.reelflow-progress-bar {
  height: 100%; width: 0;
  background: #3b82f6;
  transition: width 0.3s ease;
}
"#;

/// Injects styled notifications and the manual-gate overlay into a page.
pub struct OverlayInjector {
    styles_injected: AtomicBool,
}

impl Default for OverlayInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayInjector {
    pub fn new() -> Self {
        Self {
            styles_injected: AtomicBool::new(false),
        }
    }

    /// Inject the stylesheet once; repeated calls are cheap no-ops.
    async fn ensure_styles(&self, session: &PageSession) -> Result<(), CdpError> {
        if self.styles_injected.load(Ordering::Acquire) {
            return Ok(());
        }

        let script = format!(
            r#"(() => {{
                if (document.getElementById('reelflow-styles')) return;
                const style = document.createElement('style');
                style.id = 'reelflow-styles';
                style.textContent = {css};
                document.head.appendChild(style);
            }})()"#,
            css = serde_json::to_string(STYLE_SHEET)?,
        );
        session.evaluate(&script).await?;
        self.styles_injected.store(true, Ordering::Release);
        debug!("overlay styles injected");
        Ok(())
    }

    /// Show a transient notification, replacing any existing overlay.
    pub async fn show_message(
        &self,
        session: &PageSession,
        options: &MessageOptions,
    ) -> Result<(), CdpError> {
        self.ensure_styles(session).await?;

        let payload = json!({
            "message": options.message,
            "title": options.title,
            "position": position_name(options.position.unwrap_or(MessagePosition::TopLeft)),
            "duration": options.duration_ms,
            "style": style_name(options.style),
            "closeButton": options.close_button,
            "backdrop": options.backdrop,
            "progress": options.progress,
        });

        let script = format!(
            r#"((opts) => {{
                document
                    .querySelectorAll('.reelflow-overlay, .reelflow-backdrop')
                    .forEach((el) => el.remove());

                if (opts.backdrop) {{
                    const backdrop = document.createElement('div');
                    backdrop.className = 'reelflow-backdrop';
                    document.body.appendChild(backdrop);
                }}

                const overlay = document.createElement('div');
                overlay.className = 'reelflow-overlay';
                const pos = opts.position;
                if (pos.startsWith('top')) overlay.style.top = '20px';
                if (pos.startsWith('bottom')) overlay.style.bottom = '20px';
                if (pos.endsWith('left')) overlay.style.left = '20px';
                if (pos.endsWith('right')) overlay.style.right = '20px';
                if (pos.endsWith('center') || pos === 'center') {{
                    overlay.style.left = '50%';
                    overlay.style.transform = 'translateX(-50%)';
                }}
                if (pos === 'center') overlay.style.top = '40%';

                const box = document.createElement('div');
                box.className = 'reelflow-message reelflow-' + opts.style;

                let html = '';
                if (opts.closeButton) html += '<button class="reelflow-close">×</button>';
                if (opts.title) html += '<h3></h3>';
                html += '<p></p>';
                if (opts.progress) {{
                    html += '<div class="reelflow-progress"><div class="reelflow-progress-bar"></div></div>';
                }}
                box.innerHTML = html;
                if (opts.title) box.querySelector('h3').textContent = opts.title;
                box.querySelector('p').textContent = opts.message;

                overlay.appendChild(box);
                document.body.appendChild(overlay);

                const close = overlay.querySelector('.reelflow-close');
                if (close) {{
                    close.addEventListener('click', () => {{
                        overlay.remove();
                        document.querySelector('.reelflow-backdrop')?.remove();
                    }});
                }}

                if (opts.duration > 0) {{
                    setTimeout(() => {{
                        overlay.remove();
                        document.querySelector('.reelflow-backdrop')?.remove();
                    }}, opts.duration);
                }}
            }})({payload})"#,
        );
        session.evaluate(&script).await?;
        Ok(())
    }

    /// Show the blocking gate overlay: backdrop on, no close affordance, no
    /// auto-hide.
    pub async fn show_overlay(
        &self,
        session: &PageSession,
        options: &MessageOptions,
    ) -> Result<(), CdpError> {
        let mut options = options.clone();
        options.duration_ms = 0;
        options.close_button = false;
        options.backdrop = true;
        self.show_message(session, &options).await
    }

    /// Remove any overlay and backdrop.
    pub async fn remove(&self, session: &PageSession) -> Result<(), CdpError> {
        session
            .evaluate(
                "document.querySelectorAll('.reelflow-overlay, .reelflow-backdrop')\
                 .forEach((el) => el.remove())",
            )
            .await?;
        Ok(())
    }
}

fn style_name(style: MessageStyle) -> &'static str {
    match style {
        MessageStyle::Info => "info",
        MessageStyle::Warning => "warning",
        MessageStyle::Error => "error",
        MessageStyle::Success => "success",
    }
}

fn position_name(position: MessagePosition) -> &'static str {
    match position {
        MessagePosition::TopLeft => "top-left",
        MessagePosition::TopCenter => "top-center",
        MessagePosition::TopRight => "top-right",
        MessagePosition::BottomLeft => "bottom-left",
        MessagePosition::BottomCenter => "bottom-center",
        MessagePosition::BottomRight => "bottom-right",
        MessagePosition::Center => "center",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_and_position_names_match_wire_format() {
        assert_eq!(style_name(MessageStyle::Warning), "warning");
        assert_eq!(position_name(MessagePosition::BottomRight), "bottom-right");
        // Must agree with the serde wire names used in action JSON.
        assert_eq!(
            serde_json::to_value(MessagePosition::BottomRight).unwrap(),
            position_name(MessagePosition::BottomRight)
        );
        assert_eq!(
            serde_json::to_value(MessageStyle::Warning).unwrap(),
            style_name(MessageStyle::Warning)
        );
    }

    #[test]
    fn stylesheet_defines_overlay_classes() {
        for class in [
            ".reelflow-overlay",
            ".reelflow-backdrop",
            ".reelflow-message",
            ".reelflow-close",
            ".reelflow-progress",
        ] {
            assert!(STYLE_SHEET.contains(class), "missing {class}");
        }
    }
}
