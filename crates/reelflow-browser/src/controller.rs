//! Browser process lifecycle: find, launch, connect, shut down.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use serde_json::json;
use tokio::process::{Child, Command};
use tokio::sync::RwLock;
use tracing::{info, warn};

use reelflow_config::BrowserConfig;

use crate::client::CdpClient;
use crate::error::BrowserError;
use crate::session::PageSession;

pub const DEFAULT_DEBUG_PORT: u16 = 9222;

/// Owns one browser instance for the duration of a run.
///
/// If nothing is listening on the debug port the controller launches its own
/// Chromium with an isolated profile and kills it on shutdown; an already
/// running browser is reused and left alone.
pub struct BrowserController {
    config: BrowserConfig,
    debug_port: u16,
    client: RwLock<Option<Arc<CdpClient>>>,
    /// Browser process handle, if we launched it.
    process: RwLock<Option<Child>>,
}

impl BrowserController {
    pub fn new(config: BrowserConfig) -> Self {
        Self::with_port(config, DEFAULT_DEBUG_PORT)
    }

    pub fn with_port(config: BrowserConfig, debug_port: u16) -> Self {
        Self {
            config,
            debug_port,
            client: RwLock::new(None),
            process: RwLock::new(None),
        }
    }

    fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.debug_port)
    }

    /// Find a Chromium-family executable.
    pub fn find_browser() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let paths = [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        paths.iter().map(PathBuf::from).find(|p| p.exists())
    }

    fn profile_dir(&self) -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("reelflow")
            .join(format!("profile-{}", self.debug_port))
    }

    async fn is_browser_running(&self) -> bool {
        reqwest::get(format!("{}/json/version", self.endpoint()))
            .await
            .is_ok()
    }

    async fn launch_browser(&self) -> Result<Child, BrowserError> {
        let browser_path = Self::find_browser().ok_or(BrowserError::BrowserNotFound)?;
        let profile_dir = self.profile_dir();

        if let Err(e) = std::fs::create_dir_all(&profile_dir) {
            warn!("failed to create profile directory: {e}");
        }

        info!("launching browser with profile at {}", profile_dir.display());

        let mut cmd = Command::new(&browser_path);
        cmd.arg(format!("--remote-debugging-port={}", self.debug_port))
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg(format!(
                "--window-size={},{}",
                self.config.viewport.width, self.config.viewport.height
            ))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--metrics-recording-only")
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if self.config.headless {
            cmd.arg("--headless=new");
        }

        let child = cmd
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
        info!("browser launched with PID {:?}", child.id());
        Ok(child)
    }

    /// Connect to the browser, launching it if necessary.
    pub async fn connect(&self) -> Result<(), BrowserError> {
        if self.client.read().await.is_some() {
            return Ok(());
        }

        if !self.is_browser_running().await {
            info!(
                "no browser on port {}, launching one",
                self.debug_port
            );
            let child = self.launch_browser().await?;
            *self.process.write().await = Some(child);

            let mut attempts = 0;
            while attempts < 30 {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                if self.is_browser_running().await {
                    break;
                }
                attempts += 1;
            }
            if attempts >= 30 {
                return Err(BrowserError::LaunchFailed(
                    "browser did not start within timeout".to_string(),
                ));
            }
        } else {
            info!("reusing browser already on port {}", self.debug_port);
        }

        let client = CdpClient::connect(&self.endpoint()).await?;
        *self.client.write().await = Some(Arc::new(client));
        Ok(())
    }

    async fn client(&self) -> Result<Arc<CdpClient>, BrowserError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(BrowserError::NotConnected)
    }

    /// Open a fresh page sized to the configured viewport.
    pub async fn open_page(&self) -> Result<Arc<PageSession>, BrowserError> {
        let client = self.client().await?;
        let session = client.new_page().await?;

        session
            .call(
                "Emulation.setDeviceMetricsOverride",
                Some(json!({
                    "width": self.config.viewport.width,
                    "height": self.config.viewport.height,
                    "deviceScaleFactor": 1,
                    "mobile": false,
                })),
            )
            .await?;

        Ok(Arc::new(session))
    }

    /// Drop the CDP connection and kill the browser if we launched it.
    pub async fn shutdown(&self) -> Result<(), BrowserError> {
        let _ = self.client.write().await.take();
        if let Some(mut child) = self.process.write().await.take() {
            info!("shutting down browser");
            let _ = child.kill().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelflow_config::{Dimensions, RecordingConfig};

    fn config() -> BrowserConfig {
        RecordingConfig::default().browser
    }

    #[test]
    fn endpoint_uses_configured_port() {
        let controller = BrowserController::with_port(config(), 9321);
        assert_eq!(controller.endpoint(), "http://127.0.0.1:9321");
    }

    #[test]
    fn profile_dir_is_port_scoped() {
        let a = BrowserController::with_port(config(), 9222);
        let b = BrowserController::with_port(config(), 9223);
        assert_ne!(a.profile_dir(), b.profile_dir());
        assert!(a.profile_dir().ends_with("reelflow/profile-9222"));
    }

    #[test]
    fn viewport_comes_from_config() {
        let mut cfg = config();
        cfg.viewport = Dimensions {
            width: 1280,
            height: 720,
        };
        let controller = BrowserController::new(cfg);
        assert_eq!(controller.config.viewport.width, 1280);
    }
}
