//! Headless Chromium implementation of the render session, via `chromiumoxide`.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ratedeck_shared::{ExportConfig, RatedeckError, Result};

use crate::{PageContext, RenderSession};

/// A running engine process plus the task draining its CDP event stream.
struct EngineHandle {
    browser: Browser,
    event_loop: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// ChromiumSession
// ---------------------------------------------------------------------------

/// Process-wide headless Chromium session.
///
/// Lazily launched on first [`RenderSession::ensure_started`] call and reused
/// across generation requests. The mutex doubles as the start-state guard:
/// concurrent starts and stop-while-starting races serialize on it.
pub struct ChromiumSession {
    inner: Mutex<Option<EngineHandle>>,
}

impl ChromiumSession {
    /// Create a session handle. The engine process is not launched until
    /// `ensure_started()` is called.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    async fn launch() -> Result<EngineHandle> {
        // Sandboxing is disabled for constrained hosting environments
        // (containers without user namespaces).
        let config = BrowserConfig::builder()
            .no_sandbox()
            .args(vec!["--disable-gpu", "--disable-dev-shm-usage", "--hide-scrollbars"])
            .build()
            .map_err(RatedeckError::EngineStart)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RatedeckError::EngineStart(e.to_string()))?;

        // The handler stream must be polled for the CDP connection to make
        // progress; drain it until the browser shuts down.
        let event_loop = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "engine event stream error");
                }
            }
        });

        info!("headless engine started");
        Ok(EngineHandle {
            browser,
            event_loop,
        })
    }
}

impl Default for ChromiumSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn ensure_started(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        if guard.is_none() {
            *guard = Some(Self::launch().await?);
        }
        Ok(())
    }

    async fn new_page(&self) -> Result<Box<dyn PageContext>> {
        let guard = self.inner.lock().await;
        let handle = guard.as_ref().ok_or(RatedeckError::SessionNotReady)?;

        let page = handle
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RatedeckError::capture(format!("failed to open page context: {e}")))?;

        Ok(Box::new(ChromiumPage { page }))
    }

    async fn stop(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        if let Some(mut handle) = guard.take() {
            if let Err(e) = handle.browser.close().await {
                warn!(error = %e, "engine close failed, killing process");
            }
            let _ = handle.browser.wait().await;
            handle.event_loop.abort();
            info!("headless engine stopped");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChromiumPage
// ---------------------------------------------------------------------------

/// One isolated Chromium page (target) borrowed from the session.
struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PageContext for ChromiumPage {
    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(width as i64)
            .height(height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(RatedeckError::capture)?;

        self.page
            .execute(params)
            .await
            .map_err(|e| RatedeckError::capture(format!("viewport override failed: {e}")))?;
        Ok(())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let nav = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| RatedeckError::capture(format!("{url}: {e}")))?;
            // Wait for the load lifecycle, i.e. network activity mostly idle.
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| RatedeckError::capture(format!("{url}: load wait failed: {e}")))?;
            Ok(())
        };

        tokio::time::timeout(timeout, nav).await.map_err(|_| {
            RatedeckError::capture(format!(
                "{url}: navigation timed out after {}s",
                timeout.as_secs()
            ))
        })?
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        self.page
            .screenshot(params)
            .await
            .map_err(|e| RatedeckError::capture(format!("screenshot failed: {e}")))
    }

    async fn set_content(&self, html: &str) -> Result<()> {
        // Snapshot images are embedded as data URIs, so no network fetches
        // follow; content is ready as soon as the engine accepts it.
        self.page
            .set_content(html)
            .await
            .map_err(|e| RatedeckError::Export(format!("failed to load markup: {e}")))?;
        Ok(())
    }

    async fn print_to_pdf(&self, opts: &ExportConfig) -> Result<Vec<u8>> {
        let params = PrintToPdfParams {
            print_background: Some(opts.print_background),
            paper_width: Some(opts.paper_width_in),
            paper_height: Some(opts.paper_height_in),
            margin_top: Some(opts.margin_in),
            margin_bottom: Some(opts.margin_in),
            margin_left: Some(opts.margin_in),
            margin_right: Some(opts.margin_in),
            ..Default::default()
        };

        self.page
            .pdf(params)
            .await
            .map_err(|e| RatedeckError::Export(format!("print to PDF failed: {e}")))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page
            .close()
            .await
            .map_err(|e| RatedeckError::capture(format!("page close failed: {e}")))
    }
}
