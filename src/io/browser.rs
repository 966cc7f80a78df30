use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{PipelineError, Result};
use crate::io::{FetchedPage, PageFetcher, FETCH_TIMEOUT};

/// Renders the page in headless Chromium: DOM after load, body `innerText`,
/// full-page PNG
#[derive(Debug, Clone)]
pub struct BrowserPageFetcher {
    executable: Option<PathBuf>,
    timeout: Duration,
}

impl BrowserPageFetcher {
    /// Auto-detect the Chromium executable
    pub fn new() -> Self {
        Self {
            executable: None,
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .request_timeout(self.timeout);
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder
            .build()
            .map_err(|e| PipelineError::Config(format!("no usable browser: {e}")))
    }

    /// Whether a browser executable could be located
    pub fn is_available(&self) -> bool {
        self.config().is_ok()
    }
}

impl Default for BrowserPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for BrowserPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        info!("Navigating to {} in headless browser", url);

        let (mut browser, mut handler) = Browser::launch(self.config()?)
            .await
            .map_err(|e| PipelineError::Transport(format!("failed to launch browser: {e}")))?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let captured = tokio::time::timeout(self.timeout, capture(&browser, url)).await;

        if let Err(e) = browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        browser.wait().await.ok();
        events.await.ok();

        let page = captured.map_err(|_| PipelineError::FetchTimeout {
            url: url.to_string(),
            seconds: self.timeout.as_secs(),
        })??;
        debug!(
            "Rendered {} bytes of HTML, {} chars of text, {} byte screenshot",
            page.html.len(),
            page.text.chars().count(),
            page.screenshot.as_ref().map_or(0, Vec::len)
        );
        Ok(page)
    }
}

async fn capture(browser: &Browser, url: &Url) -> Result<FetchedPage> {
    let page = browser.new_page(url.as_str()).await.map_err(browser_error)?;
    page.wait_for_navigation().await.map_err(browser_error)?;

    let html = page.content().await.map_err(browser_error)?;
    let text = page
        .find_element("body")
        .await
        .map_err(browser_error)?
        .inner_text()
        .await
        .map_err(browser_error)?
        .unwrap_or_default();
    let screenshot = page
        .screenshot(
            ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(true)
                .build(),
        )
        .await
        .map_err(browser_error)?;

    Ok(FetchedPage {
        html,
        text,
        screenshot: Some(screenshot),
    })
}

fn browser_error(e: CdpError) -> PipelineError {
    PipelineError::Transport(format!("browser error: {e}"))
}
