//! Chromium-backed page driver using chromiumoxide.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use rand::seq::IndexedRandom;
use serde::de::DeserializeOwned;
use shelfscan_core::ScraperSettings;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{BrowserLauncher, PageDriver, POLL_INTERVAL};
use crate::error::ScraperError;
use crate::locator::Locator;

/// Desktop user agents rotated per session when none is configured.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
];

const WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// Hides the automation flag before any page script runs.
const WEBDRIVER_MASK: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

#[must_use]
pub fn random_user_agent() -> String {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
        .to_owned()
}

/// Launches one Chromium process per session.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    chrome_path: Option<PathBuf>,
    user_agent: Option<String>,
    timeout: Duration,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn from_settings(settings: &ScraperSettings) -> Self {
        Self {
            headless: settings.headless,
            chrome_path: settings.chrome_path.clone(),
            user_agent: settings.user_agent.clone(),
            timeout: settings.timeout(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, ScraperError> {
        let user_agent = self.user_agent.clone().unwrap_or_else(random_user_agent);

        let mut builder = BrowserConfig::builder()
            .request_timeout(self.timeout)
            .window_size(WINDOW_SIZE.0, WINDOW_SIZE.1)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={user_agent}"));
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(ScraperError::BrowserLaunch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, ScraperError> {
        let config = self.browser_config()?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::BrowserLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(ScraperError::BrowserLaunch(format!(
                    "failed to open a tab: {e}"
                )));
            }
        };
        if let Err(e) = page.evaluate_on_new_document(WEBDRIVER_MASK).await {
            tracing::debug!(error = %e, "could not install webdriver mask");
        }

        tracing::debug!(headless = self.headless, "browser session started");
        Ok(Box::new(ChromiumPage {
            browser: Mutex::new(browser),
            page,
            handler_task,
            timeout: self.timeout,
        }))
    }
}

/// A single Chromium tab plus the browser process that owns it.
pub struct ChromiumPage {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    timeout: Duration,
}

impl ChromiumPage {
    async fn eval_json<T: DeserializeOwned + Send>(&self, script: &str) -> Result<T, ScraperError> {
        let raw: String = self
            .page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| ScraperError::Driver(format!("unexpected script result: {e:?}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| ScraperError::Driver(format!("unexpected script result: {e}")))
    }

    /// Polls until `css` matches something or `timeout` elapses.
    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<bool, ScraperError> {
        let script = format!(
            "JSON.stringify(document.querySelector({}) !== null)",
            js_string(css)
        );
        let deadline = Instant::now() + timeout;
        loop {
            if self.eval_json::<bool>(&script).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        let result = tokio::time::timeout(self.timeout, self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => {
                if let Err(e) = self.page.wait_for_navigation().await {
                    tracing::debug!(url, error = %e, "navigation did not settle");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(ScraperError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ScraperError::Timeout {
                operation: format!("navigation to {url}"),
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        Ok(self
            .page
            .url()
            .await?
            .map(|u| u.to_string())
            .unwrap_or_default())
    }

    async fn find_value(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<String>, ScraperError> {
        let read = match locator.attribute() {
            Some(attribute) => format!("(el.getAttribute({}) || '')", js_string(attribute)),
            None => "(el.innerText || el.textContent || '')".to_owned(),
        };
        let script = format!(
            "(() => {{ const el = document.querySelector({}); \
             return JSON.stringify(el ? {read}.trim() : null); }})()",
            js_string(&locator.to_css())
        );

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = self.eval_json::<Option<String>>(&script).await? {
                return Ok(Some(value));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_all_text(&self, css: &str) -> Result<Vec<String>, ScraperError> {
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})) \
             .map(el => (el.innerText || el.textContent || '').trim()))",
            js_string(css)
        );
        self.eval_json(&script).await
    }

    async fn find_all_attribute(
        &self,
        css: &str,
        attributes: &[&str],
    ) -> Result<Vec<Option<String>>, ScraperError> {
        let attributes = serde_json::to_string(attributes)
            .map_err(|e| ScraperError::Driver(e.to_string()))?;
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map(el => {{ \
             for (const name of {attributes}) {{ const v = el.getAttribute(name); if (v) return v; }} \
             return null; }}))",
            js_string(css)
        );
        self.eval_json(&script).await
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<bool, ScraperError> {
        let css = locator.to_css();
        if !self.wait_for(&css, timeout).await? {
            return Ok(false);
        }
        self.page.find_element(css).await?.click().await?;
        Ok(true)
    }

    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let css = locator.to_css();
        if !self.wait_for(&css, timeout).await? {
            return Ok(false);
        }
        let element = self.page.find_element(css).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(true)
    }

    async fn scroll_height(&self) -> Result<u64, ScraperError> {
        self.eval_json("JSON.stringify(document.body ? document.body.scrollHeight : 0)")
            .await
    }

    async fn scroll_to(&self, y: u64) -> Result<(), ScraperError> {
        self.page
            .evaluate(format!("window.scrollTo(0, {y})").as_str())
            .await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), ScraperError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ScraperError> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "browser process did not exit cleanly");
        }
        self.handler_task.abort();
        closed?;
        tracing::debug!("browser session closed");
        Ok(())
    }
}

/// Encodes `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}
