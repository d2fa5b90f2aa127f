//! Page driver abstraction over the browser engine.
//!
//! [`PageDriver`] is the only surface extraction and checkout code talks to.
//! Two implementations exist: [`chromium::ChromiumPage`] drives a real
//! browser over CDP, [`html::HtmlPage`] replays captured HTML documents in
//! memory.

pub mod chromium;
pub mod html;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::ScraperError;
use crate::locator::Locator;

/// A single browser tab.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url` and wait for the load to settle.
    async fn goto(&self, url: &str) -> Result<(), ScraperError>;

    /// The URL currently shown, after any redirects.
    async fn current_url(&self) -> Result<String, ScraperError>;

    /// Wait up to `timeout` for the first element matching `locator` and
    /// return its trimmed text, or the requested attribute.
    ///
    /// Returns `Ok(None)` if no element appeared in time. A present element
    /// with no text (or without the attribute) yields `Ok(Some(""))`.
    async fn find_value(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<String>, ScraperError>;

    /// Trimmed text of every element currently matching `css`, in document order.
    async fn find_all_text(&self, css: &str) -> Result<Vec<String>, ScraperError>;

    /// For every element currently matching `css`, the value of the first
    /// non-empty attribute among `attributes`.
    async fn find_all_attribute(
        &self,
        css: &str,
        attributes: &[&str],
    ) -> Result<Vec<Option<String>>, ScraperError>;

    /// Click the first element matching `locator`, waiting up to `timeout`
    /// for it to appear. Returns `Ok(false)` if it never did.
    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<bool, ScraperError>;

    /// Type `text` into the first element matching `locator`. Returns
    /// `Ok(false)` if it never appeared.
    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError>;

    /// Total scrollable height of the document in pixels.
    async fn scroll_height(&self) -> Result<u64, ScraperError>;

    async fn scroll_to(&self, y: u64) -> Result<(), ScraperError>;

    /// Save a snapshot of the current page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), ScraperError>;

    /// Tear down the tab and its browser. Called exactly once per session.
    async fn close(&self) -> Result<(), ScraperError>;
}

/// Starts a fresh browser session for one URL.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, ScraperError>;
}

/// Launch a session, run `operation` against it, and always close it.
///
/// Teardown runs on success, on error, and when `operation` panics; a panic
/// is resumed once the browser is gone. Close failures are logged, never
/// returned, so they cannot mask the operation's own outcome.
///
/// # Errors
///
/// Returns the launcher's error if the browser cannot start, otherwise
/// whatever `operation` returned.
pub async fn with_session<T, F, Fut>(
    launcher: &dyn BrowserLauncher,
    operation: F,
) -> Result<T, ScraperError>
where
    F: FnOnce(Arc<dyn PageDriver>) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let page: Arc<dyn PageDriver> = Arc::from(launcher.launch().await?);

    let outcome = AssertUnwindSafe(operation(Arc::clone(&page)))
        .catch_unwind()
        .await;

    if let Err(e) = page.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Poll interval while waiting for an element to appear.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(250);
