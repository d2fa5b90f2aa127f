//! In-memory page driver over captured HTML documents.
//!
//! `HtmlPage` answers queries by parsing stored markup with the `scraper`
//! crate. Clicks on routed selectors navigate to another stored document,
//! everything else is recorded in [`HtmlPage::actions`]. Screenshots write
//! the current markup to disk. Useful for offline runs and tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::{BrowserLauncher, PageDriver};
use crate::error::ScraperError;
use crate::locator::Locator;

const DEFAULT_SCROLL_HEIGHT: u64 = 1200;

/// Something the caller did to the page, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Goto(String),
    Click(String),
    Type { css: String, text: String },
    ScrollTo(u64),
    Screenshot(PathBuf),
}

#[derive(Debug, Default)]
struct PageState {
    url: Option<String>,
    html: String,
    actions: Vec<PageAction>,
}

pub struct HtmlPage {
    documents: HashMap<String, String>,
    click_routes: HashMap<String, String>,
    scroll_height: u64,
    state: Mutex<PageState>,
    close_counter: Option<Arc<AtomicU32>>,
}

impl Default for HtmlPage {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlPage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            click_routes: HashMap::new(),
            scroll_height: DEFAULT_SCROLL_HEIGHT,
            state: Mutex::new(PageState::default()),
            close_counter: None,
        }
    }

    /// Serve `html` when `url` is opened.
    #[must_use]
    pub fn with_document(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.documents.insert(url.into(), html.into());
        self
    }

    /// Clicking an element matched by `selector` opens `url`.
    #[must_use]
    pub fn with_click_route(mut self, selector: &str, url: impl Into<String>) -> Self {
        self.click_routes
            .insert(Locator::parse(selector).to_css(), url.into());
        self
    }

    #[must_use]
    pub fn with_scroll_height(mut self, height: u64) -> Self {
        self.scroll_height = height;
        self
    }

    #[must_use]
    pub fn actions(&self) -> Vec<PageAction> {
        self.state().actions.clone()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, action: PageAction) {
        self.state().actions.push(action);
    }

    fn open(&self, url: &str) -> Result<(), ScraperError> {
        let html = self
            .documents
            .get(url)
            .ok_or_else(|| ScraperError::Navigation {
                url: url.to_owned(),
                reason: "no document recorded for this URL".to_owned(),
            })?;
        let mut state = self.state();
        state.url = Some(url.to_owned());
        state.html.clone_from(html);
        Ok(())
    }

    /// Runs `read` against the current document. Parsing happens inside this
    /// call so no `Html` value is held across an await point.
    fn query<T>(
        &self,
        css: &str,
        read: impl FnOnce(Vec<ElementRef<'_>>) -> T,
    ) -> Result<T, ScraperError> {
        let selector = Selector::parse(css).map_err(|e| ScraperError::InvalidSelector {
            selector: css.to_owned(),
            reason: format!("{e:?}"),
        })?;
        let html = self.state().html.clone();
        let document = Html::parse_document(&html);
        Ok(read(document.select(&selector).collect()))
    }

    fn is_present(&self, css: &str) -> Result<bool, ScraperError> {
        self.query(css, |elements| !elements.is_empty())
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl PageDriver for HtmlPage {
    async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        self.record(PageAction::Goto(url.to_owned()));
        self.open(url)
    }

    async fn current_url(&self) -> Result<String, ScraperError> {
        Ok(self.state().url.clone().unwrap_or_default())
    }

    async fn find_value(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<Option<String>, ScraperError> {
        self.query(&locator.to_css(), |elements| {
            elements.first().map(|el| match locator.attribute() {
                Some(attribute) => el.value().attr(attribute).unwrap_or("").trim().to_owned(),
                None => element_text(el),
            })
        })
    }

    async fn find_all_text(&self, css: &str) -> Result<Vec<String>, ScraperError> {
        self.query(css, |elements| elements.iter().map(element_text).collect())
    }

    async fn find_all_attribute(
        &self,
        css: &str,
        attributes: &[&str],
    ) -> Result<Vec<Option<String>>, ScraperError> {
        self.query(css, |elements| {
            elements
                .iter()
                .map(|el| {
                    attributes
                        .iter()
                        .filter_map(|name| el.value().attr(name))
                        .find(|value| !value.is_empty())
                        .map(str::to_owned)
                })
                .collect()
        })
    }

    async fn click(&self, locator: &Locator, _timeout: Duration) -> Result<bool, ScraperError> {
        let css = locator.to_css();
        if !self.is_present(&css)? {
            return Ok(false);
        }
        self.record(PageAction::Click(css.clone()));
        if let Some(target) = self.click_routes.get(&css) {
            self.open(target)?;
        }
        Ok(true)
    }

    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        _timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let css = locator.to_css();
        if !self.is_present(&css)? {
            return Ok(false);
        }
        self.record(PageAction::Type {
            css,
            text: text.to_owned(),
        });
        Ok(true)
    }

    async fn scroll_height(&self) -> Result<u64, ScraperError> {
        Ok(self.scroll_height)
    }

    async fn scroll_to(&self, y: u64) -> Result<(), ScraperError> {
        self.record(PageAction::ScrollTo(y));
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), ScraperError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let html = self.state().html.clone();
        tokio::fs::write(path, html).await?;
        self.record(PageAction::Screenshot(path.to_path_buf()));
        Ok(())
    }

    async fn close(&self) -> Result<(), ScraperError> {
        if let Some(counter) = &self.close_counter {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Hands out a fresh [`HtmlPage`] per session and counts sessions.
pub struct HtmlLauncher {
    factory: Box<dyn Fn() -> HtmlPage + Send + Sync>,
    launches: AtomicU32,
    closes: Arc<AtomicU32>,
}

impl HtmlLauncher {
    pub fn new(factory: impl Fn() -> HtmlPage + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            launches: AtomicU32::new(0),
            closes: Arc::new(AtomicU32::new(0)),
        }
    }

    #[must_use]
    pub fn launch_count(&self) -> u32 {
        self.launches.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for HtmlLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, ScraperError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let mut page = (self.factory)();
        page.close_counter = Some(Arc::clone(&self.closes));
        Ok(Box::new(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: &str = r#"
        <html><body>
          <h1 id="title">  Espresso
             Machine </h1>
          <img class="thumb" src="https://img.test/a.jpg">
          <img class="thumb" data-src="https://img.test/b.jpg">
          <img class="thumb">
          <button id="buy">Add to Cart</button>
          <select name="quantity"><option>1</option></select>
        </body></html>
    "#;

    fn page() -> HtmlPage {
        HtmlPage::new()
            .with_document("https://shop.test/p/1", PRODUCT)
            .with_document("https://shop.test/cart", "<h2>Your cart</h2>")
            .with_click_route("id:buy", "https://shop.test/cart")
    }

    #[tokio::test]
    async fn text_is_whitespace_normalized() {
        let page = page();
        page.goto("https://shop.test/p/1").await.unwrap();
        let title = page
            .find_value(&Locator::parse("#title"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(title.as_deref(), Some("Espresso Machine"));
    }

    #[tokio::test]
    async fn missing_element_is_none() {
        let page = page();
        page.goto("https://shop.test/p/1").await.unwrap();
        let value = page
            .find_value(&Locator::parse("#price"), Duration::ZERO)
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn attribute_fallbacks_per_element() {
        let page = page();
        page.goto("https://shop.test/p/1").await.unwrap();
        let values = page
            .find_all_attribute("img.thumb", &["src", "data-src"])
            .await
            .unwrap();
        assert_eq!(
            values,
            vec![
                Some("https://img.test/a.jpg".to_owned()),
                Some("https://img.test/b.jpg".to_owned()),
                None,
            ]
        );
    }

    #[tokio::test]
    async fn routed_click_navigates() {
        let page = page();
        page.goto("https://shop.test/p/1").await.unwrap();
        let clicked = page
            .click(&Locator::parse("id:buy"), Duration::ZERO)
            .await
            .unwrap();
        assert!(clicked);
        assert_eq!(page.current_url().await.unwrap(), "https://shop.test/cart");
    }

    #[tokio::test]
    async fn click_on_absent_element_returns_false() {
        let page = page();
        page.goto("https://shop.test/cart").await.unwrap();
        let clicked = page
            .click(&Locator::parse("id:buy"), Duration::ZERO)
            .await
            .unwrap();
        assert!(!clicked);
        assert!(!page
            .actions()
            .iter()
            .any(|a| matches!(a, PageAction::Click(_))));
    }

    #[tokio::test]
    async fn typing_is_recorded() {
        let page = page();
        page.goto("https://shop.test/p/1").await.unwrap();
        let typed = page
            .type_text(&Locator::parse("name:quantity"), "5", Duration::ZERO)
            .await
            .unwrap();
        assert!(typed);
        assert!(page.actions().contains(&PageAction::Type {
            css: "[name=\"quantity\"]".to_owned(),
            text: "5".to_owned(),
        }));
    }

    #[tokio::test]
    async fn unknown_url_is_navigation_error() {
        let err = page().goto("https://shop.test/nope").await.unwrap_err();
        assert!(matches!(err, ScraperError::Navigation { .. }));
    }

    #[tokio::test]
    async fn malformed_selector_is_reported() {
        let page = page();
        page.goto("https://shop.test/p/1").await.unwrap();
        let err = page.find_all_text("div[").await.unwrap_err();
        assert!(matches!(err, ScraperError::InvalidSelector { .. }));
    }

    #[tokio::test]
    async fn screenshot_writes_current_markup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots").join("cart.png");
        let page = page();
        page.goto("https://shop.test/cart").await.unwrap();
        page.screenshot(&path).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Your cart"));
    }
}
