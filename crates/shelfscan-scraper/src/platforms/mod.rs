//! Platform extractors and URL → extractor dispatch.

pub mod amazon;

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use shelfscan_core::{
    CheckoutScenario, PlatformSelectors, ProductData, ScrapedResult, SelectorConfig, Settings,
};

use crate::driver::PageDriver;
use crate::error::ScraperError;
use crate::pacing::HumanPacing;

pub use amazon::AmazonScraper;

/// Capability set every platform implements.
#[async_trait]
pub trait PlatformScraper: Send + Sync {
    /// Selector-file key and screenshot prefix, e.g. `"amazon"`.
    fn platform(&self) -> &'static str;

    /// Store identifier recorded on results, e.g. `"amazon.com"`.
    fn store(&self) -> &'static str;

    /// Load `url`, extract the product and run every checkout scenario.
    ///
    /// # Errors
    ///
    /// Returns an error only when the page itself cannot be loaded; field
    /// and checkout failures are folded into the result.
    async fn scrape_product(
        &self,
        page: &dyn PageDriver,
        url: &str,
    ) -> Result<ScrapedResult, ScraperError>;

    /// Simulate buying `quantity` units of `product`.
    async fn simulate_checkout(
        &self,
        page: &dyn PageDriver,
        product: &ProductData,
        quantity: u32,
    ) -> CheckoutScenario;
}

/// Run-wide knobs shared by every platform extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOptions {
    /// Wait per selector during field extraction.
    pub field_timeout: Duration,
    /// Wait for checkout controls.
    pub control_timeout: Duration,
    pub pacing: HumanPacing,
    pub checkout_quantities: Vec<u32>,
    pub screenshots_dir: PathBuf,
}

impl ScrapeOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            field_timeout: settings.scraper.field_timeout(),
            control_timeout: settings.scraper.timeout(),
            pacing: HumanPacing::from_settings(&settings.scraper),
            checkout_quantities: settings.scraper.checkout_quantities.clone(),
            screenshots_dir: settings.output.screenshots_dir.clone(),
        }
    }
}

/// Builds the scraper for one registered platform.
pub type Constructor = fn(&PlatformSelectors, &ScrapeOptions) -> Box<dyn PlatformScraper>;

struct Registration {
    keyword: &'static str,
    constructor: Option<Constructor>,
}

/// Platforms that are recognised but not implemented yet.
pub const PLANNED_PLATFORMS: [&str; 6] =
    ["aliexpress", "ebay", "etsy", "jumia", "kilimall", "jiji"];

static DOMAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://(?:www\.)?([^/]+)").expect("valid regex"));

/// Host of `url` without a leading `www.`, lower-cased. Empty when the URL
/// has no `http(s)://` prefix.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    DOMAIN
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default()
}

/// Maps a URL's domain to the extractor that understands it.
pub struct ScraperFactory {
    registry: Vec<Registration>,
    selectors: SelectorConfig,
    options: ScrapeOptions,
}

impl ScraperFactory {
    /// Factory with Amazon implemented and the planned platforms registered
    /// as placeholders.
    #[must_use]
    pub fn new(selectors: SelectorConfig, options: ScrapeOptions) -> Self {
        let mut factory = Self {
            registry: Vec::new(),
            selectors,
            options,
        };
        factory.register(amazon::PLATFORM, amazon_constructor);
        for keyword in PLANNED_PLATFORMS {
            factory.register_placeholder(keyword);
        }
        factory
    }

    /// Adds (or replaces) the extractor for URLs whose domain contains `keyword`.
    pub fn register(&mut self, keyword: &'static str, constructor: Constructor) {
        self.upsert(keyword, Some(constructor));
    }

    pub fn register_placeholder(&mut self, keyword: &'static str) {
        self.upsert(keyword, None);
    }

    fn upsert(&mut self, keyword: &'static str, constructor: Option<Constructor>) {
        match self.registry.iter_mut().find(|r| r.keyword == keyword) {
            Some(existing) => existing.constructor = constructor,
            None => self.registry.push(Registration {
                keyword,
                constructor,
            }),
        }
    }

    /// Extractor for `url`, or `None` if no implemented platform matches.
    #[must_use]
    pub fn create_scraper(&self, url: &str) -> Option<Box<dyn PlatformScraper>> {
        let domain = extract_domain(url);
        if domain.is_empty() {
            tracing::warn!(url, "could not determine domain");
            return None;
        }

        let Some(registration) = self
            .registry
            .iter()
            .find(|r| domain.contains(r.keyword))
        else {
            tracing::warn!(url, domain = %domain, "no scraper registered for domain");
            return None;
        };

        match registration.constructor {
            Some(constructor) => Some(constructor(
                &self.selectors.platform(registration.keyword),
                &self.options,
            )),
            None => {
                tracing::warn!(
                    platform = registration.keyword,
                    "platform scraper not implemented yet"
                );
                None
            }
        }
    }
}

fn amazon_constructor(
    selectors: &PlatformSelectors,
    options: &ScrapeOptions,
) -> Box<dyn PlatformScraper> {
    Box::new(AmazonScraper::new(selectors, options.clone()))
}
