//! Sequential scrape over a list of URLs.

use std::sync::Arc;
use std::time::Duration;

use shelfscan_core::{ScrapedResult, SelectorConfig, Settings};

use crate::driver::{with_session, BrowserLauncher};
use crate::platforms::{ScrapeOptions, ScraperFactory};
use crate::retry::{retry_with_backoff, RetryPolicy};

pub struct ScrapeRunner {
    factory: ScraperFactory,
    launcher: Arc<dyn BrowserLauncher>,
    retry: RetryPolicy,
    inter_request_delay: Duration,
}

impl ScrapeRunner {
    #[must_use]
    pub fn new(
        factory: ScraperFactory,
        launcher: Arc<dyn BrowserLauncher>,
        retry: RetryPolicy,
        inter_request_delay: Duration,
    ) -> Self {
        Self {
            factory,
            launcher,
            retry,
            inter_request_delay,
        }
    }

    /// Runner wired from loaded settings and selectors.
    #[must_use]
    pub fn from_settings(
        settings: &Settings,
        selectors: SelectorConfig,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self::new(
            ScraperFactory::new(selectors, ScrapeOptions::from_settings(settings)),
            launcher,
            RetryPolicy::from_settings(&settings.scraper),
            settings.scraper.inter_request_delay(),
        )
    }

    /// Scrape one URL in its own browser session. Never fails: unsupported
    /// platforms and errors that survive retries become failed results.
    pub async fn scrape_url(&self, url: &str) -> ScrapedResult {
        let Some(scraper) = self.factory.create_scraper(url) else {
            tracing::warn!(url, "unsupported platform");
            return ScrapedResult::unsupported(url);
        };
        let scraper = scraper.as_ref();

        let launcher = self.launcher.as_ref();
        let outcome = retry_with_backoff(&self.retry, move || {
            with_session(launcher, move |page| async move {
                scraper.scrape_product(page.as_ref(), url).await
            })
        })
        .await;

        match outcome {
            Ok(result) => {
                tracing::info!(url, scenarios = result.scenarios.len(), "scraped product");
                result
            }
            Err(e) => {
                tracing::error!(url, error = %e, "scrape failed after retries");
                ScrapedResult::failed(scraper.store(), url, e.to_string())
            }
        }
    }

    /// Scrape every URL in order, pausing between URLs.
    pub async fn scrape_urls(&self, urls: &[String]) -> Vec<ScrapedResult> {
        let mut results = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            tracing::info!(index = index + 1, total = urls.len(), url = %url, "processing URL");
            results.push(self.scrape_url(url).await);

            if index + 1 < urls.len() && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }
        }
        results
    }
}
