//! Amazon product pages.

use std::collections::BTreeMap;

use async_trait::async_trait;
use shelfscan_core::{CheckoutScenario, PlatformSelectors, ProductData, ScrapedResult};

use super::{PlatformScraper, ScrapeOptions};
use crate::checkout::{CheckoutProfile, CheckoutSimulator};
use crate::driver::PageDriver;
use crate::error::ScraperError;
use crate::extract::{fields, ProductExtractor, SelectorTable};

pub const PLATFORM: &str = "amazon";
pub const STORE: &str = "amazon.com";

const PROFILE: CheckoutProfile = CheckoutProfile {
    platform: PLATFORM,
    carrier: "Amazon",
    cart_path: "/gp/cart/view.html",
};

/// Built-in locators for fields the selector file usually leaves out.
/// Core listing fields (name, price, brand...) come from the file only.
const DEFAULT_SELECTORS: &[(&str, &[&str])] = &[
    (
        fields::BREADCRUMB,
        &[
            ".a-breadcrumb li:not(.a-breadcrumb-divider) a",
            "#wayfinding-breadcrumbs_feature_div li a",
        ],
    ),
    (fields::SKU_DETAILS, &[".prodDetTable tr", "#detailBullets_feature_div li"]),
    (
        fields::IMAGES,
        &["img[data-old-hires]", "#landingImage", ".a-dynamic-image"],
    ),
    (
        fields::AVAILABILITY,
        &["#availability .a-size-medium", "#availability span"],
    ),
    (
        fields::RATING,
        &[".a-icon-alt", "[data-hook='rating-out-of-text']"],
    ),
    (
        fields::REVIEW_COUNT,
        &["#acrCustomerReviewText", "[data-hook='total-review-count']"],
    ),
    (
        fields::SELLER,
        &["#merchant-info", ".a-link-normal.contributorNameID"],
    ),
    (fields::DELIVERY_OPTIONS, &[".a-radio-label", ".ship-option"]),
    (fields::ADD_TO_CART, &["id:add-to-cart-button"]),
    (fields::QUANTITY, &["name:quantity"]),
    (fields::PROCEED_TO_CHECKOUT, &["name:proceedToRetailCheckout"]),
];

pub struct AmazonScraper {
    extractor: ProductExtractor,
    checkout: CheckoutSimulator,
    options: ScrapeOptions,
}

impl AmazonScraper {
    #[must_use]
    pub fn new(configured: &PlatformSelectors, options: ScrapeOptions) -> Self {
        let table = SelectorTable::with_defaults(DEFAULT_SELECTORS, configured);
        Self {
            extractor: ProductExtractor::new(table.clone(), options.field_timeout),
            checkout: CheckoutSimulator::new(
                PROFILE,
                table,
                options.pacing,
                options.control_timeout,
                options.screenshots_dir.clone(),
            ),
            options,
        }
    }
}

#[async_trait]
impl PlatformScraper for AmazonScraper {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    fn store(&self) -> &'static str {
        STORE
    }

    async fn scrape_product(
        &self,
        page: &dyn PageDriver,
        url: &str,
    ) -> Result<ScrapedResult, ScraperError> {
        tracing::info!(url, "scraping product page");
        page.goto(url).await?;
        self.options.pacing.pause().await;
        if let Err(e) = self.options.pacing.human_scroll(page).await {
            tracing::debug!(error = %e, "scrolling failed");
        }

        let product = self.extractor.extract(page, url).await;

        let mut scenarios = BTreeMap::new();
        for &quantity in &self.options.checkout_quantities {
            let scenario = self.simulate_checkout(page, &product, quantity).await;
            scenarios.insert(scenario.scenario_name.clone(), scenario);
        }

        Ok(ScrapedResult::succeeded(STORE, url, product, scenarios))
    }

    async fn simulate_checkout(
        &self,
        page: &dyn PageDriver,
        product: &ProductData,
        quantity: u32,
    ) -> CheckoutScenario {
        self.checkout.simulate(page, product, quantity).await
    }
}
