//! Simulated add-to-cart → cart → checkout flow.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use shelfscan_core::{scenario_name, CheckoutScenario, DeliveryOption, ProductData};

use crate::driver::PageDriver;
use crate::error::ScraperError;
use crate::extract::{fields, SelectorTable};
use crate::locator::Locator;
use crate::pacing::HumanPacing;

const DELIVERY_KEYWORDS: [&str; 3] = ["delivery", "shipping", "ship"];

static PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£¥₦]\d+(?:,\d{3})*(?:\.\d+)?").expect("valid regex")
});
static ETA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*[-–]\s*\d+\s*(?:business\s+)?days").expect("valid regex")
});
static CONDITIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)on (?:eligible )?orders? over [$€£¥₦]?\d+(?:\.\d+)?").expect("valid regex")
});

/// Platform constants the checkout flow needs.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutProfile {
    /// File-name prefix for screenshots.
    pub platform: &'static str,
    /// Delivery company reported on every parsed option.
    pub carrier: &'static str,
    /// Cart page path, joined onto the product URL's origin.
    pub cart_path: &'static str,
}

pub struct CheckoutSimulator {
    profile: CheckoutProfile,
    table: SelectorTable,
    pacing: HumanPacing,
    control_timeout: Duration,
    screenshots_dir: PathBuf,
}

impl CheckoutSimulator {
    #[must_use]
    pub fn new(
        profile: CheckoutProfile,
        table: SelectorTable,
        pacing: HumanPacing,
        control_timeout: Duration,
        screenshots_dir: PathBuf,
    ) -> Self {
        Self {
            profile,
            table,
            pacing,
            control_timeout,
            screenshots_dir,
        }
    }

    /// Run one scenario at `quantity`. Never fails: a mid-flow error is
    /// reported on the returned scenario with no delivery options.
    pub async fn simulate(
        &self,
        page: &dyn PageDriver,
        product: &ProductData,
        quantity: u32,
    ) -> CheckoutScenario {
        let name = scenario_name(quantity);
        match self.run(page, product, quantity).await {
            Ok((options, screenshot)) => {
                tracing::info!(
                    scenario = %name,
                    options = options.len(),
                    "checkout scenario completed"
                );
                CheckoutScenario::completed(name, options, screenshot)
            }
            Err(e) => {
                tracing::warn!(scenario = %name, error = %e, "checkout scenario failed");
                CheckoutScenario::failed(name, e.to_string())
            }
        }
    }

    async fn run(
        &self,
        page: &dyn PageDriver,
        product: &ProductData,
        quantity: u32,
    ) -> Result<(Vec<DeliveryOption>, Option<String>), ScraperError> {
        if page.current_url().await? != product.product_url {
            page.goto(&product.product_url).await?;
            self.pacing.pause().await;
        }

        if !self.click_first(page, fields::ADD_TO_CART).await {
            tracing::debug!("add-to-cart control not found, skipping");
        }

        let cart_url = cart_url(&product.product_url, self.profile.cart_path)?;
        page.goto(&cart_url).await?;
        self.pacing.pause().await;

        let typed = quantity.to_string();
        if quantity > 1 && !self.type_first(page, fields::QUANTITY, &typed).await {
            tracing::debug!("quantity control not found, skipping");
        }

        if !self.click_first(page, fields::PROCEED_TO_CHECKOUT).await {
            tracing::debug!("proceed-to-checkout control not found, skipping");
        }

        let options = self.delivery_options(page).await;
        let screenshot = self.capture(page, quantity).await;
        Ok((options, screenshot))
    }

    /// Clicks the first control for `field` that is present. A locator that
    /// errors is logged and skipped like a missing one.
    async fn click_first(&self, page: &dyn PageDriver, field: &str) -> bool {
        for locator in self.table.get(field) {
            match page.click(locator, self.control_timeout).await {
                Ok(true) => {
                    self.pacing.pause().await;
                    return true;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!(field, selector = %locator, error = %e, "click failed"),
            }
        }
        false
    }

    async fn type_first(&self, page: &dyn PageDriver, field: &str, text: &str) -> bool {
        for locator in self.table.get(field) {
            match page.type_text(locator, text, self.control_timeout).await {
                Ok(true) => {
                    self.pacing.pause().await;
                    return true;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!(field, selector = %locator, error = %e, "typing failed"),
            }
        }
        false
    }

    /// Option texts in document order. All locators are queried as one CSS
    /// selector group so an element matching several is read once.
    async fn delivery_options(&self, page: &dyn PageDriver) -> Vec<DeliveryOption> {
        let group: Vec<String> = self
            .table
            .get(fields::DELIVERY_OPTIONS)
            .iter()
            .map(Locator::to_css)
            .collect();
        if group.is_empty() {
            return Vec::new();
        }

        let texts = match page.find_all_text(&group.join(", ")).await {
            Ok(texts) => texts,
            Err(e) => {
                tracing::debug!(error = %e, "option selector group rejected, trying one by one");
                let mut usable = Vec::with_capacity(group.len());
                for css in group {
                    if let Err(e) = page.find_all_text(&css).await {
                        tracing::warn!(selector = %css, error = %e, "bad option selector");
                    } else {
                        usable.push(css);
                    }
                }
                if usable.is_empty() {
                    return Vec::new();
                }
                match page.find_all_text(&usable.join(", ")).await {
                    Ok(texts) => texts,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not read delivery options");
                        return Vec::new();
                    }
                }
            }
        };

        texts
            .iter()
            .filter_map(|text| parse_delivery_option(text, self.profile.carrier))
            .collect()
    }

    /// Best-effort snapshot; a failure is logged and yields `None`.
    async fn capture(&self, page: &dyn PageDriver, quantity: u32) -> Option<String> {
        let path = self.screenshots_dir.join(format!(
            "{}_{}_items_{}.png",
            self.profile.platform,
            quantity,
            chrono::Utc::now().timestamp()
        ));
        match page.screenshot(&path).await {
            Ok(()) => Some(path.display().to_string()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "screenshot failed");
                None
            }
        }
    }
}

/// The product URL's origin joined with `cart_path`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `product_url` is not absolute.
pub fn cart_url(product_url: &str, cart_path: &str) -> Result<String, ScraperError> {
    let invalid = |reason: String| ScraperError::InvalidUrl {
        url: product_url.to_owned(),
        reason,
    };
    let base = url::Url::parse(product_url).map_err(|e| invalid(e.to_string()))?;
    base.join(cart_path)
        .map(String::from)
        .map_err(|e| invalid(e.to_string()))
}

/// Turns one delivery-option text into a [`DeliveryOption`], or `None` when
/// the text does not mention delivery or shipping.
#[must_use]
pub fn parse_delivery_option(text: &str, carrier: &str) -> Option<DeliveryOption> {
    let lower = text.to_lowercase();
    if !DELIVERY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return None;
    }

    // A free-shipping threshold is a condition, not the option's price.
    let conditions = CONDITIONS.find(text);
    let priced = match conditions {
        Some(m) => format!("{} {}", &text[..m.start()], &text[m.end()..]),
        None => text.to_owned(),
    };

    Some(DeliveryOption {
        company: carrier.to_owned(),
        kind: classify_delivery(&lower).to_owned(),
        price: PRICE
            .find(&priced)
            .map_or_else(|| DeliveryOption::DEFAULT_PRICE.to_owned(), |m| m.as_str().to_owned()),
        eta: ETA
            .find(text)
            .map_or_else(|| DeliveryOption::DEFAULT_ETA.to_owned(), |m| m.as_str().to_owned()),
        conditions: conditions.map(|m| m.as_str().to_owned()),
    })
}

fn classify_delivery(lower: &str) -> &'static str {
    if lower.contains("same-day") || lower.contains("same day") {
        "Same-Day"
    } else if lower.contains("next-day")
        || lower.contains("next day")
        || lower.contains("one-day")
        || lower.contains("one day")
    {
        "Next-Day"
    } else if lower.contains("express") || lower.contains("expedited") || lower.contains("priority")
    {
        "Express"
    } else {
        "Standard"
    }
}
