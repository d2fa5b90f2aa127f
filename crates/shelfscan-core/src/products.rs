use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error message recorded for URLs no registered platform understands.
pub const UNSUPPORTED_PLATFORM: &str = "Unsupported platform";

/// Store identifier used when no platform matched the URL.
pub const UNKNOWN_STORE: &str = "unknown";

/// Availability of a product as shown on its listing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[default]
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    #[serde(rename = "Limited Stock")]
    LimitedStock,
    #[serde(rename = "Pre-Order")]
    PreOrder,
}

impl StockStatus {
    /// Classifies free-form availability text.
    ///
    /// Matching is case-insensitive substring membership, tested in order:
    /// `"in stock"`, `"out of stock"`, `"limited"`, then `"pre-order"` /
    /// `"preorder"`. Unmatched or absent text is [`StockStatus::OutOfStock`].
    #[must_use]
    pub fn from_availability_text(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Self::OutOfStock;
        };
        let lower = text.to_lowercase();
        if lower.contains("in stock") {
            Self::InStock
        } else if lower.contains("out of stock") {
            Self::OutOfStock
        } else if lower.contains("limited") {
            Self::LimitedStock
        } else if lower.contains("pre-order") || lower.contains("preorder") {
            Self::PreOrder
        } else {
            Self::OutOfStock
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::OutOfStock => "Out of Stock",
            Self::LimitedStock => "Limited Stock",
            Self::PreOrder => "Pre-Order",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product listing extracted from a storefront page.
///
/// Every field is a best-effort string exactly as shown on the page. Nothing
/// is parsed into numbers; absent values are `None` (or empty for
/// `image_urls`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    /// Product title, `"Unknown"` when no selector matched.
    pub name: String,
    /// Displayed price, `"0"` when no selector matched.
    pub price: String,
    pub discount_price: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    /// Breadcrumb path joined with `" > "`.
    pub category: Option<String>,
    /// URL the browser ended up on after redirects.
    pub product_url: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub stock_status: StockStatus,
    /// Decimal-like rating, e.g. `"4.5"`.
    pub rating: Option<String>,
    /// Integer-like review count with thousands separators removed.
    pub reviews: Option<String>,
    pub seller: Option<String>,
    pub shipping_info: Option<String>,
}

impl ProductData {
    pub const UNKNOWN_NAME: &'static str = "Unknown";
    pub const UNKNOWN_PRICE: &'static str = "0";

    /// Placeholder recorded when the product page could not be scraped.
    #[must_use]
    pub fn placeholder(url: &str) -> Self {
        Self {
            name: String::new(),
            price: String::new(),
            discount_price: None,
            sku: None,
            brand: None,
            category: None,
            product_url: url.to_owned(),
            image_urls: Vec::new(),
            stock_status: StockStatus::OutOfStock,
            rating: None,
            reviews: None,
            seller: None,
            shipping_info: None,
        }
    }

    #[must_use]
    pub fn first_image_url(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

/// One delivery choice shown during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOption {
    pub company: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: String,
    pub eta: String,
    pub conditions: Option<String>,
}

impl DeliveryOption {
    /// Price recorded when the option text carries no currency amount.
    pub const DEFAULT_PRICE: &'static str = "0.00";
    /// ETA recorded when the option text carries no day range.
    pub const DEFAULT_ETA: &'static str = "3-5 days";
}

/// Scenario key for a checkout run at `quantity` units: `1_item`, `5_items`.
#[must_use]
pub fn scenario_name(quantity: u32) -> String {
    if quantity == 1 {
        "1_item".to_owned()
    } else {
        format!("{quantity}_items")
    }
}

/// Outcome of one simulated add-to-cart → checkout flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutScenario {
    pub scenario_name: String,
    #[serde(default)]
    pub delivery_options: Vec<DeliveryOption>,
    pub screenshot_path: Option<String>,
    pub error_message: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl CheckoutScenario {
    #[must_use]
    pub fn completed(
        scenario_name: String,
        delivery_options: Vec<DeliveryOption>,
        screenshot_path: Option<String>,
    ) -> Self {
        Self {
            scenario_name,
            delivery_options,
            screenshot_path,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// A scenario that aborted midway; it carries no delivery options.
    #[must_use]
    pub fn failed(scenario_name: String, error: impl Into<String>) -> Self {
        Self {
            scenario_name,
            delivery_options: Vec::new(),
            screenshot_path: None,
            error_message: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

fn default_success() -> bool {
    true
}

/// Everything collected for one input URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedResult {
    /// Platform store identifier, e.g. `"amazon.com"`.
    pub store: String,
    pub url: String,
    pub product: ProductData,
    /// Checkout scenarios keyed by scenario name.
    #[serde(default)]
    pub scenarios: BTreeMap<String, CheckoutScenario>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_success")]
    pub success: bool,
    pub error_message: Option<String>,
}

impl ScrapedResult {
    #[must_use]
    pub fn succeeded(
        store: &str,
        url: &str,
        product: ProductData,
        scenarios: BTreeMap<String, CheckoutScenario>,
    ) -> Self {
        Self {
            store: store.to_owned(),
            url: url.to_owned(),
            product,
            scenarios,
            timestamp: Utc::now(),
            success: true,
            error_message: None,
        }
    }

    /// A failed scrape with an out-of-stock placeholder product.
    #[must_use]
    pub fn failed(store: &str, url: &str, error: impl Into<String>) -> Self {
        Self {
            store: store.to_owned(),
            url: url.to_owned(),
            product: ProductData::placeholder(url),
            scenarios: BTreeMap::new(),
            timestamp: Utc::now(),
            success: false,
            error_message: Some(error.into()),
        }
    }

    #[must_use]
    pub fn unsupported(url: &str) -> Self {
        Self::failed(UNKNOWN_STORE, url, UNSUPPORTED_PLATFORM)
    }
}
