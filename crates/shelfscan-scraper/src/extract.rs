//! Selector-driven product extraction.
//!
//! A [`SelectorTable`] maps logical field names (see [`fields`]) to ordered
//! locator fallbacks. [`ProductExtractor`] walks that table against a loaded
//! page and assembles a [`ProductData`]. A field whose locators all miss, or
//! whose lookup errors, is simply absent.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use shelfscan_core::{PlatformSelectors, ProductData, StockStatus};

use crate::driver::PageDriver;
use crate::locator::{self, Locator};

/// Logical field names used as selector-table keys.
pub mod fields {
    pub const PRODUCT_NAME: &str = "product_name";
    pub const PRICE: &str = "price";
    pub const DISCOUNT_PRICE: &str = "discount_price";
    pub const BRAND: &str = "brand";
    pub const SHIPPING_INFO: &str = "shipping_info";

    pub const BREADCRUMB: &str = "breadcrumb";
    pub const SKU_DETAILS: &str = "sku_details";
    pub const IMAGES: &str = "images";
    pub const AVAILABILITY: &str = "availability";
    pub const RATING: &str = "rating";
    pub const REVIEW_COUNT: &str = "review_count";
    pub const SELLER: &str = "seller";

    pub const DELIVERY_OPTIONS: &str = "delivery_options";
    pub const ADD_TO_CART: &str = "add_to_cart";
    pub const QUANTITY: &str = "quantity";
    pub const PROCEED_TO_CHECKOUT: &str = "proceed_to_checkout";
}

static SKU_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]{10,})").expect("valid regex"));
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+").expect("valid regex"));
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

const SKU_ROW_LABELS: [&str; 3] = ["ASIN", "SKU", "Model"];
const IMAGE_ATTRIBUTES: [&str; 2] = ["src", "data-src"];

/// Field name → ordered locator fallbacks for one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorTable {
    fields: BTreeMap<String, Vec<Locator>>,
}

impl SelectorTable {
    /// Table holding only the configured selectors.
    #[must_use]
    pub fn from_configured(configured: &PlatformSelectors) -> Self {
        Self::with_defaults(&[], configured)
    }

    /// Start from built-in `defaults`; a configured entry for the same field
    /// replaces the default list.
    #[must_use]
    pub fn with_defaults(defaults: &[(&str, &[&str])], configured: &PlatformSelectors) -> Self {
        let mut fields: BTreeMap<String, Vec<Locator>> = defaults
            .iter()
            .map(|(field, raw)| {
                (
                    (*field).to_owned(),
                    raw.iter().map(|s| Locator::parse(s)).collect(),
                )
            })
            .collect();
        for (field, raw) in configured.iter() {
            fields.insert(field.to_owned(), locator::parse_all(raw));
        }
        Self { fields }
    }

    /// Locators for `field`, empty when none are known.
    #[must_use]
    pub fn get(&self, field: &str) -> &[Locator] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }
}

/// First non-empty value among `locators`, each waited on for up to
/// `timeout`. Lookup errors count as a miss.
pub async fn extract_with_selectors(
    page: &dyn PageDriver,
    locators: &[Locator],
    timeout: Duration,
) -> Option<String> {
    for locator in locators {
        match page.find_value(locator, timeout).await {
            Ok(Some(value)) if !value.trim().is_empty() => return Some(value.trim().to_owned()),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(selector = %locator, error = %e, "selector lookup failed");
            }
        }
    }
    None
}

/// Texts of every element matched by the first locator that matches anything.
async fn first_text_list(page: &dyn PageDriver, locators: &[Locator]) -> Vec<String> {
    for locator in locators {
        match page.find_all_text(&locator.to_css()).await {
            Ok(texts) if !texts.is_empty() => return texts,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(selector = %locator, error = %e, "selector lookup failed");
            }
        }
    }
    Vec::new()
}

pub struct ProductExtractor {
    table: SelectorTable,
    field_timeout: Duration,
}

impl ProductExtractor {
    #[must_use]
    pub fn new(table: SelectorTable, field_timeout: Duration) -> Self {
        Self {
            table,
            field_timeout,
        }
    }

    #[must_use]
    pub fn table(&self) -> &SelectorTable {
        &self.table
    }

    async fn field(&self, page: &dyn PageDriver, field: &str) -> Option<String> {
        extract_with_selectors(page, self.table.get(field), self.field_timeout).await
    }

    /// Build a [`ProductData`] from the page currently open. `requested_url`
    /// stands in when the page cannot report its own URL.
    pub async fn extract(&self, page: &dyn PageDriver, requested_url: &str) -> ProductData {
        let product_url = match page.current_url().await {
            Ok(url) if !url.is_empty() => url,
            _ => requested_url.to_owned(),
        };

        let name = self
            .field(page, fields::PRODUCT_NAME)
            .await
            .unwrap_or_else(|| ProductData::UNKNOWN_NAME.to_owned());
        let price = self
            .field(page, fields::PRICE)
            .await
            .unwrap_or_else(|| ProductData::UNKNOWN_PRICE.to_owned());

        let breadcrumb = first_text_list(page, self.table.get(fields::BREADCRUMB)).await;
        let detail_rows = first_text_list(page, self.table.get(fields::SKU_DETAILS)).await;
        let sku = sku_from_details_rows(&detail_rows).or_else(|| sku_from_url(&product_url));

        let availability = self.field(page, fields::AVAILABILITY).await;

        let product = ProductData {
            name,
            price,
            discount_price: self.field(page, fields::DISCOUNT_PRICE).await,
            sku,
            brand: self.field(page, fields::BRAND).await,
            category: join_breadcrumb(&breadcrumb),
            image_urls: self.image_urls(page).await,
            stock_status: StockStatus::from_availability_text(availability.as_deref()),
            rating: self
                .field(page, fields::RATING)
                .await
                .and_then(|text| parse_rating(&text)),
            reviews: self
                .field(page, fields::REVIEW_COUNT)
                .await
                .and_then(|text| parse_review_count(&text)),
            seller: self.field(page, fields::SELLER).await,
            shipping_info: self.field(page, fields::SHIPPING_INFO).await,
            product_url,
        };

        tracing::debug!(
            name = %product.name,
            price = %product.price,
            sku = product.sku.as_deref().unwrap_or(""),
            images = product.image_urls.len(),
            "extracted product fields"
        );
        product
    }

    /// Image URLs from every image locator, in document order.
    async fn image_urls(&self, page: &dyn PageDriver) -> Vec<String> {
        let mut candidates = Vec::new();
        for locator in self.table.get(fields::IMAGES) {
            let attributes: Vec<&str> = match locator.attribute() {
                Some(attribute) => vec![attribute],
                None => IMAGE_ATTRIBUTES.to_vec(),
            };
            match page.find_all_attribute(&locator.to_css(), &attributes).await {
                Ok(values) => candidates.extend(values),
                Err(e) => {
                    tracing::debug!(selector = %locator, error = %e, "image lookup failed");
                }
            }
        }
        filter_image_urls(candidates)
    }
}

/// Breadcrumb link texts joined with `" > "`; `None` when there are none.
#[must_use]
pub fn join_breadcrumb(texts: &[String]) -> Option<String> {
    let parts: Vec<&str> = texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" > "))
    }
}

/// Product identifier embedded after `/dp/` in the URL path.
#[must_use]
pub fn sku_from_url(url: &str) -> Option<String> {
    SKU_IN_URL
        .captures(url)
        .and_then(|cap| cap.get(1).map(|m| m.as_str().to_owned()))
}

/// Identifier from the first details-table row labelled ASIN, SKU or Model.
///
/// The value is whatever follows the last `:`; rows without a colon yield
/// their last whitespace-separated token.
#[must_use]
pub fn sku_from_details_rows(rows: &[String]) -> Option<String> {
    rows.iter()
        .find(|row| SKU_ROW_LABELS.iter().any(|label| row.contains(label)))
        .and_then(|row| {
            let value = match row.rfind(':') {
                Some(colon) => row[colon + 1..].trim(),
                None => row.split_whitespace().last().unwrap_or(""),
            };
            (!value.is_empty()).then(|| value.to_owned())
        })
}

/// First decimal number in the text, e.g. `"4.5 out of 5 stars"` → `"4.5"`.
#[must_use]
pub fn parse_rating(text: &str) -> Option<String> {
    DECIMAL.find(text).map(|m| m.as_str().to_owned())
}

/// First integer after dropping thousands separators, e.g.
/// `"12,345 ratings"` → `"12345"`.
#[must_use]
pub fn parse_review_count(text: &str) -> Option<String> {
    let cleaned = text.replace(',', "");
    INTEGER.find(&cleaned).map(|m| m.as_str().to_owned())
}

/// Keeps absolute `http(s)` URLs, dropping duplicates but not reordering.
#[must_use]
pub fn filter_image_urls(candidates: Vec<Option<String>>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .flatten()
        .map(|url| url.trim().to_owned())
        .filter(|url| url.contains("http"))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
