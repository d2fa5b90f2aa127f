//! One-to-many expansion of results into tabular rows.
//!
//! A result without scenarios becomes one row of product fields. Otherwise
//! every (scenario, delivery option) pair becomes a row, and a scenario with
//! no options still gets one row with blank delivery columns. Product fields
//! repeat on every row of a result.

use shelfscan_core::{CheckoutScenario, DeliveryOption, ScrapedResult};

/// Column order shared by the CSV and spreadsheet outputs.
pub const COLUMNS: [&str; 24] = [
    "store",
    "url",
    "name",
    "price",
    "discount_price",
    "sku",
    "brand",
    "category",
    "product_url",
    "image_url",
    "stock_status",
    "rating",
    "reviews",
    "seller",
    "shipping_info",
    "success",
    "error_message",
    "timestamp",
    "scenario",
    "delivery_company",
    "delivery_type",
    "delivery_price",
    "eta",
    "screenshot",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRow {
    pub store: String,
    pub url: String,
    pub name: String,
    pub price: String,
    pub discount_price: String,
    pub sku: String,
    pub brand: String,
    pub category: String,
    pub product_url: String,
    pub image_url: String,
    pub stock_status: String,
    pub rating: String,
    pub reviews: String,
    pub seller: String,
    pub shipping_info: String,
    pub success: String,
    pub error_message: String,
    pub timestamp: String,
    pub scenario: String,
    pub delivery_company: String,
    pub delivery_type: String,
    pub delivery_price: String,
    pub eta: String,
    pub screenshot: String,
}

impl FlatRow {
    /// Cell values in [`COLUMNS`] order.
    #[must_use]
    pub fn values(&self) -> [&str; 24] {
        [
            &self.store,
            &self.url,
            &self.name,
            &self.price,
            &self.discount_price,
            &self.sku,
            &self.brand,
            &self.category,
            &self.product_url,
            &self.image_url,
            &self.stock_status,
            &self.rating,
            &self.reviews,
            &self.seller,
            &self.shipping_info,
            &self.success,
            &self.error_message,
            &self.timestamp,
            &self.scenario,
            &self.delivery_company,
            &self.delivery_type,
            &self.delivery_price,
            &self.eta,
            &self.screenshot,
        ]
    }

    fn base(result: &ScrapedResult) -> Self {
        let product = &result.product;
        Self {
            store: result.store.clone(),
            url: result.url.clone(),
            name: product.name.clone(),
            price: product.price.clone(),
            discount_price: text(product.discount_price.as_deref()),
            sku: text(product.sku.as_deref()),
            brand: text(product.brand.as_deref()),
            category: text(product.category.as_deref()),
            product_url: product.product_url.clone(),
            image_url: text(product.first_image_url()),
            stock_status: product.stock_status.as_str().to_owned(),
            rating: text(product.rating.as_deref()),
            reviews: text(product.reviews.as_deref()),
            seller: text(product.seller.as_deref()),
            shipping_info: text(product.shipping_info.as_deref()),
            success: result.success.to_string(),
            error_message: text(result.error_message.as_deref()),
            timestamp: result.timestamp.to_rfc3339(),
            ..Self::default()
        }
    }

    fn with_scenario(&self, scenario: &CheckoutScenario, option: Option<&DeliveryOption>) -> Self {
        let mut row = self.clone();
        row.scenario.clone_from(&scenario.scenario_name);
        row.screenshot = text(scenario.screenshot_path.as_deref());
        if let Some(option) = option {
            row.delivery_company.clone_from(&option.company);
            row.delivery_type.clone_from(&option.kind);
            row.delivery_price.clone_from(&option.price);
            row.eta.clone_from(&option.eta);
        }
        row
    }
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_owned()
}

#[must_use]
pub fn flatten_result(result: &ScrapedResult) -> Vec<FlatRow> {
    let base = FlatRow::base(result);
    if result.scenarios.is_empty() {
        return vec![base];
    }

    let mut rows = Vec::new();
    for scenario in result.scenarios.values() {
        if scenario.delivery_options.is_empty() {
            rows.push(base.with_scenario(scenario, None));
        } else {
            rows.extend(
                scenario
                    .delivery_options
                    .iter()
                    .map(|option| base.with_scenario(scenario, Some(option))),
            );
        }
    }
    rows
}

#[must_use]
pub fn flatten_results(results: &[ScrapedResult]) -> Vec<FlatRow> {
    results.iter().flat_map(flatten_result).collect()
}
