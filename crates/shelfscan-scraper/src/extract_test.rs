use super::*;
use crate::driver::html::HtmlPage;

const URL: &str = "https://www.amazon.com/dp/B000123ABC1";

const PAGE: &str = r#"
<html><body>
  <ul class="crumbs">
    <li><a>Home &amp; Kitchen</a></li>
    <li><a>Coffee</a></li>
    <li><a> Espresso Machines </a></li>
  </ul>
  <span id="productTitle">Breville Barista Express</span>
  <span class="price">$699.95</span>
  <a id="byline">Visit the Breville Store</a>
  <table class="details">
    <tr><td>Weight: 10 kg</td></tr>
    <tr><td>Model: BES870XL</td></tr>
  </table>
  <img class="gallery" src="https://img.test/1.jpg">
  <img class="gallery" data-src="https://img.test/2.jpg">
  <img class="gallery" src="https://img.test/1.jpg">
  <img class="gallery" src="/relative.png">
  <div id="stock"> In Stock. </div>
  <span class="stars">4.6 out of 5 stars</span>
  <span id="reviews">12,345 ratings</span>
</body></html>
"#;

fn configured(entries: &[(&str, &[&str])]) -> PlatformSelectors {
    let mut selectors = PlatformSelectors::default();
    for (field, raw) in entries {
        selectors.insert(*field, raw.iter().map(|s| (*s).to_owned()).collect());
    }
    selectors
}

fn table() -> SelectorTable {
    SelectorTable::from_configured(&configured(&[
        (fields::PRODUCT_NAME, &["#missingTitle", "#productTitle"]),
        (fields::PRICE, &[".price"]),
        (fields::BRAND, &["#byline"]),
        (fields::BREADCRUMB, &[".crumbs a"]),
        (fields::SKU_DETAILS, &[".details tr"]),
        (fields::IMAGES, &["img.gallery"]),
        (fields::AVAILABILITY, &["#stock"]),
        (fields::RATING, &[".stars"]),
        (fields::REVIEW_COUNT, &["#reviews"]),
    ]))
}

async fn open(html: &str) -> HtmlPage {
    let page = HtmlPage::new().with_document(URL, html);
    page.goto(URL).await.unwrap();
    page
}

#[tokio::test]
async fn extracts_fields_through_fallbacks() {
    let page = open(PAGE).await;
    let product = ProductExtractor::new(table(), Duration::ZERO)
        .extract(&page, URL)
        .await;

    assert_eq!(product.name, "Breville Barista Express");
    assert_eq!(product.price, "$699.95");
    assert_eq!(product.brand.as_deref(), Some("Visit the Breville Store"));
    assert_eq!(
        product.category.as_deref(),
        Some("Home & Kitchen > Coffee > Espresso Machines")
    );
    assert_eq!(product.sku.as_deref(), Some("BES870XL"));
    assert_eq!(
        product.image_urls,
        vec!["https://img.test/1.jpg", "https://img.test/2.jpg"]
    );
    assert_eq!(product.stock_status, StockStatus::InStock);
    assert_eq!(product.rating.as_deref(), Some("4.6"));
    assert_eq!(product.reviews.as_deref(), Some("12345"));
    assert_eq!(product.product_url, URL);
    assert!(product.discount_price.is_none());
    assert!(product.seller.is_none());
    assert!(product.shipping_info.is_none());
}

#[tokio::test]
async fn empty_selector_table_degrades_to_sentinels() {
    let page = open(PAGE).await;
    let product = ProductExtractor::new(SelectorTable::default(), Duration::ZERO)
        .extract(&page, URL)
        .await;

    assert_eq!(product.name, ProductData::UNKNOWN_NAME);
    assert_eq!(product.price, ProductData::UNKNOWN_PRICE);
    assert!(product.category.is_none());
    assert!(product.image_urls.is_empty());
    assert_eq!(product.stock_status, StockStatus::OutOfStock);
    // No details table configured, so the identifier comes from the URL.
    assert_eq!(product.sku.as_deref(), Some("B000123ABC1"));
}

#[tokio::test]
async fn failing_selectors_are_treated_as_absent() {
    let page = open(PAGE).await;
    let table = SelectorTable::from_configured(&configured(&[
        (fields::PRODUCT_NAME, &["div[", "#productTitle"]),
        (fields::BRAND, &["div["]),
    ]));
    let product = ProductExtractor::new(table, Duration::ZERO)
        .extract(&page, URL)
        .await;

    assert_eq!(product.name, "Breville Barista Express");
    assert!(product.brand.is_none());
}

#[tokio::test]
async fn blank_element_text_is_a_miss() {
    let page = open(r#"<h1 id="a">   </h1><h1 id="b">Fallback</h1>"#).await;
    let locators = [Locator::parse("#a"), Locator::parse("#b")];
    let value = extract_with_selectors(&page, &locators, Duration::ZERO).await;
    assert_eq!(value.as_deref(), Some("Fallback"));
}

#[tokio::test]
async fn attribute_locator_reads_attribute() {
    let page = open(r#"<i class="a-icon-alt" title="4.2 out of 5"></i>"#).await;
    let locators = [Locator::parse(".a-icon-alt@title")];
    let value = extract_with_selectors(&page, &locators, Duration::ZERO).await;
    assert_eq!(value.as_deref(), Some("4.2 out of 5"));
}

#[test]
fn configured_entry_replaces_default() {
    let defaults: &[(&str, &[&str])] = &[
        (fields::SELLER, &["#merchant-info"]),
        (fields::RATING, &[".a-icon-alt"]),
    ];
    let table =
        SelectorTable::with_defaults(defaults, &configured(&[(fields::SELLER, &["#soldBy"])]));
    assert_eq!(table.get(fields::SELLER), [Locator::parse("#soldBy")]);
    assert_eq!(table.get(fields::RATING), [Locator::parse(".a-icon-alt")]);
    assert!(table.get(fields::PRODUCT_NAME).is_empty());
}

#[test]
fn sku_from_url_takes_identifier_after_dp() {
    assert_eq!(
        sku_from_url("https://www.amazon.com/dp/B000123ABC1").as_deref(),
        Some("B000123ABC1")
    );
    assert_eq!(
        sku_from_url("https://www.amazon.com/Some-Name/dp/B09XYZ1234/ref=sr_1").as_deref(),
        Some("B09XYZ1234")
    );
    assert!(sku_from_url("https://www.amazon.com/dp/short").is_none());
    assert!(sku_from_url("https://www.amazon.com/gp/cart/view.html").is_none());
}

#[test]
fn sku_from_details_rows_handles_colon_and_token() {
    let rows = vec!["Weight 10 kg".to_owned(), "ASIN B0ABCDEF12".to_owned()];
    assert_eq!(sku_from_details_rows(&rows).as_deref(), Some("B0ABCDEF12"));

    let rows = vec!["Item model number : X-100".to_owned()];
    assert!(sku_from_details_rows(&rows).is_none(), "label is case-sensitive");

    let rows = vec!["SKU: ".to_owned()];
    assert!(sku_from_details_rows(&rows).is_none());
}

#[test]
fn breadcrumb_skips_blank_links() {
    let texts = vec!["Books".to_owned(), "  ".to_owned(), "Fiction".to_owned()];
    assert_eq!(join_breadcrumb(&texts).as_deref(), Some("Books > Fiction"));
    assert!(join_breadcrumb(&[]).is_none());
}

#[test]
fn rating_and_review_parsing() {
    assert_eq!(parse_rating("4.5 out of 5 stars").as_deref(), Some("4.5"));
    assert!(parse_rating("no rating yet").is_none());
    assert_eq!(parse_review_count("1,234,567 global ratings").as_deref(), Some("1234567"));
    assert!(parse_review_count("no reviews").is_none());
}

#[test]
fn image_filter_dedupes_in_order() {
    let urls = filter_image_urls(vec![
        Some("https://a.test/x.jpg".to_owned()),
        None,
        Some("data:image/gif;base64,AAAA".to_owned()),
        Some("https://a.test/y.jpg".to_owned()),
        Some("https://a.test/x.jpg".to_owned()),
    ]);
    assert_eq!(urls, vec!["https://a.test/x.jpg", "https://a.test/y.jpg"]);
}
