pub mod checkout;
pub mod driver;
pub mod error;
pub mod extract;
pub mod locator;
pub mod pacing;
pub mod pipeline;
pub mod platforms;
pub mod retry;

pub use checkout::{parse_delivery_option, CheckoutProfile, CheckoutSimulator};
pub use driver::chromium::{ChromiumLauncher, ChromiumPage};
pub use driver::html::{HtmlLauncher, HtmlPage, PageAction};
pub use driver::{with_session, BrowserLauncher, PageDriver};
pub use error::ScraperError;
pub use extract::{extract_with_selectors, ProductExtractor, SelectorTable};
pub use locator::{Locator, Strategy};
pub use pacing::HumanPacing;
pub use pipeline::ScrapeRunner;
pub use platforms::{extract_domain, AmazonScraper, PlatformScraper, ScrapeOptions, ScraperFactory};
pub use retry::{retry_with_backoff, RetryPolicy};
