//! Where the URL list comes from.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Used when neither `--urls` nor `--file` is given.
pub(crate) const SAMPLE_URLS: [&str; 3] = [
    "https://www.amazon.com/dp/B09XYZ123",
    "https://www.aliexpress.com/item/123456.html",
    "https://www.ebay.com/itm/1234567890",
];

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::\d+)?(?:/?|[/?]\S+)$",
    )
    .expect("valid regex")
});

pub(crate) fn is_valid_url(candidate: &str) -> bool {
    URL_PATTERN.is_match(candidate)
}

/// Valid URLs from `path`, one per line, in file order. Blank and invalid
/// lines are dropped. An unreadable file yields no URLs.
pub(crate) fn read_urls_from_file(path: &Path) -> Vec<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read URL file");
            return Vec::new();
        }
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let valid = is_valid_url(line);
            if !valid {
                tracing::debug!(line, "skipping invalid URL");
            }
            valid
        })
        .map(str::to_owned)
        .collect()
}

/// `--urls` when given, else the lines of `--file`, else [`SAMPLE_URLS`].
pub(crate) fn resolve_urls(cli_urls: &[String], file: Option<&Path>) -> Vec<String> {
    if !cli_urls.is_empty() {
        return cli_urls.to_vec();
    }
    match file {
        Some(path) => read_urls_from_file(path),
        None => SAMPLE_URLS.iter().map(|&url| url.to_owned()).collect(),
    }
}
