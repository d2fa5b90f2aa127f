use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("page driver error: {0}")]
    Driver(String),

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScraperError {
    /// Returns `true` if the whole-URL scrape is worth another attempt.
    ///
    /// Browser start-up, navigation, timeouts and protocol hiccups are
    /// transient. Malformed selectors or URLs fail the same way every time.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            ScraperError::Cdp(_)
                | ScraperError::BrowserLaunch(_)
                | ScraperError::Navigation { .. }
                | ScraperError::Timeout { .. }
                | ScraperError::Driver(_)
        )
    }
}
