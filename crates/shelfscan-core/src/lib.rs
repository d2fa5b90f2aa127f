pub mod products;
pub mod selectors;
pub mod settings;

use thiserror::Error;

pub use products::{
    scenario_name, CheckoutScenario, DeliveryOption, ProductData, ScrapedResult, StockStatus,
    UNKNOWN_STORE, UNSUPPORTED_PLATFORM,
};
pub use selectors::{load_selectors, load_selectors_or_empty, PlatformSelectors, SelectorConfig};
pub use settings::{
    apply_env_overrides, apply_process_env, load_settings, load_settings_or_default,
    LoggingSettings, OutputSettings, ScraperSettings, Settings,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}
