//! Selector lists loaded from `config/selectors.yaml`.
//!
//! The file maps platform name → field name → ordered list of selector
//! strings:
//!
//! ```yaml
//! amazon:
//!   product_name:
//!     - "#productTitle"
//!     - "h1.product-title"
//!   price:
//!     - ".a-price .a-offscreen"
//! ```
//!
//! Selector strings are kept verbatim here; strategy prefixes (`id:`,
//! `name:`, `css:`) and `@attribute` suffixes are interpreted by the scraper.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Field name → ordered selector fallbacks for one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformSelectors {
    fields: BTreeMap<String, Vec<String>>,
}

impl PlatformSelectors {
    /// Selectors configured for `field`, empty when the field is not listed.
    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, selectors: Vec<String>) {
        self.fields.insert(field.into(), selectors);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, selectors)| (field.as_str(), selectors.as_slice()))
    }
}

/// Platform name → [`PlatformSelectors`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorConfig {
    platforms: BTreeMap<String, PlatformSelectors>,
}

impl SelectorConfig {
    /// Selectors for `platform`; an unknown platform yields an empty table.
    #[must_use]
    pub fn platform(&self, platform: &str) -> PlatformSelectors {
        self.platforms.get(platform).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn insert(&mut self, platform: impl Into<String>, selectors: PlatformSelectors) {
        self.platforms.insert(platform.into(), selectors);
    }
}

/// Load and validate the selector configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or contains
/// blank selector strings.
pub fn load_selectors(path: &Path) -> Result<SelectorConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_selectors(&content, path)
}

/// Like [`load_selectors`], but a missing file yields an empty mapping, which
/// leaves every configured field unextractable.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// validated.
pub fn load_selectors_or_empty(path: &Path) -> Result<SelectorConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_selectors(&content, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "selectors config file not found");
            Ok(SelectorConfig::default())
        }
        Err(e) => Err(ConfigError::FileIo {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

fn parse_selectors(content: &str, path: &Path) -> Result<SelectorConfig, ConfigError> {
    if content.trim().is_empty() {
        return Ok(SelectorConfig::default());
    }
    let config: SelectorConfig =
        serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;
    validate_selectors(&config)?;
    Ok(config)
}

fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (platform, selectors) in &config.platforms {
        for (field, list) in selectors.iter() {
            if list.iter().any(|s| s.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "{platform}.{field} contains a blank selector"
                )));
            }
        }
    }
    Ok(())
}
