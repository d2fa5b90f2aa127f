//! Run settings loaded from `config/settings.yaml`.
//!
//! Every key is optional; missing keys fall back to the defaults below. A
//! handful of values can additionally be overridden from the environment
//! (see [`apply_env_overrides`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scraper: ScraperSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    pub headless: bool,
    /// Seconds to wait for navigation and checkout controls.
    pub timeout: u64,
    /// Seconds to wait for each selector while extracting product fields.
    pub field_timeout: u64,
    /// Seconds to pause between consecutive URLs.
    pub delay_between_requests: f64,
    /// Total attempts per URL, including the first.
    pub max_retries: u32,
    /// Backoff base in seconds: the n-th retry waits `retry_delay * 2^(n-1)` plus jitter.
    pub retry_delay: f64,
    pub min_action_delay: f64,
    pub max_action_delay: f64,
    /// Unit counts to run a checkout scenario for.
    pub checkout_quantities: Vec<u32>,
    /// Chromium binary; auto-detected when unset.
    pub chrome_path: Option<PathBuf>,
    /// Fixed user agent; a random desktop agent is picked when unset.
    pub user_agent: Option<String>,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            headless: true,
            timeout: 30,
            field_timeout: 5,
            delay_between_requests: 2.0,
            max_retries: 3,
            retry_delay: 2.0,
            min_action_delay: 1.0,
            max_action_delay: 3.0,
            checkout_quantities: vec![1, 5],
            chrome_path: None,
            user_agent: None,
        }
    }
}

impl ScraperSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    #[must_use]
    pub fn field_timeout(&self) -> Duration {
        Duration::from_secs(self.field_timeout)
    }

    #[must_use]
    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_between_requests)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
    pub excel_path: PathBuf,
    pub screenshots_dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            json_path: PathBuf::from("data/output.json"),
            csv_path: PathBuf::from("data/output.csv"),
            excel_path: PathBuf::from("data/output.xlsx"),
            screenshots_dir: PathBuf::from("data/screenshots"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Log file written alongside stderr; `null` disables it.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: Some(PathBuf::from("scraper.log")),
        }
    }
}

/// Load and validate settings from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_settings(&content, path)
}

/// Like [`load_settings`], but a missing file yields [`Settings::default`].
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_settings_or_default(path: &Path) -> Result<Settings, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_settings(&content, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                path = %path.display(),
                "settings file not found, using defaults"
            );
            Ok(Settings::default())
        }
        Err(e) => Err(ConfigError::FileIo {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

fn parse_settings(content: &str, path: &Path) -> Result<Settings, ConfigError> {
    // An empty document deserializes to unit, not to a defaulted struct.
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    let settings: Settings = serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
        path: path.display().to_string(),
        source: e,
    })?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Apply `SHELFSCAN_*` overrides from the process environment.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if an override cannot be parsed.
pub fn apply_process_env(settings: &mut Settings) -> Result<(), ConfigError> {
    apply_env_overrides(settings, |key| std::env::var(key))
}

/// Apply overrides using the provided env-var lookup function.
///
/// Recognised variables: `SHELFSCAN_HEADLESS`, `SHELFSCAN_TIMEOUT_SECS`,
/// `SHELFSCAN_CHROME_PATH`, `SHELFSCAN_LOG_LEVEL`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if an override cannot be parsed, or
/// `ConfigError::Validation` if the result is invalid.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    if let Ok(raw) = lookup("SHELFSCAN_HEADLESS") {
        settings.scraper.headless = parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
            var: "SHELFSCAN_HEADLESS".to_owned(),
            reason: format!("expected a boolean, got \"{raw}\""),
        })?;
    }

    if let Ok(raw) = lookup("SHELFSCAN_TIMEOUT_SECS") {
        settings.scraper.timeout = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: "SHELFSCAN_TIMEOUT_SECS".to_owned(),
            reason: e.to_string(),
        })?;
    }

    if let Ok(raw) = lookup("SHELFSCAN_CHROME_PATH") {
        if !raw.trim().is_empty() {
            settings.scraper.chrome_path = Some(PathBuf::from(raw));
        }
    }

    if let Ok(raw) = lookup("SHELFSCAN_LOG_LEVEL") {
        if !raw.trim().is_empty() {
            settings.logging.level = raw;
        }
    }

    validate_settings(settings)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let scraper = &settings.scraper;

    if scraper.timeout == 0 {
        return Err(ConfigError::Validation(
            "scraper.timeout must be greater than 0".to_owned(),
        ));
    }

    if scraper.max_retries == 0 {
        return Err(ConfigError::Validation(
            "scraper.max_retries must be at least 1".to_owned(),
        ));
    }

    for (key, value) in [
        ("scraper.delay_between_requests", scraper.delay_between_requests),
        ("scraper.retry_delay", scraper.retry_delay),
        ("scraper.min_action_delay", scraper.min_action_delay),
        ("scraper.max_action_delay", scraper.max_action_delay),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{key} must be a non-negative number of seconds, got {value}"
            )));
        }
    }

    if scraper.min_action_delay > scraper.max_action_delay {
        return Err(ConfigError::Validation(format!(
            "scraper.min_action_delay ({}) exceeds scraper.max_action_delay ({})",
            scraper.min_action_delay, scraper.max_action_delay
        )));
    }

    if scraper.checkout_quantities.contains(&0) {
        return Err(ConfigError::Validation(
            "scraper.checkout_quantities entries must be at least 1".to_owned(),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
