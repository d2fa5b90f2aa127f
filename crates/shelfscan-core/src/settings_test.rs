use std::collections::HashMap;
use std::env::VarError;
use std::io::Write;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

fn write_settings(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::default();
    assert!(settings.scraper.headless);
    assert_eq!(settings.scraper.timeout, 30);
    assert_eq!(settings.scraper.field_timeout, 5);
    assert!((settings.scraper.delay_between_requests - 2.0).abs() < f64::EPSILON);
    assert_eq!(settings.scraper.max_retries, 3);
    assert_eq!(settings.scraper.checkout_quantities, vec![1, 5]);
    assert_eq!(settings.output.json_path, PathBuf::from("data/output.json"));
    assert_eq!(settings.output.csv_path, PathBuf::from("data/output.csv"));
    assert_eq!(settings.output.excel_path, PathBuf::from("data/output.xlsx"));
    assert_eq!(
        settings.output.screenshots_dir,
        PathBuf::from("data/screenshots")
    );
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.logging.file, Some(PathBuf::from("scraper.log")));
}

#[test]
fn partial_file_keeps_defaults_for_missing_keys() {
    let file = write_settings(
        "scraper:\n  headless: false\n  delay_between_requests: 0.5\noutput:\n  json_path: out/results.json\n",
    );
    let settings = load_settings(file.path()).unwrap();
    assert!(!settings.scraper.headless);
    assert!((settings.scraper.delay_between_requests - 0.5).abs() < f64::EPSILON);
    assert_eq!(settings.scraper.timeout, 30);
    assert_eq!(settings.output.json_path, PathBuf::from("out/results.json"));
    assert_eq!(settings.output.csv_path, PathBuf::from("data/output.csv"));
}

#[test]
fn explicit_null_log_file_disables_file_logging() {
    let file = write_settings("logging:\n  level: debug\n  file: null\n");
    let settings = load_settings(file.path()).unwrap();
    assert_eq!(settings.logging.level, "debug");
    assert!(settings.logging.file.is_none());
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_settings("   \n");
    let settings = load_settings(file.path()).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = load_settings_or_default(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn missing_file_is_an_error_for_strict_loader() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_settings(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileIo { .. }));
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let file = write_settings("scraper: [not, a, mapping\n");
    let err = load_settings_or_default(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::FileParse { .. }), "got: {err:?}");
}

#[test]
fn zero_timeout_fails_validation() {
    let file = write_settings("scraper:\n  timeout: 0\n");
    let err = load_settings(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)), "got: {err:?}");
}

#[test]
fn zero_max_retries_fails_validation() {
    let file = write_settings("scraper:\n  max_retries: 0\n");
    let err = load_settings(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)), "got: {err:?}");
}

#[test]
fn inverted_action_delays_fail_validation() {
    let file = write_settings("scraper:\n  min_action_delay: 4.0\n  max_action_delay: 1.0\n");
    let err = load_settings(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("min_action_delay")));
}

#[test]
fn zero_checkout_quantity_fails_validation() {
    let file = write_settings("scraper:\n  checkout_quantities: [1, 0]\n");
    let err = load_settings(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)), "got: {err:?}");
}

#[test]
fn duration_helpers_convert_seconds() {
    let scraper = ScraperSettings {
        delay_between_requests: 1.5,
        ..ScraperSettings::default()
    };
    assert_eq!(scraper.timeout(), Duration::from_secs(30));
    assert_eq!(scraper.field_timeout(), Duration::from_secs(5));
    assert_eq!(scraper.inter_request_delay(), Duration::from_millis(1500));
    assert_eq!(scraper.retry_delay(), Duration::from_secs(2));
}

#[test]
fn env_overrides_are_applied() {
    let mut map = HashMap::new();
    map.insert("SHELFSCAN_HEADLESS", "false");
    map.insert("SHELFSCAN_TIMEOUT_SECS", "60");
    map.insert("SHELFSCAN_CHROME_PATH", "/opt/chrome/chrome");
    map.insert("SHELFSCAN_LOG_LEVEL", "shelfscan=debug");

    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, lookup_from_map(&map)).unwrap();

    assert!(!settings.scraper.headless);
    assert_eq!(settings.scraper.timeout, 60);
    assert_eq!(
        settings.scraper.chrome_path,
        Some(PathBuf::from("/opt/chrome/chrome"))
    );
    assert_eq!(settings.logging.level, "shelfscan=debug");
}

#[test]
fn env_overrides_absent_leave_settings_unchanged() {
    let map = HashMap::new();
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, lookup_from_map(&map)).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn env_override_invalid_headless() {
    let mut map = HashMap::new();
    map.insert("SHELFSCAN_HEADLESS", "sometimes");
    let mut settings = Settings::default();
    let result = apply_env_overrides(&mut settings, lookup_from_map(&map));
    assert!(
        matches!(
            result,
            Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHELFSCAN_HEADLESS"
        ),
        "expected InvalidEnvVar(SHELFSCAN_HEADLESS), got: {result:?}"
    );
}

#[test]
fn env_override_invalid_timeout() {
    let mut map = HashMap::new();
    map.insert("SHELFSCAN_TIMEOUT_SECS", "not-a-number");
    let mut settings = Settings::default();
    let result = apply_env_overrides(&mut settings, lookup_from_map(&map));
    assert!(
        matches!(
            result,
            Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SHELFSCAN_TIMEOUT_SECS"
        ),
        "expected InvalidEnvVar(SHELFSCAN_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn env_override_zero_timeout_fails_validation() {
    let mut map = HashMap::new();
    map.insert("SHELFSCAN_TIMEOUT_SECS", "0");
    let mut settings = Settings::default();
    let result = apply_env_overrides(&mut settings, lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn parse_bool_accepts_common_spellings() {
    assert_eq!(parse_bool("TRUE"), Some(true));
    assert_eq!(parse_bool(" yes "), Some(true));
    assert_eq!(parse_bool("0"), Some(false));
    assert_eq!(parse_bool("off"), Some(false));
    assert_eq!(parse_bool("maybe"), None);
}

#[test]
fn shipped_settings_file_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/settings.yaml");
    let settings = load_settings(&path).unwrap();
    assert_eq!(settings, Settings::default());
}
