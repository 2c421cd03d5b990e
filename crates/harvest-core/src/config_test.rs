use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

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

#[test]
fn parse_bool_accepts_common_spellings() {
    assert_eq!(parse_bool("true"), Some(true));
    assert_eq!(parse_bool("YES"), Some(true));
    assert_eq!(parse_bool(" 1 "), Some(true));
    assert_eq!(parse_bool("false"), Some(false));
    assert_eq!(parse_bool("no"), Some(false));
    assert_eq!(parse_bool("0"), Some(false));
    assert_eq!(parse_bool("maybe"), None);
}

#[test]
fn build_app_config_uses_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    assert_eq!(cfg.input_path, PathBuf::from("./data/input.csv"));
    assert_eq!(cfg.profile_output, PathBuf::from("./data/profiles.json"));
    assert_eq!(cfg.post_output, PathBuf::from("./data/posts.json"));
    assert_eq!(cfg.cookie_file, PathBuf::from("./data/cookies.json"));
    assert!(!cfg.iterate_accounts);
    assert!((cfg.min_delay_secs - 30.0).abs() < f64::EPSILON);
    assert!((cfg.max_delay_secs - 90.0).abs() < f64::EPSILON);
    assert_eq!(cfg.request_timeout_secs, 20);
    assert_eq!(cfg.base_url, "https://www.linkedin.com");
    assert_eq!(cfg.posts_per_target, 50);
    assert_eq!(cfg.profile_retries, 0);
    assert_eq!(cfg.retry_backoff_base_ms, 2000);
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.log_dir.is_none());
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("HARVEST_ITERATE_ACCOUNTS", "yes");
    map.insert("HARVEST_MIN_DELAY_SECS", "1.5");
    map.insert("HARVEST_MAX_DELAY_SECS", "2.5");
    map.insert("HARVEST_PROFILE_OUTPUT", "/tmp/p.json");
    map.insert("HARVEST_LOG_DIR", "logs");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    assert!(cfg.iterate_accounts);
    assert!((cfg.min_delay_secs - 1.5).abs() < f64::EPSILON);
    assert!((cfg.max_delay_secs - 2.5).abs() < f64::EPSILON);
    assert_eq!(cfg.profile_output, PathBuf::from("/tmp/p.json"));
    assert_eq!(cfg.log_dir, Some(PathBuf::from("logs")));
}

#[test]
fn build_app_config_rejects_inverted_delay_range() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MIN_DELAY_SECS", "10");
    map.insert("HARVEST_MAX_DELAY_SECS", "5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::Validation(_))),
        "expected Validation error, got: {result:?}"
    );
}

#[test]
fn build_app_config_accepts_equal_delays() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MIN_DELAY_SECS", "0");
    map.insert("HARVEST_MAX_DELAY_SECS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.delay_bounds().0, cfg.delay_bounds().1);
}

#[test]
fn build_app_config_rejects_negative_delay() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MIN_DELAY_SECS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HARVEST_MIN_DELAY_SECS"),
        "expected InvalidEnvVar(HARVEST_MIN_DELAY_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_nan_delay() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MAX_DELAY_SECS", "NaN");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HARVEST_MAX_DELAY_SECS"),
        "expected InvalidEnvVar(HARVEST_MAX_DELAY_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_delay_beyond_duration_range() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MIN_DELAY_SECS", "1e30");
    map.insert("HARVEST_MAX_DELAY_SECS", "1e30");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HARVEST_MIN_DELAY_SECS"),
        "expected InvalidEnvVar(HARVEST_MIN_DELAY_SECS), got: {result:?}"
    );
}

#[test]
fn large_but_representable_delay_converts() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MIN_DELAY_SECS", "86400");
    map.insert("HARVEST_MAX_DELAY_SECS", "1e9");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let (min, max) = cfg.delay_bounds();
    assert_eq!(min, Duration::from_secs(86_400));
    assert_eq!(max, Duration::from_secs(1_000_000_000));
}

#[test]
fn build_app_config_rejects_invalid_flag() {
    let mut map = HashMap::new();
    map.insert("HARVEST_ITERATE_ACCOUNTS", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HARVEST_ITERATE_ACCOUNTS"),
        "expected InvalidEnvVar(HARVEST_ITERATE_ACCOUNTS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_out_of_range_timeout() {
    let mut map = HashMap::new();
    map.insert("HARVEST_REQUEST_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::Validation(_))),
        "expected Validation error, got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_numeric_retries() {
    let mut map = HashMap::new();
    map.insert("HARVEST_PROFILE_RETRIES", "a few");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HARVEST_PROFILE_RETRIES"),
        "expected InvalidEnvVar(HARVEST_PROFILE_RETRIES), got: {result:?}"
    );
}

#[test]
fn blank_log_dir_is_treated_as_unset() {
    let mut map = HashMap::new();
    map.insert("HARVEST_LOG_DIR", "  ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.log_dir.is_none());
}
