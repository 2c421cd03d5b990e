use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or fails validation.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_secs = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        Duration::try_from_secs_f64(value).map_err(|e| {
            invalid(
                var,
                format!("must be a non-negative number of seconds within range (got {value}): {e}"),
            )
        })?;
        Ok(value)
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false/1/0/yes/no".to_string(),
            )
        })
    };

    let input_path = PathBuf::from(or_default("HARVEST_INPUT_PATH", "./data/input.csv"));
    let profile_output = PathBuf::from(or_default(
        "HARVEST_PROFILE_OUTPUT",
        "./data/profiles.json",
    ));
    let post_output = PathBuf::from(or_default("HARVEST_POST_OUTPUT", "./data/posts.json"));
    let cookie_file = PathBuf::from(or_default("HARVEST_COOKIE_FILE", "./data/cookies.json"));

    let iterate_accounts = parse_flag("HARVEST_ITERATE_ACCOUNTS", "false")?;
    let min_delay_secs = parse_secs("HARVEST_MIN_DELAY_SECS", "30")?;
    let max_delay_secs = parse_secs("HARVEST_MAX_DELAY_SECS", "90")?;
    if min_delay_secs > max_delay_secs {
        return Err(ConfigError::Validation(format!(
            "HARVEST_MIN_DELAY_SECS ({min_delay_secs}) must not exceed HARVEST_MAX_DELAY_SECS ({max_delay_secs})"
        )));
    }

    let request_timeout_secs = parse_u64("HARVEST_REQUEST_TIMEOUT_SECS", "20")?;
    if !(1..=120).contains(&request_timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "HARVEST_REQUEST_TIMEOUT_SECS must be between 1 and 120 (got {request_timeout_secs})"
        )));
    }

    let user_agent = or_default("HARVEST_USER_AGENT", DEFAULT_USER_AGENT);
    let base_url = or_default("HARVEST_BASE_URL", "https://www.linkedin.com");
    let posts_per_target = parse_u32("HARVEST_POSTS_PER_TARGET", "50")?;
    let profile_retries = parse_u32("HARVEST_PROFILE_RETRIES", "0")?;
    let retry_backoff_base_ms = parse_u64("HARVEST_RETRY_BACKOFF_BASE_MS", "2000")?;
    let log_level = or_default("HARVEST_LOG_LEVEL", "info");
    let log_dir = lookup("HARVEST_LOG_DIR")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    Ok(AppConfig {
        input_path,
        profile_output,
        post_output,
        cookie_file,
        iterate_accounts,
        min_delay_secs,
        max_delay_secs,
        request_timeout_secs,
        user_agent,
        base_url,
        posts_per_target,
        profile_retries,
        retry_backoff_base_ms,
        log_level,
        log_dir,
    })
}

/// Parse the boolean spellings accepted in env vars.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
