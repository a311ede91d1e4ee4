//! Configuration module for bridge and query settings
//!
//! All configuration is loaded from environment variables. Mail accounts are
//! owned by the mail application itself and discovered through the bridge at
//! call time, so the environment carries only tuning knobs: timeouts, fetch
//! caps, the fuzzy-match threshold, and draft read-back retry parameters.

use std::env;
use std::env::VarError;

use crate::errors::{AppError, AppResult};

/// Server-wide configuration
///
/// Cloned into MCP tool handlers via `Arc` for thread-safe shared access.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bounded window for the startup connectivity probe in milliseconds.
    /// On expiry the server starts in degraded (lazy) mode.
    pub launch_timeout_ms: u64,
    /// Per-script subprocess timeout in milliseconds
    pub script_timeout_ms: u64,
    /// Whether the adapter may launch the mail application if it is not
    /// running (one attempt before reporting it unavailable)
    pub auto_launch: bool,
    /// Most-recently-indexed messages fetched per mailbox per list call
    pub mailbox_fetch_cap: usize,
    /// Minimum similarity score for a message to survive search ranking
    pub fuzzy_threshold: f64,
    /// Attempts when reading back asynchronously populated draft content
    pub draft_content_attempts: u32,
    /// Fixed delay between draft content read-back attempts in milliseconds
    pub draft_content_delay_ms: u64,
}

impl ServerConfig {
    /// Load all configuration from environment variables
    ///
    /// Every key is optional; unset keys fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a variable is set but malformed.
    ///
    /// # Example Environment
    ///
    /// ```text
    /// MAIL_BRIDGE_LAUNCH_TIMEOUT_MS=10000
    /// MAIL_BRIDGE_SCRIPT_TIMEOUT_MS=120000
    /// MAIL_BRIDGE_AUTO_LAUNCH=true
    /// MAIL_QUERY_MAILBOX_FETCH_CAP=200
    /// MAIL_QUERY_FUZZY_THRESHOLD=0.55
    /// MAIL_DRAFT_CONTENT_ATTEMPTS=5
    /// MAIL_DRAFT_CONTENT_DELAY_MS=300
    /// ```
    pub fn load_from_env() -> AppResult<Self> {
        let config = Self {
            launch_timeout_ms: parse_u64_env("MAIL_BRIDGE_LAUNCH_TIMEOUT_MS", 10_000)?,
            script_timeout_ms: parse_u64_env("MAIL_BRIDGE_SCRIPT_TIMEOUT_MS", 120_000)?,
            auto_launch: parse_bool_env("MAIL_BRIDGE_AUTO_LAUNCH", true)?,
            mailbox_fetch_cap: parse_usize_env("MAIL_QUERY_MAILBOX_FETCH_CAP", 200)?,
            fuzzy_threshold: parse_f64_env("MAIL_QUERY_FUZZY_THRESHOLD", 0.55)?,
            draft_content_attempts: parse_u32_env("MAIL_DRAFT_CONTENT_ATTEMPTS", 5)?,
            draft_content_delay_ms: parse_u64_env("MAIL_DRAFT_CONTENT_DELAY_MS", 300)?,
        };

        if !(0.0..=1.0).contains(&config.fuzzy_threshold) {
            return Err(AppError::InvalidInput(
                "MAIL_QUERY_FUZZY_THRESHOLD must be in range 0.0..1.0".to_owned(),
            ));
        }
        if config.mailbox_fetch_cap == 0 {
            return Err(AppError::InvalidInput(
                "MAIL_QUERY_MAILBOX_FETCH_CAP must be at least 1".to_owned(),
            ));
        }
        if config.draft_content_attempts == 0 {
            return Err(AppError::InvalidInput(
                "MAIL_DRAFT_CONTENT_ATTEMPTS must be at least 1".to_owned(),
            ));
        }

        Ok(config)
    }
}

/// Parse a boolean environment variable with flexible values
///
/// Accepts: `1`, `true`, `yes`, `y`, `on` (truthy) or `0`, `false`, `no`,
/// `n`, `off` (falsy). Case-insensitive. Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set to an unrecognized value.
fn parse_bool_env(key: &str, default: bool) -> AppResult<bool> {
    match env::var(key) {
        Ok(v) => parse_bool_value(&v).ok_or_else(|| {
            AppError::InvalidInput(format!("invalid boolean environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

fn parse_bool_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a `u32` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `u32`.
fn parse_u32_env(key: &str, default: u32) -> AppResult<u32> {
    match env::var(key) {
        Ok(v) => v.parse::<u32>().map_err(|_| {
            AppError::InvalidInput(format!("invalid u32 environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a `u64` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `u64`.
fn parse_u64_env(key: &str, default: u64) -> AppResult<u64> {
    match env::var(key) {
        Ok(v) => v.parse::<u64>().map_err(|_| {
            AppError::InvalidInput(format!("invalid u64 environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a `usize` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `usize`.
fn parse_usize_env(key: &str, default: usize) -> AppResult<usize> {
    match env::var(key) {
        Ok(v) => v.parse::<usize>().map_err(|_| {
            AppError::InvalidInput(format!("invalid usize environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse an `f64` environment variable with default fallback
///
/// Returns `default` if unset. Rejects non-finite values.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid finite `f64`.
fn parse_f64_env(key: &str, default: f64) -> AppResult<f64> {
    match env::var(key) {
        Ok(v) => match v.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Ok(parsed),
            _ => Err(AppError::InvalidInput(format!(
                "invalid f64 environment variable {key}: '{v}'"
            ))),
        },
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bool_value;

    #[test]
    fn parse_bool_value_accepts_common_truthy_and_falsy_values() {
        for truthy in ["1", "true", "TRUE", " yes ", "Y", "on"] {
            assert_eq!(parse_bool_value(truthy), Some(true));
        }

        for falsy in ["0", "false", "FALSE", " no ", "N", "off"] {
            assert_eq!(parse_bool_value(falsy), Some(false));
        }
    }

    #[test]
    fn parse_bool_value_rejects_unrecognized_values() {
        for invalid in ["", "2", "maybe", "enabled", "disabled"] {
            assert_eq!(parse_bool_value(invalid), None);
        }
    }
}
