//! Message bus configuration loaded from environment variables.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default recipient of out-of-stock notifications.
pub const DEFAULT_OUT_OF_STOCK_RECIPIENT: &str = "stock@made.com";

/// Default broker channel for allocation announcements.
pub const DEFAULT_LINE_ALLOCATED_CHANNEL: &str = "line_allocated";

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `ALLOCATION_RETRY_MAX_ATTEMPTS` (default: `3`)
/// - `ALLOCATION_RETRY_INITIAL_BACKOFF_MS` (default: `1000`)
/// - `ALLOCATION_RETRY_MAX_BACKOFF_MS` (default: `10000`)
/// - `OUT_OF_STOCK_RECIPIENT` (default: `"stock@made.com"`)
/// - `LINE_ALLOCATED_CHANNEL` (default: `"line_allocated"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub retry: RetryPolicy,
    pub out_of_stock_recipient: String,
    pub line_allocated_channel: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = RetryPolicy::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            retry: RetryPolicy {
                max_attempts: lookup("ALLOCATION_RETRY_MAX_ATTEMPTS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_attempts),
                initial_backoff: millis(
                    "ALLOCATION_RETRY_INITIAL_BACKOFF_MS",
                    defaults.initial_backoff,
                ),
                multiplier: defaults.multiplier,
                max_backoff: millis("ALLOCATION_RETRY_MAX_BACKOFF_MS", defaults.max_backoff),
            },
            out_of_stock_recipient: lookup("OUT_OF_STOCK_RECIPIENT")
                .unwrap_or_else(|| DEFAULT_OUT_OF_STOCK_RECIPIENT.to_string()),
            line_allocated_channel: lookup("LINE_ALLOCATED_CHANNEL")
                .unwrap_or_else(|| DEFAULT_LINE_ALLOCATED_CHANNEL.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            out_of_stock_recipient: DEFAULT_OUT_OF_STOCK_RECIPIENT.to_string(),
            line_allocated_channel: DEFAULT_LINE_ALLOCATED_CHANNEL.to_string(),
        }
    }
}
