//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` or `connect_timeout_ms` is below 100ms or above 5 minutes
    /// - `user_agent` is empty
    /// - either cache bound is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        check_millis("timeout_ms", self.timeout_ms)?;
        check_millis("connect_timeout_ms", self.connect_timeout_ms)?;

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid { field: "cache_capacity".into(), reason: "must be at least 1".into() });
        }
        if self.cache_max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "cache_max_bytes".into(), reason: "must be at least 1".into() });
        }

        if self.cache_max_bytes < self.max_bytes {
            tracing::warn!(
                cache_max_bytes = self.cache_max_bytes,
                max_bytes = self.max_bytes,
                "cache_max_bytes is smaller than max_bytes; the largest assets will never be cached"
            );
        }

        for host in &self.override_hosts {
            if !self.trusted_hosts.iter().any(|t| t.eq_ignore_ascii_case(host)) {
                tracing::warn!(host = %host, "override host is not listed in trusted_hosts; its certificates stay validated");
            }
        }

        Ok(())
    }
}

fn check_millis(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < 100 {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
    }
    if value > 300_000 {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must not exceed 5 minutes (300000ms)".into() });
    }
    Ok(())
}
