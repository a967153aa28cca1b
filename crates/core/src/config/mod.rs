//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ASSETFETCH_*)
//! 2. TOML config file (if ASSETFETCH_CONFIG_FILE set, or passed explicitly)
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Browser-identifying user agent sent with every attempt.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ASSETFETCH_*)
/// 2. TOML config file
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for standard attempts.
    ///
    /// Set via ASSETFETCH_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-attempt request timeout in milliseconds.
    ///
    /// Set via ASSETFETCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long an attempt may wait for a connection to be established.
    ///
    /// Set via ASSETFETCH_CONNECT_TIMEOUT_MS environment variable.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum bytes accepted for a single asset.
    ///
    /// Set via ASSETFETCH_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum number of redirects followed per attempt.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Maximum number of cached assets.
    ///
    /// Set via ASSETFETCH_CACHE_CAPACITY environment variable.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Maximum total payload bytes held by the cache.
    ///
    /// Set via ASSETFETCH_CACHE_MAX_BYTES environment variable.
    #[serde(default = "default_cache_max_bytes")]
    pub cache_max_bytes: usize,

    /// Host suffixes whose certificate chains are accepted without validation.
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,

    /// Host suffixes fetched with the extended header set, cookies and trust override.
    #[serde(default = "default_override_hosts")]
    pub override_hosts: Vec<String>,

    /// Host suffixes that get a secure-scheme fallback when the first attempt fails.
    #[serde(default = "default_scheme_fragile_hosts")]
    pub scheme_fragile_hosts: Vec<String>,

    /// Cookies sent to override hosts.
    #[serde(default = "default_override_cookies")]
    pub override_cookies: BTreeMap<String, String>,

    /// Share one attempt sequence between concurrent fetches of the same key.
    ///
    /// Set via ASSETFETCH_COALESCE_INFLIGHT environment variable.
    #[serde(default)]
    pub coalesce_inflight: bool,
}

fn default_user_agent() -> String {
    BROWSER_USER_AGENT.into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_redirects() -> usize {
    5
}

fn default_cache_capacity() -> usize {
    256
}

fn default_cache_max_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_trusted_hosts() -> Vec<String> {
    vec!["hindustantimes.com".into(), "toiimg.com".into(), "indiatimes.com".into()]
}

fn default_override_hosts() -> Vec<String> {
    vec!["hindustantimes.com".into()]
}

fn default_scheme_fragile_hosts() -> Vec<String> {
    vec!["static.toiimg.com".into()]
}

fn default_override_cookies() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Meta-Geo".to_string(), "IN--DL--NEWDELHI".to_string()),
        ("ht-location".to_string(), "IN".to_string()),
    ])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
            cache_capacity: default_cache_capacity(),
            cache_max_bytes: default_cache_max_bytes(),
            trusted_hosts: default_trusted_hosts(),
            override_hosts: default_override_hosts(),
            scheme_fragile_hosts: default_scheme_fragile_hosts(),
            override_cookies: default_override_cookies(),
            coalesce_inflight: false,
        }
    }
}

impl AppConfig {
    /// Per-attempt timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connection-establishment allowance as Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// The TOML file is taken from `ASSETFETCH_CONFIG_FILE` when set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("ASSETFETCH_CONFIG_FILE").ok();
        Self::load_from(file.as_deref().map(Path::new))
    }

    /// Load configuration, reading the TOML layer from `file` when given.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::load`].
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("ASSETFETCH_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
