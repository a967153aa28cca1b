//! HTTP transport for single fetch attempts.
//!
//! ### Clients
//! - `strict`: rustls with standard webpki validation
//! - `overriding`: rustls with [`PolicyVerifier`](crate::trust::PolicyVerifier);
//!   chains from trusted providers are accepted, everything else is still
//!   validated
//!
//! An attempt's `trust_override` flag picks the client.
//!
//! ### Safety Gates
//! - Only 2xx responses are accepted
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 10MB (configurable), checked against Content-Length and the body
//! - Request timeout: 30s, connect timeout: 10s (configurable)

pub mod decode;
pub mod url;

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use assetfetch_core::{AppConfig, Error};
use bytes::Bytes;
use reqwest::{Client, header};

pub use decode::decode_asset;
pub use self::url::{UrlError, force_secure, parse_asset_url};

use crate::strategy::AttemptDescriptor;
use crate::trust::{TrustPolicy, policy_tls_config};

/// Executes one attempt and returns the raw response body.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, attempt: &AttemptDescriptor) -> Result<Bytes, Error>;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Connection establishment allowance (default: 10s)
    pub connect_timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for TransportConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    strict: Client,
    overriding: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a transport whose overriding client consults `policy`.
    pub fn new(config: TransportConfig, policy: Arc<TrustPolicy>) -> Result<Self, Error> {
        let strict = Self::builder(&config)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::ClientBuild(format!("failed to build HTTP client: {e}")))?;

        let overriding = Self::builder(&config)
            .use_preconfigured_tls(policy_tls_config(policy)?)
            .build()
            .map_err(|e| Error::ClientBuild(format!("failed to build overriding HTTP client: {e}")))?;

        Ok(Self { strict, overriding, config })
    }

    fn builder(config: &TransportConfig) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .brotli(true)
            .deflate(true)
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, attempt: &AttemptDescriptor) -> Result<Bytes, Error> {
        let start = Instant::now();
        let client = if attempt.trust_override() { &self.overriding } else { &self.strict };

        let mut request = client.get(attempt.url().clone());
        for (name, value) in attempt.headers() {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = attempt.cookie_header() {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError { status: status.as_u16() });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} ({}) in {}ms ({} bytes)",
            attempt.url(),
            attempt.step(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(bytes)
    }
}

/// Map a reqwest error, keeping the source chain so TLS failures stay readable.
fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        return Error::FetchTimeout(err.to_string());
    }

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    Error::Transport(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_transport_config_from_app_config() {
        let app = AppConfig { max_bytes: 1024, timeout_ms: 500, ..Default::default() };
        let config = TransportConfig::from(&app);
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_http_transport_new() {
        let policy = Arc::new(TrustPolicy::from_config(&AppConfig::default()));
        let transport = HttpTransport::new(TransportConfig::default(), policy);
        assert!(transport.is_ok());
    }
}
