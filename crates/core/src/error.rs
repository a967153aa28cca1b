//! Unified error types for assetfetch.
//!
//! Every variant renders with a stable code prefix so log lines can be
//! grouped without parsing the free-form detail.

/// Unified error type for a single fetch attempt or client setup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The asset URL could not be parsed or uses an unsupported scheme.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Non-2xx response status.
    #[error("HTTP_ERROR: status {status}")]
    HttpError { status: u16 },

    /// Connection, DNS, TLS handshake or body read failure.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// The attempt did not finish within the per-attempt timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Response body exceeds the configured byte limit.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Payload is not a decodable image.
    #[error("DECODE_FAILED: {0}")]
    DecodeFailed(String),

    /// TLS verifier or root store could not be assembled.
    #[error("TLS_CONFIG: {0}")]
    TlsConfig(String),

    /// HTTP client could not be built.
    #[error("CLIENT_BUILD: {0}")]
    ClientBuild(String),
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::HttpError { .. } => "HTTP_ERROR",
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
            Error::FetchTooLarge(_) => "FETCH_TOO_LARGE",
            Error::DecodeFailed(_) => "DECODE_FAILED",
            Error::TlsConfig(_) => "TLS_CONFIG",
            Error::ClientBuild(_) => "CLIENT_BUILD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DecodeFailed("not an image".to_string());
        assert!(err.to_string().contains("DECODE_FAILED"));
        assert!(err.to_string().contains("not an image"));
    }

    #[test]
    fn test_http_error_display() {
        let err = Error::HttpError { status: 404 };
        assert_eq!(err.to_string(), "HTTP_ERROR: status 404");
    }

    #[test]
    fn test_code_matches_display_prefix() {
        let errors = [
            Error::InvalidUrl("x".into()),
            Error::HttpError { status: 500 },
            Error::Transport("x".into()),
            Error::FetchTimeout("x".into()),
            Error::FetchTooLarge("x".into()),
            Error::DecodeFailed("x".into()),
            Error::TlsConfig("x".into()),
            Error::ClientBuild("x".into()),
        ];
        for err in errors {
            assert!(err.to_string().starts_with(err.code()), "{err}");
        }
    }
}
