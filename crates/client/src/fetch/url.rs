//! Asset URL parsing for request construction.
//!
//! The cache is keyed by the caller's string verbatim; these helpers only
//! shape the URL that goes on the wire.

/// Error type for asset URL failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse an asset URL for fetching.
///
/// Steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an explicit http or https scheme
/// 3. Require a host
/// 4. Drop the fragment, which is never sent
pub fn parse_asset_url(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Copy of `url` with the scheme forced to https.
pub fn force_secure(url: &url::Url) -> Result<url::Url, UrlError> {
    let mut secure = url.clone();
    if secure.scheme() != "https" {
        secure
            .set_scheme("https")
            .map_err(|_| UrlError::UnsupportedScheme(url.scheme().to_string()))?;
    }
    Ok(secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let url = parse_asset_url("https://static.toiimg.com/photo/1.jpg").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("static.toiimg.com"));
        assert_eq!(url.path(), "/photo/1.jpg");
    }

    #[test]
    fn test_parse_trim_whitespace() {
        let url = parse_asset_url("  https://example.com/a.png  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a.png");
    }

    #[test]
    fn test_parse_preserves_query_drops_fragment() {
        let url = parse_asset_url("https://example.com/a.png?w=300&h=200#top").unwrap();
        assert_eq!(url.query(), Some("w=300&h=200"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_parse_requires_scheme() {
        assert!(matches!(parse_asset_url("example.com/a.png"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_unsupported_scheme() {
        assert!(matches!(parse_asset_url("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(parse_asset_url("data:image/png;base64,AAAA"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(parse_asset_url(""), Err(UrlError::Empty)));
        assert!(matches!(parse_asset_url("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_force_secure_upgrades_http() {
        let url = parse_asset_url("http://static.toiimg.com/photo/1.jpg?x=1").unwrap();
        let secure = force_secure(&url).unwrap();
        assert_eq!(secure.as_str(), "https://static.toiimg.com/photo/1.jpg?x=1");
    }

    #[test]
    fn test_force_secure_keeps_https() {
        let url = parse_asset_url("https://static.toiimg.com/photo/1.jpg").unwrap();
        assert_eq!(force_secure(&url).unwrap(), url);
    }
}
