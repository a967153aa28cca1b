//! Attempt descriptors: one fully specified request.

use std::collections::BTreeMap;
use url::Url;

/// How an attempt is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStep {
    /// URL unchanged, browser user agent, standard validation.
    Standard,
    /// Extended headers, provider cookies, trust override.
    Override,
    /// Scheme forced to https, minimal headers, trust override.
    SecureFallback,
}

impl AttemptStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStep::Standard => "standard",
            AttemptStep::Override => "override",
            AttemptStep::SecureFallback => "secure_fallback",
        }
    }
}

impl std::fmt::Display for AttemptStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptDescriptor {
    step: AttemptStep,
    url: Url,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    trust_override: bool,
}

impl AttemptDescriptor {
    pub(crate) fn new(
        step: AttemptStep, url: Url, headers: BTreeMap<String, String>, cookies: BTreeMap<String, String>,
        trust_override: bool,
    ) -> Self {
        Self { step, url, headers, cookies, trust_override }
    }

    pub fn step(&self) -> AttemptStep {
        self.step
    }

    /// Target URL, possibly rewritten from the requested one.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn trust_override(&self) -> bool {
        self.trust_override
    }

    /// `Cookie` header value, `name=value` pairs joined with `"; "` in name order.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
