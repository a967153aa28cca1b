//! Host-scoped certificate trust policy.
//!
//! A fixed set of content providers is known to present certificate chains
//! that fail default validation (self-signed, or rewritten by a middlebox)
//! while still being first-party sources. For hosts under those suffixes the
//! presented chain is accepted as-is; every other host keeps standard webpki
//! validation.
//!
//! ### Matching
//! - Case-insensitive, trailing dot ignored
//! - Label boundaries only: `toiimg.com` matches `static.toiimg.com` but
//!   not `nottoiimg.com`

pub mod verifier;

use rustls::pki_types::CertificateDer;
use x509_parser::x509::X509Name;

pub use verifier::{PolicyVerifier, policy_tls_config};

/// Whether `host` equals `suffix` or is a subdomain of it.
pub fn host_matches(host: &str, suffix: &str) -> bool {
    let host = host.trim_end_matches('.');
    let suffix = suffix.trim_start_matches('.').trim_end_matches('.');
    if suffix.is_empty() || host.len() < suffix.len() || !host.is_char_boundary(host.len() - suffix.len()) {
        return false;
    }

    let (head, tail) = host.split_at(host.len() - suffix.len());
    tail.eq_ignore_ascii_case(suffix) && (head.is_empty() || head.ends_with('.'))
}

/// Certificate chain presented by a server, end-entity first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTrust {
    chain: Vec<CertificateDer<'static>>,
}

impl ServerTrust {
    pub fn new(chain: Vec<CertificateDer<'static>>) -> Self {
        Self { chain }
    }

    /// Copy a chain out of a handshake.
    pub fn from_presented(end_entity: &CertificateDer<'_>, intermediates: &[CertificateDer<'_>]) -> Self {
        let mut chain = Vec::with_capacity(intermediates.len() + 1);
        chain.push(end_entity.clone().into_owned());
        chain.extend(intermediates.iter().map(|c| c.clone().into_owned()));
        Self { chain }
    }

    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Whether the end-entity certificate names itself as its issuer.
    ///
    /// Names are compared case-insensitively with whitespace collapsed. A
    /// certificate that does not parse is not self-signed.
    pub fn is_self_signed(&self) -> bool {
        let Some(end_entity) = self.chain.first() else {
            return false;
        };
        match x509_parser::parse_x509_certificate(end_entity.as_ref()) {
            Ok((_, cert)) => normalized_name(cert.subject()) == normalized_name(cert.issuer()),
            Err(_) => false,
        }
    }
}

fn normalized_name(name: &X509Name<'_>) -> String {
    name.to_string().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Outcome of a trust evaluation for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrustDecision {
    /// Skip chain validation and accept `credential`.
    pub override_validation: bool,
    /// The chain being accepted when overriding.
    pub credential: Option<ServerTrust>,
}

impl TrustDecision {
    /// Standard platform validation.
    pub fn default_handling() -> Self {
        Self::default()
    }
}

/// Static set of host suffixes whose certificate chains are accepted without validation.
#[derive(Debug, Clone, Default)]
pub struct TrustPolicy {
    trusted_suffixes: Vec<String>,
}

impl TrustPolicy {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let trusted_suffixes = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim().trim_matches('.').to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { trusted_suffixes }
    }

    pub fn from_config(config: &assetfetch_core::AppConfig) -> Self {
        Self::new(&config.trusted_hosts)
    }

    pub fn is_trusted(&self, host: &str) -> bool {
        self.trusted_suffixes.iter().any(|suffix| host_matches(host, suffix))
    }

    /// Pure host-level decision, made before any chain has been seen.
    pub fn decide(&self, host: &str) -> TrustDecision {
        TrustDecision { override_validation: self.is_trusted(host), credential: None }
    }

    /// Connection-time decision for the chain a server actually offered.
    ///
    /// A trusted host with nothing offered falls through to default handling.
    pub fn evaluate(&self, host: &str, offered: Option<ServerTrust>) -> TrustDecision {
        if !self.is_trusted(host) {
            return TrustDecision::default_handling();
        }

        match offered {
            Some(trust) if !trust.is_empty() => {
                TrustDecision { override_validation: true, credential: Some(trust) }
            }
            _ => {
                tracing::debug!(host = %host, "no server certificate offered; using default validation");
                TrustDecision::default_handling()
            }
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.trusted_suffixes
    }
}
