//! rustls certificate verifier driven by [`TrustPolicy`].
//!
//! Chains from trusted providers are accepted after logging what was
//! presented. All other chains go through the webpki verifier with the
//! Mozilla root set. Handshake signatures are checked in both cases.

use std::sync::Arc;

use assetfetch_core::Error;
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};

use super::{ServerTrust, TrustPolicy};

/// Certificate verifier that consults a [`TrustPolicy`] per connection.
#[derive(Debug)]
pub struct PolicyVerifier {
    policy: Arc<TrustPolicy>,
    webpki: Arc<WebPkiServerVerifier>,
}

impl PolicyVerifier {
    pub fn new(policy: Arc<TrustPolicy>, provider: Arc<CryptoProvider>) -> Result<Self, Error> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let webpki = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| Error::TlsConfig(format!("failed to build webpki verifier: {e}")))?;

        Ok(Self { policy, webpki })
    }
}

impl ServerCertVerifier for PolicyVerifier {
    fn verify_server_cert(
        &self, end_entity: &CertificateDer<'_>, intermediates: &[CertificateDer<'_>], server_name: &ServerName<'_>,
        ocsp_response: &[u8], now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let host = server_name.to_str();
        let offered = self
            .policy
            .is_trusted(&host)
            .then(|| ServerTrust::from_presented(end_entity, intermediates));

        let decision = self.policy.evaluate(&host, offered);
        if decision.override_validation
            && let Some(trust) = &decision.credential
        {
            tracing::info!(
                host = %host,
                chain_len = trust.len(),
                self_signed = trust.is_self_signed(),
                "accepting presented certificate chain for trusted provider"
            );
            return Ok(ServerCertVerified::assertion());
        }

        self.webpki
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self, message: &[u8], cert: &CertificateDer<'_>, dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.webpki.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self, message: &[u8], cert: &CertificateDer<'_>, dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.webpki.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.webpki.supported_verify_schemes()
    }
}

/// Build a rustls client config whose certificate checks go through `policy`.
pub fn policy_tls_config(policy: Arc<TrustPolicy>) -> Result<rustls::ClientConfig, Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = PolicyVerifier::new(policy, Arc::clone(&provider))?;

    let mut config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::TlsConfig(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> PolicyVerifier {
        let policy = Arc::new(TrustPolicy::new(["hindustantimes.com"]));
        PolicyVerifier::new(policy, Arc::new(rustls::crypto::ring::default_provider())).unwrap()
    }

    #[test]
    fn test_trusted_host_accepts_any_chain() {
        let verifier = verifier();
        let garbage = CertificateDer::from(vec![0u8; 16]);
        let name = ServerName::try_from("www.hindustantimes.com").unwrap();
        let result = verifier.verify_server_cert(&garbage, &[], &name, &[], UnixTime::now());
        assert!(result.is_ok());
    }

    #[test]
    fn test_other_host_is_validated() {
        let verifier = verifier();
        let garbage = CertificateDer::from(vec![0u8; 16]);
        let name = ServerName::try_from("example.com").unwrap();
        let result = verifier.verify_server_cert(&garbage, &[], &name, &[], UnixTime::now());
        assert!(result.is_err());
    }

    #[test]
    fn test_supported_schemes_not_empty() {
        assert!(!verifier().supported_verify_schemes().is_empty());
    }

    #[test]
    fn test_policy_tls_config_builds() {
        let config = policy_tls_config(Arc::new(TrustPolicy::default())).unwrap();
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }
}
