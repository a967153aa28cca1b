//! Fetch strategies: which attempts to make for a URL, and in what order.
//!
//! A [`StrategyRegistry`] maps host suffixes to a list of [`AttemptStep`]s.
//! The first rule whose suffix matches the URL's host wins; unmatched hosts
//! get the default single standard attempt. Supporting another provider
//! means registering a rule.
//!
//! Attempts are produced by an [`AttemptPlan`] iterator that only builds a
//! descriptor when it is pulled, so a fallback is never constructed once an
//! earlier attempt has succeeded.

pub mod attempt;

use std::collections::BTreeMap;
use std::sync::Arc;

use assetfetch_core::{AppConfig, Error};
use url::Url;

pub use attempt::{AttemptDescriptor, AttemptStep};

use crate::fetch::url::{force_secure, parse_asset_url};
use crate::trust::host_matches;

/// Accept header sent by override attempts.
pub const OVERRIDE_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// User agent for secure-scheme fallbacks.
pub const MINIMAL_USER_AGENT: &str = "Mozilla/5.0";

/// Header and cookie values shared by every attempt a registry builds.
#[derive(Debug, Clone)]
pub struct RequestProfile {
    pub user_agent: String,
    pub fallback_user_agent: String,
    pub override_cookies: BTreeMap<String, String>,
}

impl RequestProfile {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            fallback_user_agent: MINIMAL_USER_AGENT.to_string(),
            override_cookies: config.override_cookies.clone(),
        }
    }
}

impl Default for RequestProfile {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Attempt steps applied to hosts under `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRule {
    pub suffix: String,
    pub steps: Vec<AttemptStep>,
}

impl HostRule {
    pub fn new(suffix: impl Into<String>, steps: Vec<AttemptStep>) -> Self {
        Self { suffix: suffix.into(), steps }
    }

    /// Single override attempt with provider cookies.
    pub fn override_host(suffix: impl Into<String>) -> Self {
        Self::new(suffix, vec![AttemptStep::Override])
    }

    /// Standard attempt, then an https fallback with trust override.
    pub fn scheme_fragile(suffix: impl Into<String>) -> Self {
        Self::new(suffix, vec![AttemptStep::Standard, AttemptStep::SecureFallback])
    }
}

/// Registry of host rules.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    rules: Vec<HostRule>,
    default_steps: Vec<AttemptStep>,
    profile: Arc<RequestProfile>,
}

impl StrategyRegistry {
    /// Registry with no host rules.
    pub fn new(profile: RequestProfile) -> Self {
        Self { rules: Vec::new(), default_steps: vec![AttemptStep::Standard], profile: Arc::new(profile) }
    }

    /// Override hosts first, then scheme-fragile hosts.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new(RequestProfile::from_config(config));
        for host in &config.override_hosts {
            registry.register(HostRule::override_host(host.as_str()));
        }
        for host in &config.scheme_fragile_hosts {
            registry.register(HostRule::scheme_fragile(host.as_str()));
        }
        registry
    }

    /// Append a rule. Earlier rules take precedence.
    pub fn register(&mut self, rule: HostRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[HostRule] {
        &self.rules
    }

    /// Steps that apply to `host`.
    pub fn steps_for(&self, host: &str) -> &[AttemptStep] {
        self.rules
            .iter()
            .find(|rule| host_matches(host, &rule.suffix))
            .map(|rule| rule.steps.as_slice())
            .unwrap_or(&self.default_steps)
    }

    /// Ordered, lazily built attempts for `url`.
    pub fn build_attempts(&self, url: &str) -> Result<AttemptPlan, Error> {
        let parsed = parse_asset_url(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let host = parsed.host_str().unwrap_or_default();
        let steps = self.steps_for(host).to_vec();

        Ok(AttemptPlan { url: parsed, steps: steps.into_iter(), profile: Arc::clone(&self.profile), built: 0 })
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Lazily evaluated sequence of attempts for one fetch.
#[derive(Debug)]
pub struct AttemptPlan {
    url: Url,
    steps: std::vec::IntoIter<AttemptStep>,
    profile: Arc<RequestProfile>,
    built: usize,
}

impl AttemptPlan {
    /// Number of descriptors constructed so far.
    pub fn built(&self) -> usize {
        self.built
    }

    /// Steps not yet turned into descriptors.
    pub fn remaining_steps(&self) -> &[AttemptStep] {
        self.steps.as_slice()
    }

    fn build(&self, step: AttemptStep) -> Option<AttemptDescriptor> {
        let profile = &self.profile;
        let descriptor = match step {
            AttemptStep::Standard => AttemptDescriptor::new(
                step,
                self.url.clone(),
                BTreeMap::from([("User-Agent".to_string(), profile.user_agent.clone())]),
                BTreeMap::new(),
                false,
            ),
            AttemptStep::Override => AttemptDescriptor::new(
                step,
                self.url.clone(),
                BTreeMap::from([
                    ("User-Agent".to_string(), profile.user_agent.clone()),
                    ("Accept".to_string(), OVERRIDE_ACCEPT.to_string()),
                    ("Connection".to_string(), "keep-alive".to_string()),
                    ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
                ]),
                profile.override_cookies.clone(),
                true,
            ),
            AttemptStep::SecureFallback => {
                let url = match force_secure(&self.url) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::warn!(url = %self.url, error = %e, "cannot build secure fallback");
                        return None;
                    }
                };
                AttemptDescriptor::new(
                    step,
                    url,
                    BTreeMap::from([("User-Agent".to_string(), profile.fallback_user_agent.clone())]),
                    BTreeMap::new(),
                    true,
                )
            }
        };
        Some(descriptor)
    }
}

impl Iterator for AttemptPlan {
    type Item = AttemptDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let step = self.steps.next()?;
            if let Some(descriptor) = self.build(step) {
                self.built += 1;
                return Some(descriptor);
            }
        }
    }
}
