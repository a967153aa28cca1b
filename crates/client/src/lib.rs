//! Client code for assetfetch.
//!
//! This crate provides the host trust policy, fetch strategies, the HTTP
//! transport and the [`AssetFetcher`] that ties them to the asset cache.

pub mod fetch;
pub mod fetcher;
pub mod strategy;
pub mod trust;

pub use fetch::{HttpTransport, Transport, TransportConfig, decode_asset};
pub use fetcher::{AssetFetcher, FetchOutcome};
pub use strategy::{AttemptDescriptor, AttemptPlan, AttemptStep, HostRule, RequestProfile, StrategyRegistry};
pub use trust::{PolicyVerifier, ServerTrust, TrustDecision, TrustPolicy};
