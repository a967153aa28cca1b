//! Asset fetcher: cache lookup, attempt sequence, decode, cache population.
//!
//! ```text
//! Idle -> CacheCheck -> hit: Done
//!                    -> miss: Attempting -> success: CachePut -> Done
//!                                        -> exhausted: Failed
//! ```
//!
//! Failures never escape [`AssetFetcher::fetch`]; an absent asset is an
//! ordinary result the caller answers with a placeholder.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use assetfetch_core::{AppConfig, Asset, AssetCache, Error};
use tokio::sync::OnceCell;

use crate::fetch::{HttpTransport, Transport, TransportConfig, decode_asset};
use crate::strategy::{AttemptDescriptor, StrategyRegistry};
use crate::trust::TrustPolicy;

/// Result of one attempt, or of a whole fetch.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(Asset),
    Failure(Error),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn into_asset(self) -> Option<Asset> {
        match self {
            FetchOutcome::Success(asset) => Some(asset),
            FetchOutcome::Failure(_) => None,
        }
    }
}

type InflightCell = Arc<OnceCell<FetchOutcome>>;
type InflightMap = Mutex<HashMap<String, InflightCell>>;

/// Never held across an await point.
fn lock_inflight(inflight: &InflightMap) -> MutexGuard<'_, HashMap<String, InflightCell>> {
    inflight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a coalesced entry when its caller finishes or is dropped.
///
/// The entry goes once the cell has settled, or when no other caller still
/// shares it, so neither a cancelled fetch nor a finished one leaves a cell
/// behind for later callers.
struct InflightGuard<'a> {
    inflight: &'a InflightMap,
    url: &'a str,
    cell: &'a InflightCell,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        let mut map = lock_inflight(self.inflight);
        // map + this caller
        let unshared = Arc::strong_count(self.cell) <= 2;
        if (self.cell.initialized() || unshared)
            && map.get(self.url).is_some_and(|current| Arc::ptr_eq(current, self.cell))
        {
            map.remove(self.url);
        }
    }
}

/// Resilient, cache-backed image fetcher.
pub struct AssetFetcher {
    cache: Arc<AssetCache>,
    strategy: StrategyRegistry,
    transport: Arc<dyn Transport>,
    attempt_timeout: Duration,
    inflight: Option<InflightMap>,
}

impl AssetFetcher {
    /// Build a fetcher with the reqwest transport described by `config`.
    pub fn new(config: &AppConfig, cache: Arc<AssetCache>) -> Result<Self, Error> {
        let policy = Arc::new(TrustPolicy::from_config(config));
        let transport = HttpTransport::new(TransportConfig::from(config), policy)?;
        Ok(Self::with_transport(config, cache, Arc::new(transport)))
    }

    /// Build a fetcher around any transport.
    pub fn with_transport(config: &AppConfig, cache: Arc<AssetCache>, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache,
            strategy: StrategyRegistry::from_config(config),
            transport,
            attempt_timeout: config.timeout(),
            inflight: config.coalesce_inflight.then(|| Mutex::new(HashMap::new())),
        }
    }

    /// Replace the strategy registry.
    pub fn with_strategy(mut self, strategy: StrategyRegistry) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn cache(&self) -> &Arc<AssetCache> {
        &self.cache
    }

    pub fn strategy(&self) -> &StrategyRegistry {
        &self.strategy
    }

    /// Fetch an asset by URL. `None` means it could not be fetched.
    pub async fn fetch(&self, url: &str) -> Option<Asset> {
        self.fetch_outcome(url).await.into_asset()
    }

    /// Like [`fetch`](Self::fetch), keeping the last failure reason.
    pub async fn fetch_outcome(&self, url: &str) -> FetchOutcome {
        if let Some(asset) = self.cache.get(url).await {
            tracing::debug!("cache hit for {}", url);
            return FetchOutcome::Success(asset);
        }

        match &self.inflight {
            Some(inflight) => self.fetch_coalesced(inflight, url).await,
            None => self.fetch_uncached(url).await,
        }
    }

    async fn fetch_coalesced(&self, inflight: &InflightMap, url: &str) -> FetchOutcome {
        let cell = {
            let mut map = lock_inflight(inflight);
            let slot = map.entry(url.to_string()).or_default();
            if slot.initialized() {
                *slot = InflightCell::default();
            }
            Arc::clone(slot)
        };
        let _guard = InflightGuard { inflight, url, cell: &cell };

        cell.get_or_init(|| self.fetch_uncached(url)).await.clone()
    }

    async fn fetch_uncached(&self, url: &str) -> FetchOutcome {
        let plan = match self.strategy.build_attempts(url) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "cannot fetch asset");
                return FetchOutcome::Failure(e);
            }
        };

        let mut last_error = Error::InvalidUrl(format!("no attempts for {url}"));
        for attempt in plan {
            match self.run_attempt(&attempt).await {
                FetchOutcome::Success(asset) => {
                    self.cache.put(url, asset.clone()).await;
                    return FetchOutcome::Success(asset);
                }
                FetchOutcome::Failure(e) => {
                    tracing::warn!(
                        url = %url,
                        request_url = %attempt.url(),
                        step = %attempt.step(),
                        code = e.code(),
                        error = %e,
                        "fetch attempt failed"
                    );
                    last_error = e;
                }
            }
        }

        tracing::warn!(url = %url, error = %last_error, "all fetch attempts failed");
        FetchOutcome::Failure(last_error)
    }

    async fn run_attempt(&self, attempt: &AttemptDescriptor) -> FetchOutcome {
        let start = Instant::now();
        tracing::debug!(
            request_url = %attempt.url(),
            step = %attempt.step(),
            trust_override = attempt.trust_override(),
            "starting fetch attempt"
        );

        // The budget covers the request and the decode gate.
        let work = async {
            let bytes = self.transport.execute(attempt).await?;
            match tokio::task::spawn_blocking(move || decode_asset(bytes)).await {
                Ok(decoded) => decoded,
                Err(e) => Err(Error::DecodeFailed(format!("decode task failed: {e}"))),
            }
        };

        let decoded = match tokio::time::timeout(self.attempt_timeout, work).await {
            Ok(decoded) => decoded,
            Err(_) => Err(Error::FetchTimeout(format!("attempt exceeded {}ms", self.attempt_timeout.as_millis()))),
        };

        match decoded {
            Ok(asset) => {
                tracing::debug!(
                    request_url = %attempt.url(),
                    format = %asset.format,
                    width = asset.width,
                    height = asset.height,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "fetched asset"
                );
                FetchOutcome::Success(asset)
            }
            Err(e) => FetchOutcome::Failure(e),
        }
    }
}
