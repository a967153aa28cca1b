//! LRU asset cache shared between concurrent fetches.
//!
//! Recency and the entry bound come from [`lru::LruCache`]. The byte budget is
//! enforced on top by popping least recently used entries until the payload
//! total fits.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

use super::Asset;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub entries: usize,
    pub bytes: usize,
}

struct LruState {
    entries: LruCache<String, Asset>,
    bytes: usize,
    hits: u64,
    misses: u64,
    insertions: u64,
    evictions: u64,
}

impl LruState {
    fn evicted(&mut self, key: &str, asset: &Asset) {
        self.bytes -= asset.len();
        self.evictions += 1;
        tracing::debug!(key = %key, bytes = asset.len(), "evicted cached asset");
    }
}

/// In-memory asset cache with LRU eviction.
///
/// Uses a tokio Mutex so lookups and inserts from concurrent fetch tasks
/// never observe a half-updated byte count.
pub struct AssetCache {
    state: Mutex<LruState>,
    capacity: usize,
    max_bytes: usize,
}

impl AssetCache {
    /// Create a cache holding at most `capacity` entries and `max_bytes` payload bytes.
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let state = LruState {
            entries: LruCache::new(capacity),
            bytes: 0,
            hits: 0,
            misses: 0,
            insertions: 0,
            evictions: 0,
        };
        Self { state: Mutex::new(state), capacity: capacity.get(), max_bytes: max_bytes.max(1) }
    }

    /// Look up an asset by its verbatim source URL, marking it most recently used.
    pub async fn get(&self, key: &str) -> Option<Asset> {
        let mut state = self.state.lock().await;
        let found = state.entries.get(key).cloned();
        match found {
            Some(asset) => {
                state.hits += 1;
                Some(asset)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Insert or replace an asset, evicting least recently used entries as needed.
    ///
    /// Assets larger than the byte budget are not stored.
    pub async fn put(&self, key: &str, asset: Asset) {
        if asset.len() > self.max_bytes {
            tracing::debug!(key = %key, bytes = asset.len(), max_bytes = self.max_bytes, "asset exceeds cache budget");
            return;
        }

        let mut state = self.state.lock().await;
        if let Some(previous) = state.entries.pop(key) {
            state.bytes -= previous.len();
        }

        state.bytes += asset.len();
        state.insertions += 1;
        if let Some((evicted_key, evicted)) = state.entries.push(key.to_string(), asset) {
            state.evicted(&evicted_key, &evicted);
        }

        while state.bytes > self.max_bytes {
            let Some((evicted_key, evicted)) = state.entries.pop_lru() else {
                break;
            };
            state.evicted(&evicted_key, &evicted);
        }
    }

    /// Remove an entry, returning it if present.
    pub async fn remove(&self, key: &str) -> Option<Asset> {
        let mut state = self.state.lock().await;
        let asset = state.entries.pop(key)?;
        state.bytes -= asset.len();
        Some(asset)
    }

    /// Whether an entry exists, without touching recency or counters.
    pub async fn contains(&self, key: &str) -> bool {
        self.state.lock().await.entries.contains(key)
    }

    /// Drop every entry. Counters are kept.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.bytes = 0;
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            insertions: state.insertions,
            evictions: state.evictions,
            entries: state.entries.len(),
            bytes: state.bytes,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}
