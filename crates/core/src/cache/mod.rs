//! Bounded in-memory cache for fetched assets.
//!
//! Entries are keyed by the source URL exactly as the caller passed it and
//! live until evicted or the process exits. Eviction is least-recently-used,
//! bounded both by entry count and by total payload bytes.

pub mod asset;
pub mod memory;

pub use asset::Asset;
pub use memory::{AssetCache, CacheStats};
