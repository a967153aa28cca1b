//! Core types and shared functionality for assetfetch.
//!
//! This crate provides:
//! - Bounded in-memory asset cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Asset, AssetCache, CacheStats};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
