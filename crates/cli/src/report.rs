//! JSON line output for fetch results.

use std::time::Duration;

use assetfetch_client::FetchOutcome;
use assetfetch_core::CacheStats;
use serde::Serialize;

/// One fetched URL.
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub round: usize,
    pub url: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl FetchReport {
    pub fn new(round: usize, url: String, outcome: &FetchOutcome, elapsed: Duration) -> Self {
        let mut report = Self {
            round,
            url,
            ok: outcome.is_success(),
            format: None,
            width: None,
            height: None,
            bytes: None,
            error_code: None,
            error: None,
            elapsed_ms: elapsed.as_millis() as u64,
        };

        match outcome {
            FetchOutcome::Success(asset) => {
                report.format = Some(asset.format.clone());
                report.width = Some(asset.width);
                report.height = Some(asset.height);
                report.bytes = Some(asset.len());
            }
            FetchOutcome::Failure(e) => {
                report.error_code = Some(e.code());
                report.error = Some(e.to_string());
            }
        }

        report
    }
}

/// Final cache summary line.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub cache: CacheStats,
}
