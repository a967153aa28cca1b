//! The cached asset value.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// A fetched image that passed the decode gate.
///
/// `bytes` is the payload exactly as received; the remaining fields are
/// filled in from the decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Bytes,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub fetched_at: DateTime<Utc>,
}

impl Asset {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
