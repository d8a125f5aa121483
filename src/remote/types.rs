//! S3 API types
//!
//! Subset of the ListObjectsV2 XML response that the document store reads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

// ============== Listing Types ==============

/// `<ListBucketResult>` root element
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ListBucketResult {
    #[serde(default)]
    pub contents: Vec<S3Object>,
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub next_continuation_token: Option<String>,
    #[serde(default)]
    pub key_count: Option<u64>,
}

/// One `<Contents>` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub size: u64,
}

impl S3Object {
    /// Parsed `LastModified`; unparsable timestamps count as unknown.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ============== Error Types ==============

/// `<Error>` body returned alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3ErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
