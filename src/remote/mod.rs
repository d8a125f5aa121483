//! Remote object storage module
//!
//! Provides the HTTP client for S3-compatible buckets.

mod client;
mod types;

pub use client::S3Client;
pub use types::*;
