//! S3-compatible HTTP client
//!
//! Speaks the two calls the store needs: ListObjectsV2 and GetObject, with
//! path-style addressing (`{endpoint}/{bucket}/{key}`). Requests carry an
//! optional bearer token for gateways that front a private bucket.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use super::types::*;
use crate::error::{StoreError, StoreResult};
use crate::core::object_store::DEFAULT_PAGE_SIZE;

/// HTTP client for an S3-compatible bucket
#[derive(Debug, Clone)]
pub struct S3Client {
    client: Client,
    endpoint: Url,
    bucket: String,
    token: Option<String>,
    page_size: usize,
}

impl S3Client {
    /// Create new client with explicit parameters
    pub fn new(
        endpoint: &str,
        bucket: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> StoreResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StoreError::Config(format!("invalid endpoint URL {endpoint}: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "endpoint URL {endpoint} cannot carry a bucket path"
            )));
        }
        if bucket.is_empty() {
            return Err(StoreError::Config("bucket name is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            bucket: bucket.to_string(),
            token,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `{endpoint}/{bucket}` followed by the given key segments, each
    /// percent-encoded.
    fn url<'a>(&self, key_segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.bucket);
            segments.extend(key_segments);
        }
        url
    }

    /// Add auth header if token is set
    fn auth_header(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref token) = self.token {
            builder.bearer_auth(token)
        } else {
            builder
        }
    }

    // ============== Listing ==============

    /// One ListObjectsV2 round-trip
    pub async fn list_objects_v2(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> StoreResult<ListBucketResult> {
        let mut url = self.url(std::iter::empty());
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("list-type", "2")
                .append_pair("prefix", prefix)
                .append_pair("max-keys", &self.page_size.to_string());
            if let Some(token) = continuation {
                query.append_pair("continuation-token", token);
            }
        }

        debug!(bucket = %self.bucket, prefix, continuation, "ListObjectsV2");
        let resp = self.auth_header(self.client.get(url)).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let err = self.extract_error(resp).await;
            debug!(status = status.as_u16(), error = %err, "listing rejected");
            return Err(StoreError::Http {
                status: status.as_u16(),
                key: prefix.to_string(),
            });
        }

        let body = resp.text().await?;
        quick_xml::de::from_str(&body).map_err(|e| StoreError::InvalidListing(e.to_string()))
    }

    // ============== Objects ==============

    /// Read a whole object
    pub async fn get_object(&self, key: &str) -> StoreResult<Vec<u8>> {
        let url = self.url(key.split('/'));
        let resp = self.auth_header(self.client.get(url)).send().await?;

        match resp.status() {
            status if status.is_success() => Ok(resp.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StoreError::not_found(key)),
            status => {
                let err = self.extract_error(resp).await;
                // Buckets without list permission answer 403 for missing keys.
                if status == StatusCode::FORBIDDEN && err == "NoSuchKey" {
                    return Err(StoreError::not_found(key));
                }
                Err(StoreError::Http {
                    status: status.as_u16(),
                    key: key.to_string(),
                })
            }
        }
    }

    // ============== Helpers ==============

    /// Extract the S3 error code from a response body
    async fn extract_error(&self, resp: reqwest::Response) -> String {
        let body = resp.text().await.unwrap_or_default();
        quick_xml::de::from_str::<S3ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.code.or(e.message))
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}
