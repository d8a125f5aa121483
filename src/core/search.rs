//! Search - Full-text search over one snapshot
//!
//! Brute force: list the snapshot, fetch each document in turn and scan it
//! for the query, case-insensitively. Nothing is indexed or persisted.
//! [`SearchScanner`] is the seam for replacing the linear scan with a real
//! index.
//!
//! # Limits
//!
//! - at most `max_per_document` hits per document (default 5)
//! - at most `max_total` hits per query (default 60)
//! - snippets carry `snippet_radius` characters either side (default 60)

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use super::documents::{list_documents, strip_repo_docs_prefix};
use super::keys::KeyLayout;
use super::object_store::ObjectStore;
use crate::config::SearchConfig;
use crate::error::StoreResult;

/// One match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Display path of the document
    pub path: String,
    /// Context around the match, newlines flattened to spaces
    pub snippet: String,
    /// 1-based line of the match
    pub line: usize,
    /// 0-based index of the match within its document
    pub occurrence: usize,
    /// Byte offset of the match in the document
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_per_document: usize,
    pub max_total: usize,
    pub snippet_radius: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchLimits {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_per_document: config.max_per_document,
            max_total: config.max_total,
            snippet_radius: config.snippet_radius,
        }
    }
}

/// Query-time search over a snapshot
#[async_trait]
pub trait SearchScanner: Send + Sync {
    async fn search(&self, kb_id: &str, sha: &str, query: &str) -> StoreResult<Vec<SearchHit>>;
}

/// Sequential scan of every document, in listing order
pub struct LinearScanner {
    store: Arc<dyn ObjectStore>,
    layout: KeyLayout,
    limits: SearchLimits,
}

impl LinearScanner {
    pub fn new(store: Arc<dyn ObjectStore>, layout: KeyLayout, limits: SearchLimits) -> Self {
        Self {
            store,
            layout,
            limits,
        }
    }
}

#[async_trait]
impl SearchScanner for LinearScanner {
    async fn search(&self, kb_id: &str, sha: &str, query: &str) -> StoreResult<Vec<SearchHit>> {
        let mut hits = Vec::new();
        if query.is_empty() {
            return Ok(hits);
        }

        let paths = list_documents(self.store.as_ref(), &self.layout, kb_id, sha).await?;
        let mut scanned = 0usize;

        for path in &paths {
            let remaining = self.limits.max_total.saturating_sub(hits.len());
            if remaining == 0 {
                break;
            }

            let key = self.layout.object_key(kb_id, sha, path);
            let content = match self.store.get(&key).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) if e.is_not_found() => {
                    debug!(%key, "listed document vanished");
                    continue;
                }
                Err(e) => {
                    warn!(%key, error = %e, "search aborted");
                    return Err(e);
                }
            };
            scanned += 1;

            hits.extend(scan_document(
                strip_repo_docs_prefix(path),
                &content,
                query,
                remaining.min(self.limits.max_per_document),
                self.limits.snippet_radius,
            ));
        }

        debug!(
            kb = kb_id,
            sha,
            query,
            scanned,
            hits = hits.len(),
            "search complete"
        );
        Ok(hits)
    }
}

/// Byte range of the first case-insensitive match at or after `from`.
fn find_ignore_case(text: &str, query: &str, from: usize) -> Option<(usize, usize)> {
    let tail = text.get(from..)?;
    for (start, _) in tail.char_indices() {
        let mut haystack = tail[start..].char_indices();
        let mut matched_to = Some(start);
        for q in query.chars() {
            match haystack.next() {
                Some((i, c)) if c == q || c.to_lowercase().eq(q.to_lowercase()) => {
                    matched_to = Some(start + i + c.len_utf8());
                }
                _ => {
                    matched_to = None;
                    break;
                }
            }
        }
        if let Some(end) = matched_to {
            return Some((from + start, from + end));
        }
    }
    None
}

/// `radius` characters either side of `start..end`, newlines flattened.
fn snippet(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].replace('\n', " ")
}

/// Scan one document, returning at most `limit` hits.
pub fn scan_document(
    path: &str,
    content: &str,
    query: &str,
    limit: usize,
    radius: usize,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    if query.is_empty() {
        return hits;
    }

    let mut cursor = 0;
    while hits.len() < limit {
        let Some((start, end)) = find_ignore_case(content, query, cursor) else {
            break;
        };
        hits.push(SearchHit {
            path: path.to_string(),
            snippet: snippet(content, start, end, radius),
            line: content[..start].matches('\n').count() + 1,
            occurrence: hits.len(),
            offset: start,
        });
        cursor = end;
    }
    hits
}
