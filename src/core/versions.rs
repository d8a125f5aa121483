//! Version index
//!
//! Snapshots are discovered purely from the object listing: every key under
//! `{base}/{kb}/docs/` belongs to the snapshot named by the next path
//! segment. A snapshot's timestamp is the newest `last_modified` of any of
//! its objects, and the index is ordered oldest first.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::keys::KeyLayout;
use super::object_store::ObjectStore;
use crate::error::StoreResult;

/// One snapshot and the newest write observed under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub id: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Snapshots of a knowledge base, oldest first, with their timestamps.
///
/// An unknown knowledge base yields an empty list. Objects with no
/// timestamp count as older than any dated object.
pub async fn list_version_details(
    store: &dyn ObjectStore,
    layout: &KeyLayout,
    kb_id: &str,
) -> StoreResult<Vec<VersionInfo>> {
    let prefix = layout.versions_prefix(kb_id);
    let objects = store.list_all(&prefix).await?;

    let mut newest: IndexMap<String, Option<DateTime<Utc>>> = IndexMap::new();
    for object in &objects {
        let Some(rest) = object.key.strip_prefix(&prefix) else {
            continue;
        };
        // Keys directly under docs/ are not part of any snapshot.
        let Some((sha, _)) = rest.split_once('/') else {
            continue;
        };
        if sha.is_empty() {
            continue;
        }
        let entry = newest.entry(sha.to_string()).or_insert(None);
        if object.last_modified > *entry {
            *entry = object.last_modified;
        }
    }

    let mut versions: Vec<VersionInfo> = newest
        .into_iter()
        .map(|(id, last_modified)| VersionInfo { id, last_modified })
        .collect();
    // Stable: equal timestamps keep first-seen order.
    versions.sort_by_key(|v| v.last_modified);

    debug!(kb = kb_id, count = versions.len(), "indexed versions");
    Ok(versions)
}

/// Snapshot ids of a knowledge base, oldest first.
pub async fn list_versions(
    store: &dyn ObjectStore,
    layout: &KeyLayout,
    kb_id: &str,
) -> StoreResult<Vec<String>> {
    Ok(list_version_details(store, layout, kb_id)
        .await?
        .into_iter()
        .map(|v| v.id)
        .collect())
}

/// Pick a snapshot id from an ordered version list.
///
/// - nothing requested: the latest version (`None` if there are none)
/// - an exact id: that id
/// - a prefix of known ids: the latest of them (short SHAs expand)
/// - anything else: the request verbatim
pub fn resolve_in(versions: &[String], requested: Option<&str>) -> Option<String> {
    let requested = requested.map(str::trim).filter(|r| !r.is_empty());
    let Some(requested) = requested else {
        return versions.last().cloned();
    };

    if versions.iter().any(|v| v == requested) {
        return Some(requested.to_string());
    }
    versions
        .iter()
        .rev()
        .find(|v| v.starts_with(requested))
        .cloned()
        .or_else(|| Some(requested.to_string()))
}
