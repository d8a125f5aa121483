//! Document store
//!
//! A snapshot's documents are exactly the `.md` keys under its prefix.
//! Repository docs copied verbatim by the generator live under
//! `repo-docs/` and are shown without that prefix.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::keys::KeyLayout;
use super::manifest::{get_manifest, WikiManifest};
use super::metadata::{get_metadata, MetadataMap};
use super::object_store::ObjectStore;
use crate::error::StoreResult;

/// Directory holding repository docs copied into a snapshot.
pub const REPO_DOCS_PREFIX: &str = "repo-docs/";

/// Name of the landing page of a folder.
pub const INDEX_FILE: &str = "index.md";

/// Ordered documents of a snapshot with their sidecars
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderedListing {
    pub paths: Vec<String>,
    pub metadata: MetadataMap,
    pub manifest: Option<WikiManifest>,
}

/// Display path of a stored document.
pub fn strip_repo_docs_prefix(path: &str) -> &str {
    path.strip_prefix(REPO_DOCS_PREFIX).unwrap_or(path)
}

/// Relative paths of every `.md` object in a snapshot, in key order.
pub async fn list_documents(
    store: &dyn ObjectStore,
    layout: &KeyLayout,
    kb_id: &str,
    sha: &str,
) -> StoreResult<Vec<String>> {
    let prefix = layout.snapshot_prefix(kb_id, sha);
    let objects = store.list_all(&prefix).await?;

    Ok(objects
        .into_iter()
        .filter(|o| o.key.ends_with(".md"))
        .filter_map(|o| o.key.strip_prefix(&prefix).map(str::to_string))
        .filter(|path| !path.is_empty())
        .collect())
}

async fn read_text(store: &dyn ObjectStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(bytes) => Some(
            String::from_utf8(bytes)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        ),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            warn!(%key, error = %e, "document fetch failed");
            None
        }
    }
}

/// Content of one document, or `None` when it cannot be read.
///
/// Display paths of copied repository docs are retried under
/// `repo-docs/`.
pub async fn get_document(
    store: &dyn ObjectStore,
    layout: &KeyLayout,
    kb_id: &str,
    sha: &str,
    path: &str,
) -> Option<String> {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return None;
    }

    if let Some(content) = read_text(store, &layout.object_key(kb_id, sha, path)).await {
        return Some(content);
    }
    if path.starts_with(REPO_DOCS_PREFIX) {
        return None;
    }

    let fallback = format!("{REPO_DOCS_PREFIX}{path}");
    debug!(path, "retrying under {REPO_DOCS_PREFIX}");
    read_text(store, &layout.object_key(kb_id, sha, &fallback)).await
}

/// Display order of listed paths.
///
/// Paths are sorted, `index.md` is moved first, then manifest pages that
/// exist are placed ahead of everything else in manifest order. Paths are
/// returned with `repo-docs/` stripped; on a clash the earlier one wins.
pub fn order_paths(mut listed: Vec<String>, manifest: Option<&WikiManifest>) -> Vec<String> {
    listed.sort();
    if let Some(pos) = listed.iter().position(|p| p == INDEX_FILE) {
        let index = listed.remove(pos);
        listed.insert(0, index);
    }

    let ordered = match manifest {
        Some(manifest) => {
            let available: HashSet<&str> = listed.iter().map(String::as_str).collect();
            manifest
                .ordered_paths()
                .into_iter()
                .filter(|p| available.contains(p.as_str()))
                .collect()
        }
        None => Vec::new(),
    };

    let placed: HashSet<&str> = ordered.iter().map(String::as_str).collect();
    let rest = listed.iter().filter(|p| !placed.contains(p.as_str()));

    let mut seen = HashSet::new();
    ordered
        .iter()
        .chain(rest)
        .map(|p| strip_repo_docs_prefix(p).to_string())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Metadata keyed by display path. Direct keys beat stripped ones.
fn display_metadata(raw: MetadataMap) -> MetadataMap {
    let mut metadata = MetadataMap::new();
    let (copied, direct): (Vec<_>, Vec<_>) = raw
        .into_iter()
        .partition(|(path, _)| path.starts_with(REPO_DOCS_PREFIX));

    for (path, entry) in direct {
        metadata.insert(path, entry);
    }
    for (path, entry) in copied {
        metadata
            .entry(strip_repo_docs_prefix(&path).to_string())
            .or_insert(entry);
    }
    metadata
}

/// Ordered listing of a snapshot plus metadata and manifest.
///
/// Only the listing itself can fail; a missing or broken manifest or
/// metadata sidecar falls back to plain order and empty metadata.
pub async fn list_documents_ordered(
    store: &dyn ObjectStore,
    layout: &KeyLayout,
    kb_id: &str,
    sha: &str,
) -> StoreResult<OrderedListing> {
    let listed = list_documents(store, layout, kb_id, sha).await?;
    let manifest = get_manifest(store, layout, kb_id, sha).await;
    let paths = order_paths(listed, manifest.as_ref());
    let metadata = display_metadata(get_metadata(store, layout, kb_id, sha).await);

    debug!(kb = kb_id, sha, documents = paths.len(), "ordered listing");
    Ok(OrderedListing {
        paths,
        metadata,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::MetadataEntry;
    use crate::core::object_store::MemoryObjectStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn owned(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    fn snapshot(files: &[&str]) -> MemoryObjectStore {
        let layout = KeyLayout::default();
        let store = MemoryObjectStore::new().with_page_size(2);
        for file in files {
            store.insert(layout.object_key("kb", "s", file), format!("# {file}"), None);
        }
        store
    }

    #[test]
    fn test_index_first_without_manifest() {
        let ordered = order_paths(owned(&["a.md", "index.md", "b.md"]), None);
        assert_eq!(ordered, owned(&["index.md", "a.md", "b.md"]));
    }

    #[test]
    fn test_manifest_order_drops_missing_entries() {
        let manifest = WikiManifest::from_value(&json!({
            "pages": [{ "path": "b" }, { "path": "missing" }]
        }));
        let ordered = order_paths(owned(&["a.md", "b.md"]), Some(&manifest));
        assert_eq!(ordered, owned(&["b.md", "a.md"]));
    }

    #[test]
    fn test_index_stays_first_among_unordered() {
        let manifest = WikiManifest::from_value(&json!({ "wiki": [{ "path": "z" }] }));
        let ordered = order_paths(owned(&["b.md", "z.md", "index.md", "a.md"]), Some(&manifest));
        assert_eq!(ordered, owned(&["z.md", "index.md", "a.md", "b.md"]));
    }

    #[test]
    fn test_repo_docs_prefix_stripped() {
        let ordered = order_paths(
            owned(&["repo-docs/README.md", "repo-docs-old/x.md", "guide.md", "README.md"]),
            None,
        );
        assert_eq!(
            ordered,
            owned(&["README.md", "guide.md", "repo-docs-old/x.md"])
        );
    }

    #[test]
    fn test_display_metadata_prefers_direct_keys() {
        let mut raw = MetadataMap::new();
        let entry = |origin: &str| MetadataEntry {
            origin: Some(origin.to_string()),
            process_id: None,
        };
        raw.insert("repo-docs/a.md".to_string(), entry("copied"));
        raw.insert("a.md".to_string(), entry("generated"));
        raw.insert("repo-docs/b.md".to_string(), entry("copied"));

        let metadata = display_metadata(raw);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["a.md"].origin.as_deref(), Some("generated"));
        assert_eq!(metadata["b.md"].origin.as_deref(), Some("copied"));
    }

    #[tokio::test]
    async fn test_list_documents_filters_markdown() {
        let layout = KeyLayout::default();
        let store = snapshot(&["a.md", "img/logo.png", "deep/x/y.md"]);
        store.insert(layout.metadata_key("kb", "s"), "{}", None);
        store.insert(layout.manifest_key("kb", "s"), "{}", None);

        let docs = list_documents(&store, &layout, "kb", "s").await.unwrap();
        assert_eq!(docs, owned(&["a.md", "deep/x/y.md"]));
    }

    #[tokio::test]
    async fn test_list_documents_ordered_end_to_end() {
        let layout = KeyLayout::default();
        let store = snapshot(&["a.md", "b.md", "index.md", "repo-docs/CONTRIBUTING.md"]);
        store.insert(
            layout.manifest_key("kb", "s"),
            r#"{"wiki":[{"path":"b"}],"repo-docs":{"include":["CONTRIBUTING.md"]}}"#,
            None,
        );
        store.insert(
            layout.legacy_origins_key("kb", "s"),
            r#"{"b.md":"generated","repo-docs/CONTRIBUTING.md":"repo"}"#,
            None,
        );

        let listing = list_documents_ordered(&store, &layout, "kb", "s").await.unwrap();
        assert_eq!(
            listing.paths,
            owned(&["b.md", "index.md", "a.md", "CONTRIBUTING.md"])
        );
        assert_eq!(
            listing.metadata["CONTRIBUTING.md"].origin.as_deref(),
            Some("repo")
        );
        assert!(listing.manifest.is_some());
    }

    #[tokio::test]
    async fn test_get_document_with_repo_docs_fallback() {
        let layout = KeyLayout::default();
        let store = snapshot(&["a.md", "repo-docs/README.md"]);

        assert_eq!(
            get_document(&store, &layout, "kb", "s", "a.md").await.as_deref(),
            Some("# a.md")
        );
        assert_eq!(
            get_document(&store, &layout, "kb", "s", "README.md").await.as_deref(),
            Some("# repo-docs/README.md")
        );
        assert!(get_document(&store, &layout, "kb", "s", "nope.md").await.is_none());
        assert!(get_document(&store, &layout, "kb", "s", "").await.is_none());
    }
}
