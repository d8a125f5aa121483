//! Manifest resolver
//!
//! The generator writes `.umans/docs.json` next to the documents of a
//! snapshot. It names the curated wiki pages in display order:
//!
//! ```json
//! { "wiki": [ { "path": "overview", "purpose": "..." } ],
//!   "repo-docs": { "include": ["docs/**"] } }
//! ```
//!
//! Older generators wrote `pages` instead of `wiki`. `repo-docs` is
//! generator configuration and never contributes pages. The manifest only
//! orders and classifies documents; it never adds any.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::keys::KeyLayout;
use super::object_store::ObjectStore;

/// One page descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPageEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// `repo-docs` section: which repository docs the generator copied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDocsConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Parsed manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WikiManifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki: Option<Vec<WikiPageEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<WikiPageEntry>>,
    #[serde(rename = "repo-docs", skip_serializing_if = "Option::is_none")]
    pub repo_docs: Option<RepoDocsConfig>,
}

impl WikiManifest {
    /// Build from arbitrary JSON. Anything that is not an object is an
    /// empty manifest; page lists that are not arrays are absent; entries
    /// without a string `path` are dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let pages_at = |key: &str| -> Option<Vec<WikiPageEntry>> {
            object.get(key)?.as_array().map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let path = entry.get("path")?.as_str()?;
                        Some(WikiPageEntry {
                            path: path.to_string(),
                            purpose: entry
                                .get("purpose")
                                .and_then(Value::as_str)
                                .map(str::to_string),
                        })
                    })
                    .collect()
            })
        };

        Self {
            wiki: pages_at("wiki"),
            pages: pages_at("pages"),
            repo_docs: object
                .get("repo-docs")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        }
    }

    /// Parse raw manifest bytes; `None` when they are not JSON.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Value>(bytes)
            .ok()
            .map(|value| Self::from_value(&value))
    }

    /// Wiki pages in display order: `wiki` when present, else `pages`.
    pub fn wiki_pages(&self) -> &[WikiPageEntry] {
        self.wiki
            .as_deref()
            .or(self.pages.as_deref())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.wiki_pages().is_empty()
    }

    /// Normalized page paths in manifest order, first occurrence kept.
    pub fn ordered_paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.wiki_pages()
            .iter()
            .map(|page| normalize_md_path(&page.path))
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    /// Whether `path` (already `.md`-suffixed) is a listed wiki page.
    pub fn lists(&self, path: &str) -> bool {
        self.wiki_pages()
            .iter()
            .any(|page| normalize_md_path(&page.path) == path)
    }
}

/// Append `.md` unless the path already ends with it (any case).
pub fn normalize_md_path(path: &str) -> String {
    if path.to_ascii_lowercase().ends_with(".md") {
        path.to_string()
    } else {
        format!("{path}.md")
    }
}

/// Fetch and parse the manifest of a snapshot. Every failure is `None`.
pub async fn get_manifest(
    store: &dyn ObjectStore,
    layout: &KeyLayout,
    kb_id: &str,
    sha: &str,
) -> Option<WikiManifest> {
    let key = layout.manifest_key(kb_id, sha);
    let bytes = match store.get(&key).await {
        Ok(bytes) => bytes,
        Err(e) if e.is_not_found() => {
            debug!(%key, "no manifest");
            return None;
        }
        Err(e) => {
            warn!(%key, error = %e, "manifest unavailable");
            return None;
        }
    };

    let manifest = WikiManifest::parse(&bytes);
    if manifest.is_none() {
        warn!(%key, "manifest is not valid JSON");
    }
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object_store::MemoryObjectStore;
    use serde_json::json;

    #[test]
    fn test_normalize_md_path() {
        assert_eq!(normalize_md_path("guide"), "guide.md");
        assert_eq!(normalize_md_path("guide.md"), "guide.md");
        assert_eq!(normalize_md_path("README.MD"), "README.MD");
        assert_eq!(normalize_md_path("notes.mdx"), "notes.mdx.md");
    }

    #[test]
    fn test_wiki_key_preferred_over_pages() {
        let manifest = WikiManifest::from_value(&json!({
            "pages": [{ "path": "legacy" }],
            "wiki": [{ "path": "overview", "purpose": "intro" }, { "path": "api" }],
            "repo-docs": { "include": ["docs/**"] }
        }));
        let paths: Vec<_> = manifest.wiki_pages().iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["overview", "api"]);
        assert_eq!(manifest.wiki_pages()[0].purpose.as_deref(), Some("intro"));
        assert_eq!(
            manifest.repo_docs.as_ref().unwrap().include,
            vec!["docs/**".to_string()]
        );
    }

    #[test]
    fn test_pages_fallback_and_repo_docs_ignored() {
        let manifest = WikiManifest::from_value(&json!({
            "pages": [{ "path": "a" }],
            "repo-docs": [{ "path": "README" }]
        }));
        assert_eq!(manifest.ordered_paths(), vec!["a.md"]);
        assert!(manifest.repo_docs.is_none());
        assert!(!manifest.lists("README.md"));
    }

    #[test]
    fn test_malformed_shapes_degrade_to_empty() {
        assert!(WikiManifest::from_value(&json!([1, 2])).is_empty());
        assert!(WikiManifest::from_value(&json!({ "pages": "nope" })).is_empty());

        let manifest = WikiManifest::from_value(&json!({
            "wiki": [{ "path": 3 }, { "purpose": "x" }, "str", { "path": "ok" }]
        }));
        assert_eq!(manifest.ordered_paths(), vec!["ok.md"]);
        assert!(WikiManifest::parse(b"{not json").is_none());
    }

    #[test]
    fn test_ordered_paths_dedupes_after_normalization() {
        let manifest = WikiManifest::from_value(&json!({
            "wiki": [{ "path": "b" }, { "path": "a.md" }, { "path": "b.md" }]
        }));
        assert_eq!(manifest.ordered_paths(), vec!["b.md", "a.md"]);
        assert!(manifest.lists("b.md"));
    }

    #[tokio::test]
    async fn test_get_manifest_soft_failures() {
        let layout = KeyLayout::default();
        let store = MemoryObjectStore::new()
            .with_object(layout.manifest_key("kb", "good"), r#"{"wiki":[{"path":"x"}]}"#, None)
            .with_object(layout.manifest_key("kb", "bad"), "<<<", None);

        let good = get_manifest(&store, &layout, "kb", "good").await.unwrap();
        assert_eq!(good.ordered_paths(), vec!["x.md"]);
        assert!(get_manifest(&store, &layout, "kb", "bad").await.is_none());
        assert!(get_manifest(&store, &layout, "kb", "missing").await.is_none());
    }
}
