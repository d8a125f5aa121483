//! Wiki store facade
//!
//! One entry point over the resolvers: versions, ordered listings,
//! documents, search, links, titles and navigation trees.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────── WikiStore ───────────────────────────┐
//! │ versions   documents ◀── manifest + metadata   search   tree    │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ Arc<dyn ObjectStore>
//!                  ┌──────────────┴──────────────┐
//!                  │ CachedObjectStore (optional)│
//!                  └──────────────┬──────────────┘
//!                              Backend
//! ```
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo() -> wikidocs::error::StoreResult<()> {
//! use wikidocs::config::Config;
//! use wikidocs::core::wiki::WikiStore;
//!
//! let config = Config::load().map_err(|e| wikidocs::error::StoreError::Config(e.to_string()))?;
//! let wiki = WikiStore::from_config(&config)?;
//! if let Some(sha) = wiki.resolve_version("my-kb", None).await? {
//!     let listing = wiki.list_documents_ordered("my-kb", &sha).await?;
//!     println!("{} documents", listing.paths.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::debug;

use super::cache::CachedObjectStore;
use super::documents::{self, OrderedListing};
use super::keys::KeyLayout;
use super::link::{self, LinkDestination};
use super::manifest::{self, WikiManifest};
use super::metadata::{self, MetadataMap};
use super::object_store::{Backend, ObjectStore};
use super::search::{LinearScanner, SearchHit, SearchLimits, SearchScanner};
use super::title::first_heading;
use super::tree::{build_doc_trees, DocTrees};
use super::versions::{self, VersionInfo};
use crate::config::Config;
use crate::error::StoreResult;

/// Documents fetched at once when extracting titles.
pub const TITLE_CONCURRENCY: usize = 8;

/// Read-only view of every knowledge base in one object store
pub struct WikiStore {
    store: Arc<dyn ObjectStore>,
    layout: KeyLayout,
    scanner: Box<dyn SearchScanner>,
}

impl WikiStore {
    /// Store with the default linear scanner
    pub fn new(store: Arc<dyn ObjectStore>, layout: KeyLayout) -> Self {
        let scanner = LinearScanner::new(store.clone(), layout.clone(), SearchLimits::default());
        Self {
            store,
            layout,
            scanner: Box::new(scanner),
        }
    }

    /// Build backend, cache and scanner from configuration
    pub fn from_config(config: &Config) -> StoreResult<Self> {
        let backend = Backend::from_config(&config.store)?;
        let store: Arc<dyn ObjectStore> = if config.cache.enabled {
            Arc::new(CachedObjectStore::new(backend, config.cache.max_entries))
        } else {
            Arc::new(backend)
        };
        debug!(
            backend = %config.store.backend,
            cache = config.cache.enabled,
            "opened wiki store"
        );

        Ok(Self::new(store, KeyLayout::new(&config.store.base_prefix))
            .with_search_limits(SearchLimits::from(&config.search)))
    }

    /// Replace the linear scanner's limits
    pub fn with_search_limits(mut self, limits: SearchLimits) -> Self {
        self.scanner = Box::new(LinearScanner::new(
            self.store.clone(),
            self.layout.clone(),
            limits,
        ));
        self
    }

    /// Plug in a different search implementation
    pub fn with_scanner(mut self, scanner: Box<dyn SearchScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    // ============== Versions ==============

    pub async fn list_versions(&self, kb_id: &str) -> StoreResult<Vec<String>> {
        versions::list_versions(self.store(), &self.layout, kb_id).await
    }

    pub async fn list_version_details(&self, kb_id: &str) -> StoreResult<Vec<VersionInfo>> {
        versions::list_version_details(self.store(), &self.layout, kb_id).await
    }

    /// Latest snapshot, or the one `requested` names (short ids expand).
    pub async fn resolve_version(
        &self,
        kb_id: &str,
        requested: Option<&str>,
    ) -> StoreResult<Option<String>> {
        let versions = self.list_versions(kb_id).await?;
        Ok(versions::resolve_in(&versions, requested))
    }

    // ============== Documents ==============

    pub async fn list_documents(&self, kb_id: &str, sha: &str) -> StoreResult<Vec<String>> {
        documents::list_documents(self.store(), &self.layout, kb_id, sha).await
    }

    pub async fn list_documents_ordered(
        &self,
        kb_id: &str,
        sha: &str,
    ) -> StoreResult<OrderedListing> {
        documents::list_documents_ordered(self.store(), &self.layout, kb_id, sha).await
    }

    pub async fn get_document(&self, kb_id: &str, sha: &str, path: &str) -> Option<String> {
        documents::get_document(self.store(), &self.layout, kb_id, sha, path).await
    }

    pub async fn get_manifest(&self, kb_id: &str, sha: &str) -> Option<WikiManifest> {
        manifest::get_manifest(self.store(), &self.layout, kb_id, sha).await
    }

    pub async fn get_metadata(&self, kb_id: &str, sha: &str) -> MetadataMap {
        metadata::get_metadata(self.store(), &self.layout, kb_id, sha).await
    }

    // ============== Search & links ==============

    /// Substring search; an empty query finds nothing.
    pub async fn search(&self, kb_id: &str, sha: &str, query: &str) -> StoreResult<Vec<SearchHit>> {
        self.scanner.search(kb_id, sha, query).await
    }

    /// Classify a relative link found in `current_path`.
    pub fn resolve_link(
        &self,
        href: &str,
        current_path: &str,
        known_paths: &HashSet<String>,
        repo_url: Option<&str>,
        commit_sha: Option<&str>,
    ) -> LinkDestination {
        link::resolve_link_destination(href, current_path, known_paths, repo_url, commit_sha)
    }

    // ============== Navigation ==============

    /// First-heading titles of `paths`; documents without one are left out.
    pub async fn document_titles(
        &self,
        kb_id: &str,
        sha: &str,
        paths: &[String],
    ) -> HashMap<String, String> {
        stream::iter(paths)
            .map(|path| async move {
                let title = self
                    .get_document(kb_id, sha, path)
                    .await
                    .and_then(|content| first_heading(&content));
                (path, title)
            })
            .buffered(TITLE_CONCURRENCY)
            .filter_map(|(path, title)| async move { title.map(|t| (path.clone(), t)) })
            .collect()
            .await
    }

    /// Ordered listing plus its wiki and other trees.
    pub async fn build_trees(
        &self,
        kb_id: &str,
        sha: &str,
    ) -> StoreResult<(OrderedListing, DocTrees)> {
        let listing = self.list_documents_ordered(kb_id, sha).await?;
        let titles = self.document_titles(kb_id, sha, &listing.paths).await;
        let trees = build_doc_trees(
            &listing.paths,
            &titles,
            &listing.metadata,
            listing.manifest.as_ref(),
        );
        Ok((listing, trees))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::object_store::MemoryObjectStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    fn fixture() -> (Arc<MemoryObjectStore>, WikiStore) {
        let layout = KeyLayout::default();
        let at = |s| Some(Utc.timestamp_opt(s, 0).unwrap());
        let store = Arc::new(
            MemoryObjectStore::new()
                .with_object(layout.object_key("kb", "aaa111", "index.md"), "# Old", at(10))
                .with_object(layout.object_key("kb", "bbb222", "index.md"), "# Home\nWelcome", at(20))
                .with_object(
                    layout.object_key("kb", "bbb222", "guides/setup.md"),
                    "# Setup [![ci](b.svg)](ci)\nrun the installer",
                    at(20),
                )
                .with_object(layout.object_key("kb", "bbb222", "notes.md"), "no heading", at(20))
                .with_object(
                    layout.manifest_key("kb", "bbb222"),
                    r#"{"wiki":[{"path":"guides/setup"}]}"#,
                    at(20),
                ),
        );
        let wiki = WikiStore::new(store.clone(), layout);
        (store, wiki)
    }

    #[tokio::test]
    async fn test_resolve_version() {
        let (_, wiki) = fixture();
        assert_eq!(wiki.resolve_version("kb", None).await.unwrap().as_deref(), Some("bbb222"));
        assert_eq!(wiki.resolve_version("kb", Some("aaa")).await.unwrap().as_deref(), Some("aaa111"));
        assert_eq!(wiki.resolve_version("empty", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_titles_and_trees() {
        let (_, wiki) = fixture();
        let (listing, trees) = wiki.build_trees("kb", "bbb222").await.unwrap();

        assert_eq!(listing.paths, vec!["guides/setup.md", "index.md", "notes.md"]);
        assert_eq!(trees.wiki.children[0].files[0].title, "Setup");
        let other: Vec<_> = trees.other.files.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(other, vec!["Home", "notes.md"]);
    }

    #[tokio::test]
    async fn test_document_titles_skip_headingless() {
        let (_, wiki) = fixture();
        let paths = vec!["index.md".to_string(), "notes.md".to_string(), "gone.md".to_string()];
        let titles = wiki.document_titles("kb", "bbb222", &paths).await;
        assert_eq!(titles.len(), 1);
        assert_eq!(titles["index.md"], "Home");
    }

    #[tokio::test]
    async fn test_search_uses_configured_limits() {
        let (_, wiki) = fixture();
        let wiki = wiki.with_search_limits(SearchLimits {
            max_per_document: 1,
            max_total: 1,
            snippet_radius: 3,
        });
        let hits = wiki.search("kb", "bbb222", "e").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "guides/setup.md");
    }

    struct FixedScanner;

    #[async_trait]
    impl SearchScanner for FixedScanner {
        async fn search(&self, _kb: &str, _sha: &str, query: &str) -> StoreResult<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                path: "fixed.md".into(),
                snippet: query.into(),
                line: 1,
                occurrence: 0,
                offset: 0,
            }])
        }
    }

    #[tokio::test]
    async fn test_scanner_is_pluggable() {
        let (_, wiki) = fixture();
        let wiki = wiki.with_scanner(Box::new(FixedScanner));
        let hits = wiki.search("kb", "bbb222", "q").await.unwrap();
        assert_eq!(hits[0].path, "fixed.md");
    }

    #[tokio::test]
    async fn test_from_config_wraps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let key = KeyLayout::default().object_key("kb", "s1", "index.md");
        let path = dir.path().join(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "# Cached").unwrap();

        let mut config = Config::default();
        config.store.root = Some(dir.path().to_path_buf());
        let wiki = WikiStore::from_config(&config).unwrap();

        assert_eq!(wiki.get_document("kb", "s1", "index.md").await.as_deref(), Some("# Cached"));
        std::fs::remove_file(&path).unwrap();
        // served from cache after the file is gone
        assert_eq!(wiki.get_document("kb", "s1", "index.md").await.as_deref(), Some("# Cached"));
        assert_eq!(wiki.list_documents("kb", "s1").await.unwrap().len(), 0);
    }
}
