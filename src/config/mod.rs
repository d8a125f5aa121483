//! Configuration module
//!
//! Lookup order: explicit path (`--config` / `WIKIDOCS_CONFIG`), then
//! `.wikidocs/config.toml` walking up from the current directory, then
//! `~/.wikidocs/config.toml`, then built-in defaults. `WIKIDOCS_STORE_*`
//! environment variables override whatever the file says.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::keys::DEFAULT_BASE_PREFIX;
use crate::core::object_store::DEFAULT_PAGE_SIZE;

/// Directory name used for local and global configuration.
pub const CONFIG_DIR: &str = ".wikidocs";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Knowledge base used when none is given on the command line
    #[serde(default)]
    pub default_kb: Option<String>,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub knowledge_bases: Vec<KnowledgeBaseConfig>,
}

/// Which object store backs the documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Directory tree on the local filesystem
    #[default]
    Local,
    /// S3-compatible bucket over HTTP
    S3,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Local => write!(f, "local"),
            BackendKind::S3 => write!(f, "s3"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Root directory (local backend)
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Endpoint URL, e.g. "http://localhost:9000" (s3 backend)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub bucket: Option<String>,

    /// Bearer token sent with every request (s3 backend)
    #[serde(default)]
    pub token: Option<String>,

    /// Top-level key prefix
    #[serde(default = "default_base_prefix")]
    pub base_prefix: String,

    /// Keys per listing round-trip
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            root: None,
            endpoint: None,
            bucket: None,
            token: None,
            base_prefix: default_base_prefix(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_prefix() -> String {
    DEFAULT_BASE_PREFIX.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hits kept per document
    #[serde(default = "default_max_per_document")]
    pub max_per_document: usize,

    /// Hits kept per query
    #[serde(default = "default_max_total")]
    pub max_total: usize,

    /// Characters of context on each side of a match
    #[serde(default = "default_snippet_radius")]
    pub snippet_radius: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_per_document: default_max_per_document(),
            max_total: default_max_total(),
            snippet_radius: default_snippet_radius(),
        }
    }
}

fn default_max_per_document() -> usize {
    5
}

fn default_max_total() -> usize {
    60
}

fn default_snippet_radius() -> usize {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_entries: default_cache_max_entries(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_max_entries() -> usize {
    512
}

/// A named knowledge base, mostly for display and link rewriting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeBaseConfig {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Repository browse URL used for links that leave the wiki
    #[serde(default)]
    pub repo_url: Option<String>,
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        let mut config = match Self::locate() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from an explicit file, then apply environment overrides
    pub fn load_explicit(path: &Path) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load config from a specific file.
    ///
    /// A relative `store.root` is resolved against the directory holding
    /// the file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        config.store.root = config.store.root.take().map(|root| match path.parent() {
            Some(dir) if root.is_relative() => dir.join(root),
            _ => root,
        });
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// First config file that exists, in lookup order
    pub fn locate() -> Option<PathBuf> {
        if let Some(local) = Self::find_local_config() {
            return Some(local);
        }
        Self::global_config_path().filter(|p| p.exists())
    }

    /// Find local .wikidocs/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get global config path (~/.wikidocs/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.home_dir().join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Apply `WIKIDOCS_STORE_*` overrides from the given lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(root) = non_empty("WIKIDOCS_STORE_ROOT") {
            self.store.backend = BackendKind::Local;
            self.store.root = Some(PathBuf::from(root));
        }
        if let Some(endpoint) = non_empty("WIKIDOCS_STORE_ENDPOINT") {
            self.store.backend = BackendKind::S3;
            self.store.endpoint = Some(endpoint);
        }
        if let Some(bucket) = non_empty("WIKIDOCS_STORE_BUCKET") {
            self.store.bucket = Some(bucket);
        }
        if let Some(token) = non_empty("WIKIDOCS_STORE_TOKEN") {
            self.store.token = Some(token);
        }
    }

    /// Look up a configured knowledge base by id
    pub fn knowledge_base(&self, id: &str) -> Option<&KnowledgeBaseConfig> {
        self.knowledge_bases.iter().find(|kb| kb.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.backend, BackendKind::Local);
        assert_eq!(config.store.base_prefix, "base");
        assert_eq!(config.store.page_size, 1000);
        assert_eq!(config.search.max_per_document, 5);
        assert_eq!(config.search.max_total, 60);
        assert_eq!(config.search.snippet_radius, 60);
        assert!(config.cache.enabled);
        assert!(config.default_kb.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_kb = "kb1"

[store]
backend = "s3"
endpoint = "http://localhost:9000"
bucket = "docs"

[search]
max_total = 10

[[knowledge_bases]]
id = "kb1"
repo_url = "https://github.com/acme/widgets/blob/main"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_kb.as_deref(), Some("kb1"));
        assert_eq!(config.store.backend, BackendKind::S3);
        assert_eq!(config.store.bucket.as_deref(), Some("docs"));
        assert_eq!(config.store.timeout_secs, 30);
        assert_eq!(config.search.max_total, 10);
        assert_eq!(config.search.max_per_document, 5);
        assert_eq!(
            config.knowledge_base("kb1").unwrap().repo_url.as_deref(),
            Some("https://github.com/acme/widgets/blob/main")
        );
        assert!(config.knowledge_base("kb2").is_none());
    }

    #[test]
    fn test_relative_root_resolves_against_config_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[store]\nroot = \"store\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.store.root.unwrap(),
            dir.path().join(CONFIG_DIR).join("store")
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.default_kb = Some("docs".to_string());
        config.store.root = Some(dir.path().join("store"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_kb.as_deref(), Some("docs"));
        assert_eq!(loaded.store.root, Some(dir.path().join("store")));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("WIKIDOCS_STORE_ENDPOINT", "http://minio:9000"),
            ("WIKIDOCS_STORE_BUCKET", "wiki"),
            ("WIKIDOCS_STORE_TOKEN", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.store.token = Some("from-file".to_string());
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.store.backend, BackendKind::S3);
        assert_eq!(config.store.endpoint.as_deref(), Some("http://minio:9000"));
        assert_eq!(config.store.bucket.as_deref(), Some("wiki"));
        // Empty values do not clobber the file.
        assert_eq!(config.store.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store\nbackend = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
