//! Object storage abstraction
//!
//! Everything the document store knows comes from two primitives: a
//! paginated prefix listing and a whole-object read. Backends implement
//! [`ObjectStore`]; callers never see which one they talk to.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                   Backend                     │
//! │  ┌────────────┬───────────────┬────────────┐  │
//! │  │   Local    │    Remote     │   Memory   │  │
//! │  │ (fs tree)  │ (S3 via HTTP) │ (in-proc)  │  │
//! │  └────────────┴───────────────┴────────────┘  │
//! └───────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{BackendKind, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::remote::S3Client;

/// Default number of keys returned per listing round-trip.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// One entry of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: u64,
}

/// One page of a listing plus the token for the next page, if any
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectMeta>,
    pub next_token: Option<String>,
}

/// Flat key/value blob store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of keys starting with `prefix`, in key order.
    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> StoreResult<ListPage>;

    /// Read a whole object.
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Human-readable name
    fn name(&self) -> &str;

    /// List every key under `prefix`, following continuation tokens until
    /// the backend reports none.
    async fn list_all(&self, prefix: &str) -> StoreResult<Vec<ObjectMeta>> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;
        let mut rounds = 0usize;

        loop {
            let page = self.list_page(prefix, token.as_deref()).await?;
            rounds += 1;
            objects.extend(page.objects);

            match page.next_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(StoreError::InvalidListing(format!(
                        "continuation token {next:?} repeated while listing {prefix}"
                    )));
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!(
            backend = self.name(),
            prefix,
            rounds,
            objects = objects.len(),
            "listing complete"
        );
        Ok(objects)
    }
}

/// Reject keys that would escape a filesystem root.
fn validate_key(key: &str) -> StoreResult<()> {
    if key.starts_with('/') || key.contains('\\') || key.split('/').any(|s| s == "..") {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Objects stored as files under a root directory; keys are `/`-joined
/// relative paths.
pub struct LocalObjectStore {
    root: PathBuf,
    page_size: usize,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// `/`-joined key of a path under `root`.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// Sort name of a walk entry; directories compare as `name/` so a depth-first
/// walk yields keys in byte order.
fn walk_order_name(entry: &walkdir::DirEntry) -> String {
    let mut name = entry.file_name().to_string_lossy().into_owned();
    if entry.file_type().is_dir() {
        name.push('/');
    }
    name
}

/// One page of keys, read with a single ordered walk that stops after the
/// page is full. Directories entirely before the cursor or outside the
/// prefix are not descended into.
fn scan_local(
    root: &Path,
    prefix: &str,
    start_after: Option<&str>,
    page_size: usize,
) -> StoreResult<ListPage> {
    validate_key(prefix)?;

    // Only the directory part of the prefix narrows the walk; the rest is a
    // plain string filter, as with S3.
    let dir_part = prefix.rfind('/').map_or("", |i| &prefix[..i]);
    let walk_root = root.join(dir_part);
    if !walk_root.is_dir() {
        return Ok(ListPage::default());
    }

    let walk = WalkDir::new(&walk_root)
        .sort_by(|a, b| walk_order_name(a).cmp(&walk_order_name(b)))
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let Some(mut dir) = relative_key(root, entry.path()) else {
                return false;
            };
            dir.push('/');
            let overlaps_prefix = dir.starts_with(prefix) || prefix.starts_with(dir.as_str());
            let before_cursor =
                start_after.is_some_and(|after| after > dir.as_str() && !after.starts_with(dir.as_str()));
            overlaps_prefix && !before_cursor
        });

    let mut objects = Vec::new();
    for entry in walk {
        let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = relative_key(root, entry.path()) else {
            continue;
        };
        if !key.starts_with(prefix) {
            continue;
        }
        if start_after.is_some_and(|after| key.as_str() <= after) {
            continue;
        }
        let meta = entry.metadata().map_err(|e| StoreError::Io(e.into()))?;
        objects.push(ObjectMeta {
            key,
            last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
            size: meta.len(),
        });
        if objects.len() > page_size {
            break;
        }
    }

    let next_token = if objects.len() > page_size {
        objects.truncate(page_size);
        objects.last().map(|o| o.key.clone())
    } else {
        None
    };

    Ok(ListPage {
        objects,
        next_token,
    })
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> StoreResult<ListPage> {
        let root = self.root.clone();
        let prefix = prefix.to_string();
        let start_after = continuation.map(str::to_string);
        let page_size = self.page_size;

        tokio::task::spawn_blocking(move || {
            scan_local(&root, &prefix, start_after.as_deref(), page_size)
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        validate_key(key)?;
        match tokio::fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::not_found(key)),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// S3-compatible bucket reached over HTTP
pub struct RemoteObjectStore {
    client: S3Client,
}

impl RemoteObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for RemoteObjectStore {
    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> StoreResult<ListPage> {
        let result = self.client.list_objects_v2(prefix, continuation).await?;

        let next_token = match (result.is_truncated, result.next_continuation_token) {
            (false, _) => None,
            (true, Some(token)) if !token.is_empty() => Some(token),
            (true, _) => {
                return Err(StoreError::InvalidListing(format!(
                    "truncated listing for {prefix} carries no continuation token"
                )));
            }
        };

        let objects = result
            .contents
            .into_iter()
            .map(|o| ObjectMeta {
                last_modified: o.last_modified(),
                key: o.key,
                size: o.size,
            })
            .collect();

        Ok(ListPage {
            objects,
            next_token,
        })
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.client.get_object(key).await
    }

    fn name(&self) -> &str {
        self.client.bucket()
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: Option<DateTime<Utc>>,
}

/// In-process store, mainly for embedding and tests
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    page_size: usize,
    get_calls: AtomicUsize,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
            get_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Builder form of [`MemoryObjectStore::insert`].
    pub fn with_object(
        self,
        key: impl Into<String>,
        body: impl Into<Vec<u8>>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        self.insert(key, body, last_modified);
        self
    }

    pub fn insert(
        &self,
        key: impl Into<String>,
        body: impl Into<Vec<u8>>,
        last_modified: Option<DateTime<Utc>>,
    ) {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        objects.insert(
            key.into(),
            StoredObject {
                body: body.into(),
                last_modified,
            },
        );
    }

    /// Number of `get` calls served so far.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> StoreResult<ListPage> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let start = match continuation {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Included(prefix.to_string()),
        };

        let mut page: Vec<ObjectMeta> = objects
            .range::<String, _>((start, Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(self.page_size + 1)
            .map(|(key, obj)| ObjectMeta {
                key: key.clone(),
                last_modified: obj.last_modified,
                size: obj.body.len() as u64,
            })
            .collect();

        let next_token = if page.len() > self.page_size {
            page.truncate(self.page_size);
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            next_token,
        })
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| StoreError::not_found(key))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Unified backend - chosen from configuration
pub enum Backend {
    Local(LocalObjectStore),
    Remote(RemoteObjectStore),
    Memory(MemoryObjectStore),
}

impl Backend {
    /// Create from the `[store]` config section
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        match config.backend {
            BackendKind::Local => {
                let root = config.root.as_ref().ok_or_else(|| {
                    StoreError::Config(
                        "store.root must be set for the local backend".to_string(),
                    )
                })?;
                Ok(Backend::Local(
                    LocalObjectStore::new(root).with_page_size(config.page_size),
                ))
            }
            BackendKind::S3 => {
                let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                    StoreError::Config("store.endpoint must be set for the s3 backend".to_string())
                })?;
                let bucket = config.bucket.as_deref().ok_or_else(|| {
                    StoreError::Config("store.bucket must be set for the s3 backend".to_string())
                })?;
                let client = S3Client::new(endpoint, bucket, config.token.clone(), config.timeout_secs)?
                    .with_page_size(config.page_size);
                Ok(Backend::Remote(RemoteObjectStore::new(client)))
            }
        }
    }
}

#[async_trait]
impl ObjectStore for Backend {
    async fn list_page(&self, prefix: &str, continuation: Option<&str>) -> StoreResult<ListPage> {
        match self {
            Backend::Local(store) => store.list_page(prefix, continuation).await,
            Backend::Remote(store) => store.list_page(prefix, continuation).await,
            Backend::Memory(store) => store.list_page(prefix, continuation).await,
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        match self {
            Backend::Local(store) => store.get(key).await,
            Backend::Remote(store) => store.get(key).await,
            Backend::Memory(store) => store.get(key).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Backend::Local(store) => store.name(),
            Backend::Remote(store) => store.name(),
            Backend::Memory(store) => store.name(),
        }
    }
}
