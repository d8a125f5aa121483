//! Object key layout
//!
//! Every object this crate reads lives under one flat namespace:
//!
//! ```text
//! {base}/{kb}/docs/{sha}/{relative/path}.md     document content
//! {base}/{kb}/docs/{sha}/.umans/docs.json       manifest
//! {base}/{kb}/docs/{sha}/__metadata__.json      metadata (current)
//! {base}/{kb}/docs/{sha}/__origins__.json       metadata (legacy)
//! ```

/// Relative key of the generator manifest inside a snapshot.
pub const MANIFEST_FILE: &str = ".umans/docs.json";

/// Relative key of the consolidated metadata sidecar.
pub const METADATA_FILE: &str = "__metadata__.json";

/// Relative key of the legacy path -> origin sidecar.
pub const LEGACY_ORIGINS_FILE: &str = "__origins__.json";

/// Default top-level prefix.
pub const DEFAULT_BASE_PREFIX: &str = "base";

/// Builds object keys for knowledge bases and snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    base: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PREFIX)
    }
}

impl KeyLayout {
    /// Create a layout rooted at `base` (slashes around it are ignored).
    pub fn new(base: impl AsRef<str>) -> Self {
        Self {
            base: base.as_ref().trim_matches('/').to_string(),
        }
    }

    /// `{base}/{kb}/docs/` - scopes every snapshot of a knowledge base.
    pub fn versions_prefix(&self, kb_id: &str) -> String {
        if self.base.is_empty() {
            format!("{kb_id}/docs/")
        } else {
            format!("{}/{kb_id}/docs/", self.base)
        }
    }

    /// `{base}/{kb}/docs/{sha}/` - scopes one snapshot.
    pub fn snapshot_prefix(&self, kb_id: &str, sha: &str) -> String {
        format!("{}{sha}/", self.versions_prefix(kb_id))
    }

    /// Key of a document (or any object) inside a snapshot.
    pub fn object_key(&self, kb_id: &str, sha: &str, relative: &str) -> String {
        format!(
            "{}{}",
            self.snapshot_prefix(kb_id, sha),
            relative.trim_start_matches('/')
        )
    }

    pub fn manifest_key(&self, kb_id: &str, sha: &str) -> String {
        self.object_key(kb_id, sha, MANIFEST_FILE)
    }

    pub fn metadata_key(&self, kb_id: &str, sha: &str) -> String {
        self.object_key(kb_id, sha, METADATA_FILE)
    }

    pub fn legacy_origins_key(&self, kb_id: &str, sha: &str) -> String {
        self.object_key(kb_id, sha, LEGACY_ORIGINS_FILE)
    }
}
