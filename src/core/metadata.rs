//! Metadata resolver
//!
//! Provenance per document. Current snapshots carry `__metadata__.json`:
//!
//! ```json
//! { "guides/setup.md": { "origin": "generated", "process_id": "p-42" } }
//! ```
//!
//! Snapshots from older generators only have `__origins__.json`, a plain
//! `path -> origin` map, which is reshaped into the current form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::keys::KeyLayout;
use super::object_store::ObjectStore;

/// Provenance of one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,
}

/// Path -> provenance, ordered by path
pub type MetadataMap = BTreeMap<String, MetadataEntry>;

fn string_field(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Read the current sidecar format. `None` unless the JSON is an object.
pub fn parse_metadata(bytes: &[u8]) -> Option<MetadataMap> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    let object = value.as_object()?;

    Some(
        object
            .iter()
            .map(|(path, entry)| {
                let entry = match entry {
                    Value::String(origin) => MetadataEntry {
                        origin: Some(origin.clone()),
                        process_id: None,
                    },
                    other => MetadataEntry {
                        origin: string_field(other, "origin"),
                        process_id: string_field(other, "process_id"),
                    },
                };
                (path.clone(), entry)
            })
            .collect(),
    )
}

/// Read the legacy `path -> origin` format; non-string origins are skipped.
pub fn parse_legacy_origins(bytes: &[u8]) -> Option<MetadataMap> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    let object = value.as_object()?;

    Some(
        object
            .iter()
            .filter_map(|(path, origin)| {
                let origin = origin.as_str()?;
                Some((
                    path.clone(),
                    MetadataEntry {
                        origin: Some(origin.to_string()),
                        process_id: None,
                    },
                ))
            })
            .collect(),
    )
}

async fn read_sidecar(
    store: &dyn ObjectStore,
    key: &str,
    parse: fn(&[u8]) -> Option<MetadataMap>,
) -> Option<MetadataMap> {
    match store.get(key).await {
        Ok(bytes) => {
            let parsed = parse(&bytes);
            if parsed.is_none() {
                warn!(%key, "metadata sidecar is not a JSON object");
            }
            parsed
        }
        Err(e) if e.is_not_found() => {
            debug!(%key, "no metadata sidecar");
            None
        }
        Err(e) => {
            warn!(%key, error = %e, "metadata sidecar unavailable");
            None
        }
    }
}

/// Metadata of a snapshot: current sidecar, else legacy, else empty.
pub async fn get_metadata(
    store: &dyn ObjectStore,
    layout: &KeyLayout,
    kb_id: &str,
    sha: &str,
) -> MetadataMap {
    if let Some(map) = read_sidecar(store, &layout.metadata_key(kb_id, sha), parse_metadata).await
    {
        return map;
    }
    read_sidecar(
        store,
        &layout.legacy_origins_key(kb_id, sha),
        parse_legacy_origins,
    )
    .await
    .unwrap_or_default()
}
