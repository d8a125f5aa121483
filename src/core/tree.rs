//! Document tree builder
//!
//! Turns the flat ordered listing into two navigation trees: curated wiki
//! pages (listed in the manifest) and everything else. The build is a fold
//! over the ordered paths into a mutable-by-value builder, finished into an
//! immutable [`DocFolder`]; the same input always yields the same tree.
//!
//! ```text
//! ordered paths ──fold──▶ FolderBuilder ──finish──▶ DocFolder
//!                         (wiki, other)            order_index + sort
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

use super::documents::INDEX_FILE;
use super::manifest::WikiManifest;
use super::metadata::MetadataMap;
use super::title::file_name;

/// Leaf of a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocFileEntry {
    pub path: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// Folder node; `id` is the `/`-joined segment path from the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocFolder {
    pub id: String,
    pub name: String,
    pub label: String,
    pub children: Vec<DocFolder>,
    pub files: Vec<DocFileEntry>,
    /// Smallest listing position of anything below; `None` when empty.
    pub order_index: Option<usize>,
}

impl DocFolder {
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.files.is_empty()
    }

    /// Number of files in this folder and all descendants.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.children.iter().map(DocFolder::file_count).sum::<usize>()
    }
}

/// The two navigation trees of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocTrees {
    pub wiki: DocFolder,
    pub other: DocFolder,
}

/// Display label of a path segment: `getting_started-guide` becomes
/// `Getting Started Guide`.
pub fn format_segment(segment: &str) -> String {
    let mut label = String::with_capacity(segment.len());
    let mut in_separator = false;
    for c in segment.chars() {
        if c == '-' || c == '_' {
            if !in_separator {
                label.push(' ');
            }
            in_separator = true;
            continue;
        }
        in_separator = false;
        let at_word_start = label
            .chars()
            .next_back()
            .map_or(true, |prev| !(prev.is_ascii_alphanumeric() || prev == '_'));
        if at_word_start {
            label.push(c.to_ascii_uppercase());
        } else {
            label.push(c);
        }
    }
    label
}

#[derive(Default)]
struct FolderBuilder {
    children: IndexMap<String, FolderBuilder>,
    files: Vec<(usize, DocFileEntry)>,
}

impl FolderBuilder {
    fn insert(mut self, dirs: &[&str], position: usize, entry: DocFileEntry) -> Self {
        match dirs.split_first() {
            None => self.files.push((position, entry)),
            Some((head, rest)) => {
                let slot = self.children.entry((*head).to_string()).or_default();
                *slot = std::mem::take(slot).insert(rest, position, entry);
            }
        }
        self
    }

    fn finish(self, id: String, name: String) -> DocFolder {
        let mut children: Vec<DocFolder> = self
            .children
            .into_iter()
            .map(|(segment, child)| {
                let child_id = if id.is_empty() {
                    segment.clone()
                } else {
                    format!("{id}/{segment}")
                };
                child.finish(child_id, segment)
            })
            .collect();

        let mut files = self.files;
        let order_index = files
            .iter()
            .map(|(position, _)| *position)
            .chain(children.iter().filter_map(|c| c.order_index))
            .min();

        children.sort_by(|a, b| {
            order_key(a.order_index, b.order_index)
                .then_with(|| compare_labels(&a.label, &b.label))
        });
        files.sort_by(|(pa, a), (pb, b)| {
            pa.cmp(pb)
                .then_with(|| is_index(b).cmp(&is_index(a)))
                .then_with(|| compare_labels(&a.title, &b.title))
        });

        DocFolder {
            label: format_segment(&name),
            id,
            name,
            children,
            files: files.into_iter().map(|(_, entry)| entry).collect(),
            order_index,
        }
    }
}

/// Ascending, with `None` after every position.
fn order_key(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn is_index(entry: &DocFileEntry) -> bool {
    file_name(&entry.path).eq_ignore_ascii_case(INDEX_FILE)
}

/// Build the wiki and other trees from an ordered listing.
///
/// `titles` maps paths to extracted titles; paths without one are shown by
/// file name. With no manifest, or one that lists no pages, everything goes
/// to the other tree.
pub fn build_doc_trees(
    paths: &[String],
    titles: &HashMap<String, String>,
    metadata: &MetadataMap,
    manifest: Option<&WikiManifest>,
) -> DocTrees {
    let wiki_paths: HashSet<String> = manifest
        .map(|m| m.ordered_paths().into_iter().collect())
        .unwrap_or_default();

    let (wiki, other) = paths.iter().enumerate().fold(
        (FolderBuilder::default(), FolderBuilder::default()),
        |(wiki, other), (position, path)| {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let Some((leaf, dirs)) = segments.split_last() else {
                return (wiki, other);
            };

            let entry = DocFileEntry {
                path: path.clone(),
                title: titles
                    .get(path)
                    .filter(|t| !t.is_empty())
                    .cloned()
                    .unwrap_or_else(|| (*leaf).to_string()),
                origin: metadata.get(path).and_then(|m| m.origin.clone()),
            };

            if wiki_paths.contains(path) {
                (wiki.insert(dirs, position, entry), other)
            } else {
                (wiki, other.insert(dirs, position, entry))
            }
        },
    );

    DocTrees {
        wiki: wiki.finish(String::new(), String::new()),
        other: other.finish(String::new(), String::new()),
    }
}
