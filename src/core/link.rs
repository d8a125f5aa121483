//! Link resolver
//!
//! Generated documents link to each other with relative hrefs. A link
//! either lands on another document of the snapshot, or on a file of the
//! source repository that was never exported, in which case it is sent to
//! the repository browser when one is configured.
//!
//! # Usage
//!
//! ```
//! use std::collections::HashSet;
//! use wikidocs::core::link::{resolve_link, LinkDestination};
//!
//! let known: HashSet<String> = ["wiki/setup.md".to_string()].into();
//! let dest = resolve_link("./setup.md#install", "wiki/intro.md", &known, None, None);
//! assert_eq!(dest, Some(LinkDestination::Internal { path: "wiki/setup.md".into() }));
//! ```

use std::collections::HashSet;

use serde::Serialize;

/// Where a link inside a document leads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LinkDestination {
    /// Another document of the same snapshot
    Internal { path: String },
    /// A file in the source repository browser
    External { url: String },
    /// Not a known document and no repository to fall back to
    Unresolved { path: String },
}

/// Resolve `href` against the document at `base_path`.
///
/// A leading `/` makes the href root-relative. `..` segments pop the base
/// directory and stop at the root instead of escaping it.
pub fn resolve_relative_path(base_path: &str, href: &str) -> String {
    if let Some(rooted) = href.strip_prefix('/') {
        return rooted.to_string();
    }

    let base_dir = base_path.rfind('/').map_or("", |i| &base_path[..i]);
    let href = href.strip_prefix("./").unwrap_or(href);

    if !href.split('/').any(|segment| segment == "..") {
        return if base_dir.is_empty() {
            href.to_string()
        } else {
            format!("{base_dir}/{href}")
        };
    }

    let mut stack: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };
    for segment in href.split('/') {
        match segment {
            ".." => {
                stack.pop();
            }
            "." => {}
            other => stack.push(other),
        }
    }
    stack.join("/")
}

/// Browse URL of a repository file: `{repo}/blob/{sha or HEAD}/{path}`.
///
/// One trailing `.git` and then one trailing `/` are removed from the
/// repository URL. `None` when no repository URL is set.
pub fn build_repo_file_url(
    repo_url: Option<&str>,
    path: &str,
    commit_sha: Option<&str>,
) -> Option<String> {
    let repo_url = repo_url.filter(|u| !u.is_empty())?;
    let repo_url = repo_url.strip_suffix(".git").unwrap_or(repo_url);
    let repo_url = repo_url.strip_suffix('/').unwrap_or(repo_url);
    let reference = commit_sha.filter(|s| !s.is_empty()).unwrap_or("HEAD");
    Some(format!("{repo_url}/blob/{reference}/{path}"))
}

/// Classify an already-clean relative href.
pub fn resolve_link_destination(
    href: &str,
    current_path: &str,
    known_paths: &HashSet<String>,
    repo_url: Option<&str>,
    commit_sha: Option<&str>,
) -> LinkDestination {
    let path = resolve_relative_path(current_path, href);
    if known_paths.contains(&path) {
        return LinkDestination::Internal { path };
    }
    match build_repo_file_url(repo_url, &path, commit_sha) {
        Some(url) => LinkDestination::External { url },
        None => LinkDestination::Unresolved { path },
    }
}

fn has_scheme(href: &str) -> bool {
    match href.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Path part of an href the resolver should handle, or `None` for
/// fragments, `mailto:` and absolute URLs.
pub fn classify_href(href: &str) -> Option<&str> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("//")
        || href.to_ascii_lowercase().starts_with("mailto:")
        || has_scheme(href)
    {
        return None;
    }

    let end = href.find(['#', '?']).unwrap_or(href.len());
    let path = &href[..end];
    (!path.is_empty()).then_some(path)
}

/// [`classify_href`] followed by [`resolve_link_destination`].
pub fn resolve_link(
    href: &str,
    current_path: &str,
    known_paths: &HashSet<String>,
    repo_url: Option<&str>,
    commit_sha: Option<&str>,
) -> Option<LinkDestination> {
    let path = classify_href(href)?;
    Some(resolve_link_destination(
        path,
        current_path,
        known_paths,
        repo_url,
        commit_sha,
    ))
}
