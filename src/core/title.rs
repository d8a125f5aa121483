//! Document titles
//!
//! A document's title is its first level-one heading with image and link
//! markup removed, so a README heading full of CI badges reads as plain
//! text.

use std::sync::OnceLock;

use regex_lite::Regex;

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn h1_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"(?m)^#[ \t]+(.+)$")
}

fn image_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"!\[[^\]]*\]\([^)]*\)")
}

fn link_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"\[([^\]]*)\]\([^)]*\)")
}

/// Remove inline images, unwrap links to their text, collapse whitespace.
pub fn strip_markdown_syntax(text: &str) -> String {
    let mut result = text.to_string();
    if let Some(re) = image_regex() {
        result = re.replace_all(&result, "").into_owned();
    }
    if let Some(re) = link_regex() {
        result = re.replace_all(&result, "$1").into_owned();
    }
    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleaned text of the first `# ` heading, if any survives cleaning.
pub fn first_heading(content: &str) -> Option<String> {
    let caps = h1_regex()?.captures(content)?;
    let title = strip_markdown_syntax(caps.get(1)?.as_str());
    (!title.is_empty()).then_some(title)
}

/// Title of a document, or `fallback` when it has no usable heading.
pub fn extract_title(content: &str, fallback: &str) -> String {
    first_heading(content).unwrap_or_else(|| fallback.to_string())
}

/// Last path segment, used when a document has no heading.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
