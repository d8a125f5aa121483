//! Table of contents for one document
//!
//! ATX headings of level 1 to 3, outside fenced code blocks, each with a
//! unique anchor id.

use std::collections::HashMap;

use serde::Serialize;

use super::title::strip_markdown_syntax;

/// Deepest heading level listed.
pub const MAX_TOC_LEVEL: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: usize,
}

/// Anchor id: lowercase, trimmed, characters outside `[a-z0-9]`, whitespace
/// and `-` dropped, whitespace runs turned into `-`, repeated `-` collapsed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.to_lowercase().trim().chars() {
        if c.is_whitespace() {
            if !in_space && !slug.ends_with('-') {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c == '-' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        }
    }
    slug
}

/// Level and raw text of an ATX heading line.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let line = &line[indent..];
    let level = line.len() - line.trim_start_matches('#').len();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }

    // optional closing sequence: "## Title ##"
    let rest = rest.trim();
    let text = match rest.trim_end_matches('#') {
        stripped if stripped.len() == rest.len() => rest,
        "" => "",
        stripped if stripped.ends_with([' ', '\t']) => stripped.trim_end(),
        _ => rest,
    };
    Some((level, text))
}

fn fence_marker(line: &str) -> Option<&'static str> {
    let line = line.trim_start();
    if line.starts_with("```") {
        Some("```")
    } else if line.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// Headings of a markdown document in order of appearance.
pub fn build_toc(markdown: &str) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut open_fence: Option<&'static str> = None;

    for line in markdown.lines() {
        if let Some(marker) = fence_marker(line) {
            match open_fence {
                Some(open) if open == marker => open_fence = None,
                Some(_) => {}
                None => open_fence = Some(marker),
            }
            continue;
        }
        if open_fence.is_some() {
            continue;
        }

        let Some((level, raw)) = parse_heading(line) else {
            continue;
        };
        if level > MAX_TOC_LEVEL {
            continue;
        }

        let text = strip_markdown_syntax(raw).replace(['`', '*'], "");
        let base = slugify(&text);
        if base.is_empty() {
            continue;
        }

        // numbered per base slug: base, base-2, base-3
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;
        let id = match *count {
            1 => base,
            n => format!("{base}-{n}"),
        };
        entries.push(TocEntry { id, text, level });
    }
    entries
}
