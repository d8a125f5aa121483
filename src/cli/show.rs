//! `wikidocs show` command
//!
//! Prints one document of a snapshot.
//!
//! # Usage
//! ```bash
//! wikidocs show --kb acme guides/setup.md
//! wikidocs show --kb acme README.md --toc          # Headings only
//! wikidocs show --kb acme guides/setup.md --links  # Where each link leads
//! wikidocs show --kb acme index.md -s 3f2a --format json
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use regex_lite::Regex;
use serde::Serialize;

use super::utils::{print_json, short_sha, OutputFormat, Session, SnapshotArgs};
use crate::core::link::{resolve_link, LinkDestination};
use crate::core::title::{extract_title, file_name};
use crate::core::toc::{build_toc, TocEntry};

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Document path, relative to the snapshot
    pub path: String,

    /// Print the table of contents instead of the content
    #[arg(long)]
    pub toc: bool,

    /// Print where each relative link of the document leads
    #[arg(long)]
    pub links: bool,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    path: &'a str,
    snapshot: &'a str,
    title: String,
    content: &'a str,
    toc: Vec<TocEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<Vec<LinkOutput>>,
}

#[derive(Serialize)]
struct LinkOutput {
    href: String,
    destination: LinkDestination,
}

fn link_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]\(([^)\s]+)(?:\s+[^)]*)?\)").ok())
        .as_ref()
}

/// Targets of inline markdown links, in order, without duplicates.
fn extract_hrefs(content: &str) -> Vec<String> {
    let Some(re) = link_regex() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    re.captures_iter(content)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|href| seen.insert(href.clone()))
        .collect()
}

pub async fn run(args: ShowArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(config_path, &args.snapshot.kb)?;
    let sha = session.snapshot(args.snapshot.snapshot.as_deref()).await?;
    let path = args.path.trim_start_matches('/');

    let Some(content) = session.wiki.get_document(&session.kb_id, &sha, path).await else {
        bail!("Document not found: {}", path);
    };

    let links = if args.links {
        let listing = session.wiki.list_documents_ordered(&session.kb_id, &sha).await?;
        let known: HashSet<String> = listing.paths.into_iter().collect();
        let resolved = extract_hrefs(&content)
            .into_iter()
            .filter_map(|href| {
                resolve_link(&href, path, &known, session.repo_url(), Some(sha.as_str()))
                    .map(|destination| LinkOutput { href, destination })
            })
            .collect();
        Some(resolved)
    } else {
        None
    };

    let title = extract_title(&content, file_name(path));
    let toc = build_toc(&content);

    if args.snapshot.kb.format == OutputFormat::Json {
        return print_json(&ShowOutput {
            path,
            snapshot: &sha,
            title,
            content: &content,
            toc,
            links,
        });
    }

    println!(
        "{} {}  {}",
        "##".dimmed(),
        title.cyan().bold(),
        format!("{} @ {}", path, short_sha(&sha)).dimmed()
    );
    println!();

    if let Some(links) = links {
        if links.is_empty() {
            println!("No relative links");
        }
        for link in links {
            let target = match &link.destination {
                LinkDestination::Internal { path } => path.green().to_string(),
                LinkDestination::External { url } => url.yellow().to_string(),
                LinkDestination::Unresolved { path } => format!("{} (unresolved)", path).red().to_string(),
            };
            println!("  {} → {}", link.href, target);
        }
    } else if args.toc {
        for entry in toc {
            let indent = "  ".repeat(entry.level.saturating_sub(1));
            println!("{}{} {}", indent, entry.text, format!("#{}", entry.id).dimmed());
        }
    } else {
        println!("{}", content);
    }

    Ok(())
}
