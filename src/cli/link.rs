//! `wikidocs link` command
//!
//! Shows where a link found in a document leads.
//!
//! # Usage
//! ```bash
//! wikidocs link --kb acme wiki/intro.md ../repo-docs/README.md
//! wikidocs link --kb acme README.md ../src/main.rs --repo-url https://github.com/org/repo
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::{print_json, OutputFormat, Session, SnapshotArgs};
use crate::core::link::{classify_href, LinkDestination};

#[derive(Args, Debug)]
pub struct LinkArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Document the link appears in
    pub current: String,

    /// Link target as written in the document
    pub href: String,

    /// Repository browse URL (default: repo_url of the knowledge base)
    #[arg(long)]
    pub repo_url: Option<String>,
}

pub async fn run(args: LinkArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(config_path, &args.snapshot.kb)?;
    let json = args.snapshot.kb.format == OutputFormat::Json;

    let Some(href) = classify_href(&args.href) else {
        if json {
            return print_json(&serde_json::json!({ "type": "skipped", "href": args.href }));
        }
        println!("{} {} is not a relative document link", "⚠".yellow(), args.href);
        return Ok(());
    };

    let sha = session.snapshot(args.snapshot.snapshot.as_deref()).await?;
    let listing = session.wiki.list_documents_ordered(&session.kb_id, &sha).await?;
    let known: HashSet<String> = listing.paths.into_iter().collect();
    let repo_url = args.repo_url.as_deref().or_else(|| session.repo_url());

    let destination = session.wiki.resolve_link(
        href,
        args.current.trim_start_matches('/'),
        &known,
        repo_url,
        Some(sha.as_str()),
    );

    if json {
        return print_json(&destination);
    }

    match destination {
        LinkDestination::Internal { path } => {
            println!("{} document {}", "✓".green(), path.cyan())
        }
        LinkDestination::External { url } => {
            println!("{} repository {}", "↗".yellow(), url)
        }
        LinkDestination::Unresolved { path } => {
            println!("{} unresolved {}", "✗".red(), path);
            println!("  {}", "Set repo_url for the knowledge base to link into the repository.".dimmed());
        }
    }
    Ok(())
}
