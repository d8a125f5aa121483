//! `wikidocs search` command
//!
//! Case-insensitive substring search over the documents of a snapshot.
//!
//! # Usage
//! ```bash
//! wikidocs search --kb acme "timeout"
//! wikidocs search --kb acme "retry policy" -s 3f2a
//! wikidocs search --kb acme "timeout" --format json
//! ```
//!
//! # Architecture
//! - Documents are scanned one after another in listing order
//! - Hits per document and per query are capped (`[search]` in config)

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use super::utils::{print_json, short_sha, OutputFormat, Session, SnapshotArgs};
use crate::core::search::SearchHit;

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Text to look for
    pub query: String,
}

pub async fn run(args: SearchArgs, config_path: Option<&Path>) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        bail!("Search query must not be empty");
    }

    let session = Session::open(config_path, &args.snapshot.kb)?;
    let sha = session.snapshot(args.snapshot.snapshot.as_deref()).await?;
    let hits = session.wiki.search(&session.kb_id, &sha, query).await?;

    if args.snapshot.kb.format == OutputFormat::Json {
        return print_json(&hits);
    }

    println!(
        "{} results for {} in {} @ {}\n",
        hits.len(),
        format!("\"{}\"", query).bold(),
        session.kb_id.cyan(),
        short_sha(&sha).dimmed()
    );
    print_hits(&hits);
    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    let mut current: Option<&str> = None;
    for hit in hits {
        if current != Some(hit.path.as_str()) {
            if current.is_some() {
                println!();
            }
            println!("{} {}", "##".dimmed(), hit.path.cyan().bold());
            current = Some(&hit.path);
        }
        println!("   {} {}", format!("{:>4}:", hit.line).dimmed(), hit.snippet);
    }
}
