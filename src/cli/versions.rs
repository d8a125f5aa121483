//! `wikidocs versions` command
//!
//! Lists the snapshots of a knowledge base, oldest first.
//!
//! # Usage
//! ```bash
//! wikidocs versions --kb acme
//! wikidocs versions --kb acme --format json
//! ```

use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::utils::{print_json, KbArgs, OutputFormat, Session};
use crate::core::versions::VersionInfo;

#[derive(Args, Debug)]
pub struct VersionsArgs {
    #[command(flatten)]
    pub kb: KbArgs,
}

#[derive(Tabled)]
struct VersionRow {
    #[tabled(rename = "Snapshot")]
    id: String,
    #[tabled(rename = "Last modified")]
    last_modified: String,
    #[tabled(rename = "")]
    marker: &'static str,
}

fn rows(versions: &[VersionInfo]) -> Vec<VersionRow> {
    let latest = versions.len().saturating_sub(1);
    versions
        .iter()
        .enumerate()
        .map(|(i, v)| VersionRow {
            id: v.id.clone(),
            last_modified: v
                .last_modified
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
            marker: if i == latest { "latest" } else { "" },
        })
        .collect()
}

pub async fn run(args: VersionsArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(config_path, &args.kb)?;
    let versions = session.wiki.list_version_details(&session.kb_id).await?;

    if args.kb.format == OutputFormat::Json {
        return print_json(&versions);
    }

    if versions.is_empty() {
        println!("No versions found for knowledge base '{}'", session.kb_id);
        return Ok(());
    }

    println!("{} {}\n", "Knowledge base".bold(), session.kb_id.cyan());
    println!("{}", Table::new(rows(&versions)).with(Style::rounded()));
    println!("\n{} snapshot(s)", versions.len());
    Ok(())
}
