//! CLI utility functions
//!
//! Common helpers shared across commands:
//! - Config loading honouring `--config`
//! - Knowledge base and snapshot selection
//! - Output format switch

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::config::Config;
use crate::core::wiki::WikiStore;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable, colored
    #[default]
    Pretty,
    /// Machine-readable JSON
    Json,
}

/// Knowledge base selection shared by every read command
#[derive(Args, Debug, Clone)]
pub struct KbArgs {
    /// Knowledge base id (default: `default_kb` from config)
    #[arg(long, env = "WIKIDOCS_KB")]
    pub kb: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

/// Knowledge base plus snapshot selection
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub kb: KbArgs,

    /// Snapshot id or unique prefix (default: latest)
    #[arg(short, long)]
    pub snapshot: Option<String>,
}

/// Load configuration from an explicit path or the default locations
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_explicit(path),
        None => Config::load(),
    }
}

/// Opened store plus the knowledge base a command works on
pub struct Session {
    pub config: Config,
    pub wiki: WikiStore,
    pub kb_id: String,
}

impl Session {
    pub fn open(config_path: Option<&Path>, args: &KbArgs) -> Result<Self> {
        let config = load_config(config_path)?;
        let kb_id = match args.kb.clone().or_else(|| config.default_kb.clone()) {
            Some(kb) if !kb.trim().is_empty() => kb,
            _ => bail!("No knowledge base selected. Pass --kb or set default_kb in the config."),
        };
        let wiki = WikiStore::from_config(&config).context("Failed to open document store")?;
        Ok(Self { config, wiki, kb_id })
    }

    /// Snapshot to read: the requested one (short ids expand) or the latest.
    pub async fn snapshot(&self, requested: Option<&str>) -> Result<String> {
        match self.wiki.resolve_version(&self.kb_id, requested).await? {
            Some(sha) => Ok(sha),
            None => bail!("No versions found for knowledge base '{}'", self.kb_id),
        }
    }

    /// Repository URL configured for the current knowledge base
    pub fn repo_url(&self) -> Option<&str> {
        self.config
            .knowledge_base(&self.kb_id)
            .and_then(|kb| kb.repo_url.as_deref())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// First 8 characters of a snapshot id
pub fn short_sha(sha: &str) -> &str {
    sha.char_indices().nth(8).map_or(sha, |(i, _)| &sha[..i])
}
