//! CLI module - Command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod browse;
pub mod config;
pub mod init;
pub mod link;
pub mod search;
pub mod show;
pub mod utils;
pub mod versions;

/// wikidocs - versioned wiki documents from object storage
///
/// Reads the documentation snapshots of knowledge bases straight from a
/// local directory or an S3-compatible bucket.
#[derive(Parser, Debug)]
#[command(name = "wikidocs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "WIKIDOCS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a config pointing at a document store
    Init(init::InitArgs),

    /// Get or set configuration
    Config(config::ConfigArgs),

    /// List snapshots of a knowledge base
    Versions(versions::VersionsArgs),

    /// List documents in display order
    Ls(browse::LsArgs),

    /// Show wiki and other document trees
    Tree(browse::TreeArgs),

    /// Show a document
    Show(show::ShowArgs),

    /// Search documents
    Search(search::SearchArgs),

    /// Resolve a link found in a document
    Link(link::LinkArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::try_parse_from([
            "wikidocs", "show", "--kb", "acme", "-s", "3f2a", "guides/setup.md", "--toc",
        ])
        .unwrap();
        match cli.command {
            Commands::Show(args) => {
                assert_eq!(args.path, "guides/setup.md");
                assert_eq!(args.snapshot.snapshot.as_deref(), Some("3f2a"));
                assert_eq!(args.snapshot.kb.kb.as_deref(), Some("acme"));
                assert!(args.toc);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
