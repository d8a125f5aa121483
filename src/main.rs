//! wikidocs CLI - Entry point
//!
//! Usage: wikidocs <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wikidocs::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "wikidocs=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init(args) => wikidocs::cli::init::run(args),
        Commands::Config(args) => wikidocs::cli::config::run(args, config),
        Commands::Versions(args) => wikidocs::cli::versions::run(args, config).await,
        Commands::Ls(args) => wikidocs::cli::browse::run_ls(args, config).await,
        Commands::Tree(args) => wikidocs::cli::browse::run_tree(args, config).await,
        Commands::Show(args) => wikidocs::cli::show::run(args, config).await,
        Commands::Search(args) => wikidocs::cli::search::run(args, config).await,
        Commands::Link(args) => wikidocs::cli::link::run(args, config).await,
    }
}
