//! `wikidocs init` command
//!
//! Writes a `.wikidocs/config.toml` pointing at a document store.
//!
//! # Usage
//! ```bash
//! wikidocs init                               # local store in .wikidocs/store
//! wikidocs init --root /srv/wiki --kb acme    # existing directory tree
//! wikidocs init --endpoint http://localhost:9000 --bucket docs
//! wikidocs init --global                      # ~/.wikidocs/config.toml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::{BackendKind, Config, CONFIG_DIR, CONFIG_FILE};

/// Store directory created next to the config when no backend is given.
const DEFAULT_STORE_DIR: &str = "store";

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Initialize global config (~/.wikidocs)
    #[arg(long)]
    pub global: bool,

    /// Local store root
    #[arg(long, conflicts_with = "endpoint")]
    pub root: Option<PathBuf>,

    /// S3-compatible endpoint URL
    #[arg(long, requires = "bucket")]
    pub endpoint: Option<String>,

    /// Bucket name (with --endpoint)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Default knowledge base
    #[arg(long)]
    pub kb: Option<String>,

    /// Overwrite an existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let base_path = if args.global {
        directories::UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Cannot determine home directory")?
    } else {
        args.path.clone().unwrap_or_else(|| PathBuf::from("."))
    };

    let config_dir = base_path.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    if config_path.exists() && !args.force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = build_config(&args);
    fs::create_dir_all(&config_dir)?;
    let created_store = create_store_dir(&config, &config_dir)?;
    config.save_to(&config_path)?;

    println!("{} Initialized wikidocs", "✓".green());
    println!("   Config: {}", config_path.display());
    match config.store.backend {
        BackendKind::Local => {
            if let Some(store) = created_store {
                println!("   Store:  {}", store.display());
            }
        }
        BackendKind::S3 => {
            println!(
                "   Store:  s3 {} / {}",
                config.store.endpoint.as_deref().unwrap_or_default(),
                config.store.bucket.as_deref().unwrap_or_default()
            );
        }
    }
    println!("\nNext steps:");
    println!("  wikidocs versions --kb <kb>");
    println!("  wikidocs tree --kb <kb>");

    Ok(())
}

fn build_config(args: &InitArgs) -> Config {
    let mut config = Config {
        default_kb: args.kb.clone(),
        ..Config::default()
    };

    if let Some(endpoint) = &args.endpoint {
        config.store.backend = BackendKind::S3;
        config.store.endpoint = Some(endpoint.clone());
        config.store.bucket = args.bucket.clone();
    } else {
        config.store.backend = BackendKind::Local;
        config.store.root = Some(
            args.root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
        );
    }
    config
}

/// Create the local store directory; relative roots live under `config_dir`.
fn create_store_dir(config: &Config, config_dir: &Path) -> Result<Option<PathBuf>> {
    let Some(root) = config.store.root.as_ref() else {
        return Ok(None);
    };
    let root = if root.is_relative() {
        config_dir.join(root)
    } else {
        root.clone()
    };
    fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create store directory {}", root.display()))?;
    Ok(Some(root))
}
