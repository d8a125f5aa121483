//! `wikidocs config` command
//!
//! Get or set configuration values.
//!
//! # Usage
//! ```bash
//! wikidocs config                           # Show the active config file
//! wikidocs config store.root                # Get specific value
//! wikidocs config store.root /srv/wiki      # Set value
//! wikidocs config search.max_total 100 -g   # Set in ~/.wikidocs/config.toml
//! wikidocs config --path                    # Show config file locations
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::{Config, CONFIG_DIR, CONFIG_FILE};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config key (e.g., store.root, search.max_total, default_kb)
    pub key: Option<String>,

    /// Value to set
    pub value: Option<String>,

    /// Show config file paths
    #[arg(long)]
    pub path: bool,

    /// Use global config (~/.wikidocs/config.toml) instead of local
    #[arg(short, long)]
    pub global: bool,
}

/// File a read or write goes to.
///
/// `--config` wins; otherwise the nearest local file, falling back to
/// `./.wikidocs/config.toml` for writes.
fn target_path(explicit: Option<&Path>, global: bool) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if global {
        return Config::global_config_path().context("Cannot determine home directory");
    }
    Ok(Config::find_local_config()
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE)))
}

pub fn run(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    let config_path = target_path(explicit, args.global)?;

    if args.path {
        let global = Config::global_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(unknown)".to_string());
        let local = Config::find_local_config()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());
        println!("Global: {}", global);
        println!("Local:  {}", local);
        println!();
        match Config::locate() {
            Some(active) if explicit.is_none() => {
                println!("{} Active: {}", "✓".green(), active.display())
            }
            _ if config_path.exists() => {
                println!("{} Active: {}", "✓".green(), config_path.display())
            }
            _ => println!("{} No config file found, using defaults", "⚠".yellow()),
        }
        return Ok(());
    }

    let Some(key) = args.key.as_deref() else {
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            println!("{} {}\n", "Configuration".bold(), config_path.display().to_string().dimmed());
            println!("{}", content);
        } else {
            println!("No config file at {}", config_path.display());
            println!();
            println!("Create one with:");
            println!("  wikidocs init");
            println!("  wikidocs config store.root /path/to/store");
        }
        return Ok(());
    };

    match args.value.as_deref() {
        Some(value) => {
            set_config_value(&config_path, key, value)?;
            println!(
                "{} Set {} = {} (in {})",
                "✓".green(),
                key.cyan(),
                value,
                config_path.display()
            );
        }
        None => match get_config_value(&config_path, key)? {
            Some(value) => println!("{}", value),
            None => println!("{}", "(not set)".dimmed()),
        },
    }

    Ok(())
}

/// Set a config value using dot notation (e.g., "store.root").
///
/// The file is checked against the config schema before it is written.
fn set_config_value(path: &Path, key: &str, val: &str) -> Result<()> {
    use toml_edit::{value, DocumentMut};

    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    match key.split('.').collect::<Vec<_>>().as_slice() {
        [name] => doc[*name] = value(parse_toml_value(val)),
        [section, name] => {
            if doc.get(*section).is_none() {
                doc[*section] = toml_edit::table();
            }
            doc[*section][*name] = value(parse_toml_value(val));
        }
        _ => bail!("Key too deep: {}. Max depth is section.key", key),
    }

    let updated = doc.to_string();
    toml::from_str::<Config>(&updated)
        .with_context(|| format!("Invalid value for {}: {}", key, val))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, updated)?;
    Ok(())
}

/// Get a config value by dot notation key
fn get_config_value(path: &Path, key: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let doc: toml::Value = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let val = match key.split('.').collect::<Vec<_>>().as_slice() {
        [name] => doc.get(*name),
        [section, name] => doc.get(*section).and_then(|t| t.get(*name)),
        _ => None,
    };

    Ok(val.map(|v| match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

/// Parse string value to the matching TOML type
fn parse_toml_value(s: &str) -> toml_edit::Value {
    match s {
        "true" => toml_edit::Value::from(true),
        "false" => toml_edit::Value::from(false),
        _ => {
            if let Ok(i) = s.parse::<i64>() {
                toml_edit::Value::from(i)
            } else if let Ok(f) = s.parse::<f64>() {
                toml_edit::Value::from(f)
            } else {
                toml_edit::Value::from(s)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_toml_value() {
        assert_eq!(parse_toml_value("true").as_bool(), Some(true));
        assert_eq!(parse_toml_value("42").as_integer(), Some(42));
        assert_eq!(parse_toml_value("1.5").as_float(), Some(1.5));
        assert_eq!(parse_toml_value("docs").as_str(), Some("docs"));
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILE);

        set_config_value(&path, "default_kb", "acme").unwrap();
        set_config_value(&path, "search.max_total", "100").unwrap();
        set_config_value(&path, "store.root", "/srv/wiki").unwrap();

        assert_eq!(get_config_value(&path, "default_kb").unwrap().as_deref(), Some("acme"));
        assert_eq!(get_config_value(&path, "search.max_total").unwrap().as_deref(), Some("100"));
        assert_eq!(get_config_value(&path, "store.missing").unwrap(), None);

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.search.max_total, 100);
        assert_eq!(config.store.root, Some(PathBuf::from("/srv/wiki")));
    }

    #[test]
    fn test_set_keeps_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "# my store\n[store]\nroot = \"data\"\n").unwrap();

        set_config_value(&path, "store.page_size", "50").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# my store"));
        assert!(content.contains("page_size = 50"));
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(set_config_value(&path, "search.max_total", "many").is_err());
        assert!(set_config_value(&path, "a.b.c", "1").is_err());
        assert!(!path.exists());
    }
}
