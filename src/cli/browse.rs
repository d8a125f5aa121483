//! `wikidocs ls` and `wikidocs tree` commands
//!
//! Browse the documents of a snapshot.
//!
//! # Usage
//! ```bash
//! wikidocs ls --kb acme                     # Ordered document list
//! wikidocs ls --kb acme guides/             # Only paths under a prefix
//! wikidocs ls --kb acme -s 3f2a --format json
//!
//! wikidocs tree --kb acme                   # Wiki and other trees with titles
//! wikidocs tree --kb acme --depth 2
//! ```

use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::{print_json, short_sha, OutputFormat, Session, SnapshotArgs};
use crate::core::metadata::MetadataMap;
use crate::core::tree::DocFolder;

#[derive(Args, Debug)]
pub struct LsArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Only list paths starting with this prefix
    pub prefix: Option<String>,
}

pub async fn run_ls(args: LsArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(config_path, &args.snapshot.kb)?;
    let sha = session.snapshot(args.snapshot.snapshot.as_deref()).await?;
    let mut listing = session.wiki.list_documents_ordered(&session.kb_id, &sha).await?;

    if let Some(prefix) = args.prefix.as_deref() {
        let prefix = prefix.trim_start_matches('/');
        listing.paths.retain(|p| p.starts_with(prefix));
    }

    if args.snapshot.kb.format == OutputFormat::Json {
        return print_json(&listing);
    }

    if listing.paths.is_empty() {
        println!("No documents in {} @ {}", session.kb_id, short_sha(&sha));
        return Ok(());
    }

    println!(
        "{} {} @ {}\n",
        "📂".dimmed(),
        session.kb_id.cyan().bold(),
        short_sha(&sha).dimmed()
    );
    for path in &listing.paths {
        let in_wiki = listing
            .manifest
            .as_ref()
            .is_some_and(|manifest| manifest.lists(path));
        let marker = if in_wiki { "*".green() } else { " ".normal() };
        match origin_badge(&listing.metadata, path) {
            Some(origin) => println!("{} {}  {}", marker, path, origin.dimmed()),
            None => println!("{} {}", marker, path),
        }
    }
    println!("\n{} document(s)", listing.paths.len());
    Ok(())
}

fn origin_badge(metadata: &MetadataMap, path: &str) -> Option<String> {
    metadata
        .get(path)
        .and_then(|entry| entry.origin.as_deref())
        .map(|origin| format!("[{}]", origin))
}

#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Maximum folder depth
    #[arg(short, long, default_value = "8")]
    pub depth: usize,
}

pub async fn run_tree(args: TreeArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(config_path, &args.snapshot.kb)?;
    let sha = session.snapshot(args.snapshot.snapshot.as_deref()).await?;
    let (listing, trees) = session.wiki.build_trees(&session.kb_id, &sha).await?;

    if args.snapshot.kb.format == OutputFormat::Json {
        return print_json(&trees);
    }

    println!(
        "{} {} @ {}",
        "📂".dimmed(),
        session.kb_id.cyan().bold(),
        short_sha(&sha).dimmed()
    );

    for (heading, folder) in [("Wiki", &trees.wiki), ("Other documents", &trees.other)] {
        if folder.is_empty() {
            continue;
        }
        println!("\n{}", heading.bold());
        let mut lines = Vec::new();
        render_folder(folder, "", args.depth, &mut lines);
        for line in lines {
            println!("{}", line);
        }
    }

    println!("\n{} document(s)", listing.paths.len());
    Ok(())
}

/// Box-drawing lines for a folder's files and subfolders, files first.
fn render_folder(folder: &DocFolder, indent: &str, depth: usize, out: &mut Vec<String>) {
    let total = folder.files.len() + folder.children.len();
    let mut index = 0;

    for file in &folder.files {
        index += 1;
        let branch = if index == total { "└── " } else { "├── " };
        out.push(format!("{}{}{}  {}", indent, branch, file.title, file.path.dimmed()));
    }

    for child in &folder.children {
        index += 1;
        let last = index == total;
        let branch = if last { "└── " } else { "├── " };
        let count = format!(" ({})", child.file_count()).dimmed();
        out.push(format!("{}{}{}/{}", indent, branch, child.label, count));

        if depth > 1 {
            let next = format!("{}{}", indent, if last { "    " } else { "│   " });
            render_folder(child, &next, depth - 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::MetadataEntry;
    use crate::core::tree::build_doc_trees;
    use std::collections::HashMap;

    #[test]
    fn test_render_folder_layout() {
        let paths: Vec<String> = ["index.md", "guides/setup.md", "guides/deep/more.md"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let trees = build_doc_trees(&paths, &HashMap::new(), &MetadataMap::new(), None);

        colored::control::set_override(false);
        let mut lines = Vec::new();
        render_folder(&trees.other, "", 8, &mut lines);

        assert_eq!(lines[0], "├── index.md  index.md");
        assert_eq!(lines[1], "└── Guides/ (2)");
        assert_eq!(lines[2], "    ├── setup.md  guides/setup.md");
        assert_eq!(lines[3], "    └── Deep/ (1)");
        assert_eq!(lines[4], "        └── more.md  guides/deep/more.md");
    }

    #[test]
    fn test_render_folder_depth_limit() {
        let paths = vec!["a/b/c.md".to_string()];
        let trees = build_doc_trees(&paths, &HashMap::new(), &MetadataMap::new(), None);

        colored::control::set_override(false);
        let mut lines = Vec::new();
        render_folder(&trees.other, "", 1, &mut lines);
        assert_eq!(lines, vec!["└── A/ (1)"]);
    }

    #[test]
    fn test_origin_badge() {
        let mut metadata = MetadataMap::new();
        metadata.insert(
            "a.md".into(),
            MetadataEntry {
                origin: Some("generated".into()),
                process_id: None,
            },
        );
        assert_eq!(origin_badge(&metadata, "a.md").as_deref(), Some("[generated]"));
        assert_eq!(origin_badge(&metadata, "b.md"), None);
    }
}
