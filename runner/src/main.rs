//! Tithe Farm control loop tooling.
//!
//! The loop itself runs inside a game client that implements
//! [`tithe::io::environment::Environment`]. This binary manages its config
//! file and inspects the pieces that do not need a live client: config
//! validation, the behavior tree and the patch layout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use tithe::core::layout::{DEFAULT_PATCHES, patch_tiles};
use tithe::core::types::Tile;
use tithe::exit_codes;
use tithe::farm::build_tree;
use tithe::io::config::{BotConfig, CONFIG_FILE, load_config, write_config};
use tithe::io::environment::Environment;
use tithe::logging;
use tithe::tree::{Node, Tree};

#[derive(Parser)]
#[command(name = "tithe", version, about = "Tithe Farm behavior-tree control loop")]
struct Cli {
    /// Config file path.
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file if missing.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Check the config and the behavior tree built from it.
    Validate,
    /// Print the behavior tree.
    Tree,
    /// Print the patch tiles for a grid corner as JSON.
    Layout {
        #[arg(long, allow_hyphen_values = true)]
        x: i32,
        #[arg(long, allow_hyphen_values = true)]
        y: i32,
        /// Working-set size; clamped to 1..=20.
        #[arg(long, default_value_t = DEFAULT_PATCHES)]
        patches: usize,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Validate => cmd_validate(&cli.config),
        Command::Tree => cmd_tree(&cli.config),
        Command::Layout { x, y, patches } => cmd_layout(x, y, patches),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        println!("{} already exists", path.display());
        return Ok(());
    }
    write_config(path, &BotConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn load_tree(path: &Path) -> Result<(BotConfig, Tree<dyn Environment>)> {
    let config = load_config(path)?;
    let tree = build_tree::<dyn Environment>(&config.farm_settings()).context("build farm tree")?;
    Ok((config, tree))
}

fn cmd_validate(path: &Path) -> Result<()> {
    let (config, _) = load_tree(path)?;
    println!(
        "ok: {} patches, {:?} seeds",
        config.patch_count(),
        config.seed
    );
    Ok(())
}

fn cmd_tree(path: &Path) -> Result<()> {
    let (_, tree) = load_tree(path)?;
    let mut lines = Vec::new();
    render(tree.root(), 0, &mut lines);
    println!("{}", lines.join("\n"));
    Ok(())
}

fn render(node: &Node<dyn Environment>, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}{}", "  ".repeat(depth), node.name()));
    for child in node.children() {
        render(child, depth + 1, lines);
    }
}

#[derive(Serialize)]
struct LayoutEntry {
    index: usize,
    #[serde(flatten)]
    tile: Tile,
}

fn cmd_layout(x: i32, y: i32, patches: usize) -> Result<()> {
    let entries: Vec<LayoutEntry> = patch_tiles(Tile::new(x, y, 0), patches)
        .into_iter()
        .enumerate()
        .map(|(index, tile)| LayoutEntry { index, tile })
        .collect();
    let payload = serde_json::to_string_pretty(&entries).context("serialize layout")?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_renders_indented_names() {
        let tree = build_tree::<dyn Environment>(&BotConfig::default().farm_settings())
            .expect("tree");
        let mut lines = Vec::new();
        render(tree.root(), 0, &mut lines);
        assert_eq!(lines[0], "root");
        assert!(lines.contains(&"    plant".to_string()));
        assert_eq!(lines.len(), 15);
    }
}
