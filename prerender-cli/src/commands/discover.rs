//! `prerender discover`: show the work list without rendering.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use prerender_sync::{discover, Discovery};

use super::{load_config, open_store};

/// Arguments for `prerender discover`.
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct DiscoverRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "slug")]
    slug: String,
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "store")]
    store: String,
}

impl DiscoverArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        let store = open_store(&config)?;
        let discovery = discover(&config, &store).context("discovery failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&discovery.items)
                    .context("failed to serialize work list")?
            );
            return Ok(());
        }

        print_table(&discovery);
        Ok(())
    }
}

fn print_table(discovery: &Discovery) {
    println!(
        "{} articles to render | store {} | legacy sitemap {} | manual {}",
        discovery.len(),
        discovery.from_store,
        discovery.from_legacy,
        discovery.from_manual,
    );
    if discovery.is_empty() {
        println!("✨ No unprocessed articles found. Everything is up to date!");
        return;
    }

    let rows: Vec<DiscoverRow> = discovery
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| DiscoverRow {
            index: i + 1,
            slug: item.slug.to_string(),
            source: item.source.to_string(),
            store: if item.known_unprocessed {
                "unprocessed".yellow().to_string()
            } else {
                "-".bright_black().to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
