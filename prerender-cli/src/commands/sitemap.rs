//! `prerender sitemap`: rebuild the sitemap only.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use prerender_sync::{
    pipeline, submit_sitemap, PingOutcome, PingResult, SitemapOutcome, WriteResult,
};

use super::{load_config, open_store};

/// Arguments for `prerender sitemap`.
#[derive(Args, Debug)]
pub struct SitemapArgs {
    /// Show what would be written without touching the file.
    #[arg(long)]
    pub dry_run: bool,
}

impl SitemapArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        let store = open_store(&config)?;

        let outcome = pipeline::rebuild_sitemap(&config, &store, self.dry_run);
        print_sitemap(&outcome, self.dry_run);

        if config.ping.enabled
            && matches!(
                outcome,
                SitemapOutcome::Written {
                    result: WriteResult::Written { .. },
                    ..
                }
            )
        {
            print_pings(&submit_sitemap(&config));
        }
        Ok(())
    }
}

pub fn print_sitemap(outcome: &SitemapOutcome, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    match outcome {
        SitemapOutcome::Written { result, entries } => {
            let (mark, verb) = match result {
                WriteResult::Written { .. } => ("✓".green().bold(), "written"),
                WriteResult::Unchanged { .. } => ("·".bright_black().bold(), "unchanged"),
                WriteResult::WouldWrite { .. } => ("~".cyan().bold(), "would be written"),
            };
            println!(
                "{prefix}{mark} sitemap {verb}: {} ({entries} entries)",
                result.path().display()
            );
        }
        SitemapOutcome::SkippedEmpty => println!(
            "{prefix}{} sitemap kept: store returned no processed articles",
            "⚠".yellow().bold()
        ),
        SitemapOutcome::Failed(e) => {
            println!("{prefix}{} sitemap not updated: {}", "✗".red().bold(), e.red())
        }
    }
}

pub fn print_pings(pings: &[PingOutcome]) {
    for ping in pings {
        let mark = match ping.result {
            PingResult::Success { .. } => "✓".green().bold(),
            PingResult::Failed { .. } => "✗".red().bold(),
            PingResult::Error { .. } => "✗".red().bold(),
        };
        println!("{mark} ping {}: {}", ping.endpoint, ping.result);
    }
}
