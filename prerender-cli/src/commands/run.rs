//! `prerender run`: the full batch.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::{error, info};

use prerender_browser::WebDriverSession;
use prerender_sync::{
    pipeline, ItemOutcome, ItemStatus, MarkStatus, RunOptions, RunSummary, WriteResult,
};

use super::{load_config, open_store, sitemap::print_pings, sitemap::print_sitemap};

/// Arguments for `prerender run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Skip articles whose HTML file already exists.
    #[arg(long, conflicts_with = "full")]
    pub incremental: bool,

    /// Re-render every article even if the config enables incremental mode.
    #[arg(long)]
    pub full: bool,

    /// Render without writing files or updating the store.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    fn options(&self, config_incremental: bool) -> RunOptions {
        let incremental = if self.full {
            false
        } else {
            self.incremental || config_incremental
        };
        RunOptions {
            dry_run: self.dry_run,
            incremental,
        }
    }

    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        let store = open_store(&config)?;
        let options = self.options(config.incremental);
        info!(
            incremental = options.incremental,
            dry_run = options.dry_run,
            "starting batch"
        );

        let summary = pipeline::run(
            &config,
            &store,
            || WebDriverSession::start(&config.browser),
            options,
        )
        .map_err(|e| {
            error!("batch aborted before rendering: {e}");
            e
        })
        .context("batch run aborted")?;

        print_summary(&summary, self.dry_run);
        Ok(())
    }
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if summary.outcomes.is_empty() {
        println!("{prefix}✨ No unprocessed articles found. Everything is up to date!");
    }
    for outcome in &summary.outcomes {
        println!("{prefix}{}", item_line(outcome));
    }

    print_sitemap(&summary.sitemap, dry_run);
    print_pings(&summary.pings);

    println!();
    println!("{prefix}✨ Batch generation complete.");
    println!("   Processed: {} articles", summary.processed);
    println!("   Failed: {} articles", summary.failed);
    if summary.skipped > 0 {
        println!("   Skipped (already rendered): {}", summary.skipped);
    }
    if summary.mark_failures > 0 {
        println!(
            "   {}",
            format!("Store updates failed: {}", summary.mark_failures).yellow()
        );
    }
}

fn item_line(outcome: &ItemOutcome) -> String {
    let slug = outcome.item.slug.as_str();
    match &outcome.status {
        ItemStatus::Rendered { title, write, mark } => {
            let action = match write {
                WriteResult::Written { path } => format!("wrote {}", path.display()),
                WriteResult::Unchanged { path } => format!("unchanged {}", path.display()),
                WriteResult::WouldWrite { path } => format!("would write {}", path.display()),
            };
            format!(
                "{} {slug}  {action}  {}{}",
                "✓".green().bold(),
                format!("\"{title}\"").bright_black(),
                mark_note(mark)
            )
        }
        ItemStatus::Skipped { mark } => format!(
            "{} {slug}  skipped (artifact exists){}",
            "·".bright_black().bold(),
            mark_note(mark)
        ),
        ItemStatus::Failed { error } => {
            format!("{} {slug}  {}", "✗".red().bold(), error.red())
        }
    }
}

fn mark_note(mark: &MarkStatus) -> String {
    match mark {
        MarkStatus::Failed(e) => format!("  {}", format!("(store not updated: {e})").yellow()),
        MarkStatus::Marked | MarkStatus::NotNeeded | MarkStatus::DryRun => String::new(),
    }
}
