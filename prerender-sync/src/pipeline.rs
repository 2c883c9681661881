//! Batch pipeline shared by `prerender run` and `prerender sitemap`.
//!
//! `Discover → (Render → Write → MarkProcessed)* → RebuildSitemap → Ping`

use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};

use prerender_browser::{Browser, PageRenderer, RenderError};
use prerender_core::{Config, Slug, WorkItem};
use prerender_sitemap::SitemapBuilder;
use prerender_store::ContentStore;

use crate::discover::{self, Discovery};
use crate::error::SyncError;
use crate::hash_store::{self, HashStoreFile};
use crate::ping::{self, PingOutcome};
use crate::writer::{self, WriteResult};

/// Per-run switches layered over the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Render but never write files or update the store.
    pub dry_run: bool,
    /// Skip slugs whose artifact already exists.
    pub incremental: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dry_run: false,
            incremental: config.incremental,
        }
    }
}

/// What happened to the store record of a handled slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkStatus {
    Marked,
    /// The store did not list the slug as unprocessed; no update sent.
    NotNeeded,
    Failed(String),
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Rendered {
        /// Text of the ready element.
        title: String,
        write: WriteResult,
        mark: MarkStatus,
    },
    /// Incremental mode found an existing artifact.
    Skipped { mark: MarkStatus },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub item: WorkItem,
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self.status, ItemStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapOutcome {
    Written { result: WriteResult, entries: usize },
    /// The store returned no processed articles; the previous file is kept.
    SkippedEmpty,
    Failed(String),
}

/// Result of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Rendered plus skipped items.
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub mark_failures: usize,
    pub sitemap: SitemapOutcome,
    pub pings: Vec<PingOutcome>,
    pub outcomes: Vec<ItemOutcome>,
}

/// Run the full batch.
///
/// `launch` is only called when at least one slug has to be rendered; its
/// failure aborts the run before any slug is handled. Every other failure is
/// recorded in the summary and the run continues.
pub fn run<B, L>(
    config: &Config,
    store: &dyn ContentStore,
    launch: L,
    options: RunOptions,
) -> Result<RunSummary, SyncError>
where
    B: Browser,
    L: FnOnce() -> Result<B, RenderError>,
{
    let started_at = Utc::now();
    let discovery = discover::discover(config, store)?;
    let artifacts_dir = config.output.artifacts_dir.as_path();

    let outcomes = if discovery.is_empty() {
        info!("no unprocessed articles found; rebuilding sitemap only");
        Vec::new()
    } else {
        let mut hashes = load_hashes(artifacts_dir);
        let outcomes = process_items(config, store, launch, &discovery, &mut hashes, options)?;
        if !options.dry_run && outcomes.iter().any(wrote_file) {
            hashes.synced_at = started_at;
            if let Err(e) = hash_store::save_at(artifacts_dir, &hashes) {
                warn!("could not save artifact hashes: {e}");
            }
        }
        outcomes
    };

    let sitemap = rebuild_sitemap(config, store, options.dry_run);
    let pings = match &sitemap {
        SitemapOutcome::Written {
            result: WriteResult::Written { .. },
            ..
        } if config.ping.enabled => ping::submit_sitemap(config),
        _ => Vec::new(),
    };

    let summary = summarize(outcomes, sitemap, pings);
    info!(
        processed = summary.processed,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch complete"
    );
    Ok(summary)
}

fn load_hashes(artifacts_dir: &Path) -> HashStoreFile {
    hash_store::load_at(artifacts_dir).unwrap_or_else(|e| {
        warn!("ignoring unreadable artifact hashes: {e}");
        HashStoreFile::default()
    })
}

fn wrote_file(outcome: &ItemOutcome) -> bool {
    matches!(
        outcome.status,
        ItemStatus::Rendered {
            write: WriteResult::Written { .. },
            ..
        }
    )
}

fn skip_existing(options: RunOptions, artifacts_dir: &Path, slug: &Slug) -> bool {
    options.incremental && writer::artifact_path(artifacts_dir, slug).exists()
}

fn process_items<B, L>(
    config: &Config,
    store: &dyn ContentStore,
    launch: L,
    discovery: &Discovery,
    hashes: &mut HashStoreFile,
    options: RunOptions,
) -> Result<Vec<ItemOutcome>, SyncError>
where
    B: Browser,
    L: FnOnce() -> Result<B, RenderError>,
{
    let artifacts_dir = config.output.artifacts_dir.as_path();
    let needs_browser = discovery
        .slugs()
        .any(|slug| !skip_existing(options, artifacts_dir, slug));

    let mut renderer = if needs_browser {
        info!(count = discovery.len(), "starting browser");
        Some(PageRenderer::new(launch()?, config))
    } else {
        None
    };

    let mut outcomes = Vec::with_capacity(discovery.len());
    for item in &discovery.items {
        let status = match renderer.as_mut() {
            Some(renderer) if !skip_existing(options, artifacts_dir, &item.slug) => {
                render_item(renderer, store, item, &mut hashes.files, artifacts_dir, options)
            }
            _ => {
                info!(slug = %item.slug, "artifact exists; skipping");
                ItemStatus::Skipped {
                    mark: mark(store, item, options.dry_run),
                }
            }
        };
        outcomes.push(ItemOutcome {
            item: item.clone(),
            status,
        });
    }

    if let Some(renderer) = renderer {
        if let Err(e) = renderer.quit() {
            warn!("browser did not shut down cleanly: {e}");
        }
    }
    Ok(outcomes)
}

fn render_item<B: Browser>(
    renderer: &mut PageRenderer<B>,
    store: &dyn ContentStore,
    item: &WorkItem,
    hashes: &mut hash_store::HashStore,
    artifacts_dir: &Path,
    options: RunOptions,
) -> ItemStatus {
    let page = match renderer.render(&item.slug) {
        Ok(page) => page,
        Err(e) => {
            return ItemStatus::Failed {
                error: e.to_string(),
            }
        }
    };
    info!(slug = %item.slug, title = %page.title, "rendered");

    let write = match writer::write_artifact(
        artifacts_dir,
        &item.slug,
        &page.html,
        hashes,
        options.dry_run,
    ) {
        Ok(write) => write,
        Err(e) => {
            warn!(slug = %item.slug, "could not write artifact: {e}");
            return ItemStatus::Failed {
                error: e.to_string(),
            };
        }
    };

    let mark = if options.dry_run {
        MarkStatus::DryRun
    } else {
        match store.mark_processed(&item.slug) {
            Ok(()) => MarkStatus::Marked,
            Err(e) => {
                warn!(slug = %item.slug, "could not mark processed: {e}");
                MarkStatus::Failed(e.to_string())
            }
        }
    };
    ItemStatus::Rendered {
        title: page.title,
        write,
        mark,
    }
}

/// Store update for a skipped slug: only when the store still lists it.
fn mark(store: &dyn ContentStore, item: &WorkItem, dry_run: bool) -> MarkStatus {
    if !item.known_unprocessed {
        return MarkStatus::NotNeeded;
    }
    if dry_run {
        return MarkStatus::DryRun;
    }
    match store.mark_processed(&item.slug) {
        Ok(()) => MarkStatus::Marked,
        Err(e) => {
            warn!(slug = %item.slug, "could not mark processed: {e}");
            MarkStatus::Failed(e.to_string())
        }
    }
}

fn summarize(
    outcomes: Vec<ItemOutcome>,
    sitemap: SitemapOutcome,
    pings: Vec<PingOutcome>,
) -> RunSummary {
    let mut summary = RunSummary {
        processed: 0,
        failed: 0,
        skipped: 0,
        mark_failures: 0,
        sitemap,
        pings,
        outcomes: Vec::new(),
    };
    for outcome in &outcomes {
        match &outcome.status {
            ItemStatus::Rendered { mark, .. } | ItemStatus::Skipped { mark } => {
                summary.processed += 1;
                if matches!(outcome.status, ItemStatus::Skipped { .. }) {
                    summary.skipped += 1;
                }
                if matches!(mark, MarkStatus::Failed(_)) {
                    summary.mark_failures += 1;
                }
            }
            ItemStatus::Failed { .. } => summary.failed += 1,
        }
    }
    summary.outcomes = outcomes;
    summary
}

/// Rebuild the sitemap from the store's processed list.
///
/// An empty list keeps the previous file. Never fails; failures are logged
/// and reported.
pub fn rebuild_sitemap(config: &Config, store: &dyn ContentStore, dry_run: bool) -> SitemapOutcome {
    let processed = store.fetch_processed();
    if processed.is_empty() {
        warn!("store returned no processed articles; keeping the existing sitemap");
        return SitemapOutcome::SkippedEmpty;
    }

    let built = SitemapBuilder::from_config(config).and_then(|b| b.build(&processed));
    let xml = match built {
        Ok(xml) => xml,
        Err(e) => {
            warn!("could not build sitemap: {e}");
            return SitemapOutcome::Failed(e.to_string());
        }
    };

    match writer::write_sitemap(&config.output.sitemap_path, &xml, dry_run) {
        Ok(result) => SitemapOutcome::Written {
            result,
            entries: processed.len() + 1,
        },
        Err(e) => {
            warn!("could not write sitemap: {e}");
            SitemapOutcome::Failed(e.to_string())
        }
    }
}
