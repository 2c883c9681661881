//! Work-list discovery: store, then legacy sitemap, then manual slugs.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use prerender_core::{Config, DiscoverySource, Slug, WorkItem};
use prerender_sitemap::extract_slugs;
use prerender_store::ContentStore;

use crate::error::{http_err, io_err, SyncError};

/// Deduplicated work list for one run plus per-source counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub items: Vec<WorkItem>,
    pub from_store: usize,
    pub from_legacy: usize,
    pub from_manual: usize,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn slugs(&self) -> impl Iterator<Item = &Slug> {
        self.items.iter().map(|item| &item.slug)
    }
}

/// Merge the sources in order, keeping the first occurrence of each slug.
pub fn merge(store: Vec<Slug>, legacy: Vec<Slug>, manual: Vec<Slug>) -> Discovery {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    let tagged = [
        (DiscoverySource::Store, &store),
        (DiscoverySource::LegacySitemap, &legacy),
        (DiscoverySource::Manual, &manual),
    ];
    for (source, slugs) in tagged {
        for slug in slugs.iter() {
            if seen.insert(slug.clone()) {
                items.push(WorkItem {
                    slug: slug.clone(),
                    source,
                    known_unprocessed: false,
                });
            }
        }
    }

    // A slug first seen elsewhere is still known unprocessed if the store listed it.
    let unprocessed: HashSet<&Slug> = store.iter().collect();
    for item in &mut items {
        item.known_unprocessed = unprocessed.contains(&item.slug);
    }

    Discovery {
        items,
        from_store: store.len(),
        from_legacy: legacy.len(),
        from_manual: manual.len(),
    }
}

/// Run the Discover phase. Only an invalid manual slug list is an error.
pub fn discover(config: &Config, store: &dyn ContentStore) -> Result<Discovery, SyncError> {
    let manual = config.manual_slugs()?;

    let from_store = if config.sources.store {
        store.fetch_unprocessed()
    } else {
        Vec::new()
    };

    let from_legacy = match config.legacy_sitemap_url() {
        Some(url) => legacy_slugs(url, &config.articles_path, config.store.timeout_secs),
        None => Vec::new(),
    };

    let discovery = merge(from_store, from_legacy, manual);
    info!(
        total = discovery.len(),
        store = discovery.from_store,
        legacy = discovery.from_legacy,
        manual = discovery.from_manual,
        "discovery complete"
    );
    Ok(discovery)
}

/// Slugs from the legacy sitemap; every failure degrades to an empty list.
pub fn legacy_slugs(url: &str, articles_path: &str, timeout_secs: u64) -> Vec<Slug> {
    let result = fetch_document(url, timeout_secs)
        .and_then(|xml| extract_slugs(&xml, articles_path).map_err(SyncError::from));
    match result {
        Ok(slugs) => {
            info!(url = %url, count = slugs.len(), "legacy sitemap slugs");
            slugs
        }
        Err(e) => {
            warn!(url = %url, "legacy sitemap unavailable: {e}");
            Vec::new()
        }
    }
}

/// GET an `http(s)` URL or read a `file://` URL.
pub fn fetch_document(url: &str, timeout_secs: u64) -> Result<String, SyncError> {
    if let Some(path) = url::Url::parse(url)
        .ok()
        .filter(|u| u.scheme() == "file")
        .and_then(|u| u.to_file_path().ok())
    {
        return std::fs::read_to_string(&path).map_err(|e| io_err(path, e));
    }

    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build();
    let response = agent.get(url).call().map_err(|e| http_err(url, e))?;
    response.into_string().map_err(|source| SyncError::Body {
        url: url.to_string(),
        source,
    })
}
