pub mod discover;
pub mod run;
pub mod sitemap;
pub mod submit;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use prerender_core::{config, Config};
use prerender_store::RestStore;

/// Resolve, load, override from env, validate.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = config::load(explicit).context("failed to load configuration")?;
    debug!(
        site_url = %config.site_url,
        public_url = %config.public_url(),
        "configuration loaded"
    );
    Ok(config)
}

pub fn open_store(config: &Config) -> Result<RestStore> {
    RestStore::new(&config.store).context("invalid content store configuration")
}
