//! `prerender submit`: ping search engines with the public sitemap URL.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use prerender_sync::submit_sitemap;

use super::{load_config, sitemap::print_pings};

/// Arguments for `prerender submit`.
#[derive(Args, Debug)]
pub struct SubmitArgs {}

impl SubmitArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        if config.ping.endpoints.is_empty() {
            println!("No ping endpoints configured.");
            return Ok(());
        }
        println!("Submitting {}", config.public_sitemap_url());
        print_pings(&submit_sitemap(&config));
        Ok(())
    }
}
