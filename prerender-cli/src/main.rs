//! Prerender: static HTML snapshots of client-rendered articles.
//!
//! # Usage
//!
//! ```text
//! prerender [--config <path>]                      # same as `prerender run`
//! prerender run [--incremental | --full] [--dry-run]
//! prerender discover [--json]
//! prerender sitemap [--dry-run]
//! prerender submit
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    discover::DiscoverArgs, run::RunArgs, sitemap::SitemapArgs, submit::SubmitArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "prerender",
    version,
    about = "Pre-render article pages to static HTML and rebuild the sitemap",
    long_about = None,
)]
struct Cli {
    /// Config file (default: ./prerender.yaml, then the user config dir).
    #[arg(long, global = true, env = "PRERENDER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every discovered article, mark it processed, rebuild the sitemap.
    Run(RunArgs),

    /// List the work a run would process, and where each slug came from.
    Discover(DiscoverArgs),

    /// Rebuild the sitemap from the store's processed articles.
    Sitemap(SitemapArgs),

    /// Announce the public sitemap URL to the configured ping endpoints.
    Submit(SubmitArgs),
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.config.as_deref();
    match cli.command {
        None => RunArgs::default().run(config),
        Some(Commands::Run(args)) => args.run(config),
        Some(Commands::Discover(args)) => args.run(config),
        Some(Commands::Sitemap(args)) => args.run(config),
        Some(Commands::Submit(args)) => args.run(config),
    }
}
