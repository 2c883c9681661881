//! Prerender core library: domain types, configuration, errors.
//!
//! - [`types`]: slugs, article records, work items
//! - [`config`]: the immutable [`Config`] value and its loader
//! - [`error`]: [`ConfigError`] and [`SlugError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    BrowserConfig, Config, LegacySitemapConfig, OutputConfig, PingConfig, SourcesConfig,
    StoreConfig,
};
pub use error::{ConfigError, SlugError};
pub use types::{ArticleRecord, ArticleStatus, DiscoverySource, Slug, WorkItem};
