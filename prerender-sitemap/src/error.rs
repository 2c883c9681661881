//! Error types for prerender-sitemap.

use thiserror::Error;

/// All errors that can arise from building or reading sitemaps.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Template(#[from] tera::Error),

    #[error("invalid base URL '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The legacy document is not a `urlset` in the sitemap namespace.
    #[error("not a sitemap document: {0}")]
    NotASitemap(String),
}
