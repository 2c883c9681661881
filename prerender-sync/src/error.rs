//! Error types for prerender-sync.

use std::path::PathBuf;

use thiserror::Error;

use prerender_browser::RenderError;
use prerender_core::ConfigError;
use prerender_sitemap::SitemapError;
use prerender_store::StoreError;

/// All errors that can arise from a batch run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The browser session could not be acquired; aborts the run.
    #[error("browser error: {0}")]
    Browser(#[from] RenderError),

    #[error("content store error: {0}")]
    Store(#[from] StoreError),

    #[error("sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    /// HTTP failure fetching a remote document (legacy sitemap, ping).
    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// Response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (hash store).
    #[error("hash store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn http_err(url: impl Into<String>, source: ureq::Error) -> SyncError {
    SyncError::Http {
        url: url.into(),
        source: Box::new(source),
    }
}
