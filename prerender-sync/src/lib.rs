//! # prerender-sync
//!
//! Batch orchestration: discover the work list, render each slug through one
//! browser session, write artifacts with hash-gated atomic writes, flip the
//! processed flag, and rebuild the sitemap from the store's processed list.
//!
//! Call [`pipeline::run`] for a full batch or [`pipeline::rebuild_sitemap`]
//! to refresh the sitemap alone.

pub mod discover;
pub mod error;
pub mod hash_store;
pub mod ping;
pub mod pipeline;
pub mod writer;

pub use discover::{discover, Discovery};
pub use error::SyncError;
pub use ping::{submit_sitemap, PingOutcome, PingResult};
pub use pipeline::{
    rebuild_sitemap, run, ItemOutcome, ItemStatus, MarkStatus, RunOptions, RunSummary,
    SitemapOutcome,
};
pub use writer::WriteResult;
