//! # prerender-sitemap
//!
//! Tera-based sitemap builder plus slug extraction from a previously
//! published (legacy) sitemap.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use prerender_core::Slug;
//! use prerender_sitemap::SitemapBuilder;
//!
//! fn sitemap_for(slugs: &[Slug]) -> Result<String, prerender_sitemap::SitemapError> {
//!     let builder = SitemapBuilder::new("https://www.example.com", "articles")?;
//!     builder.build(slugs)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod legacy;

pub use context::{ChangeFreq, SitemapEntry, SITEMAP_NS};
pub use engine::SitemapBuilder;
pub use error::SitemapError;
pub use legacy::{extract_slugs, slug_from_loc};
