//! # prerender-store
//!
//! Content store client: which articles still need a static artifact, which
//! ones are published and processed, and flipping the processed flag.
//!
//! The orchestrator only sees the [`ContentStore`] trait, so tests swap in an
//! in-memory store and production uses [`RestStore`].

pub mod error;
pub mod rest;

pub use error::StoreError;
pub use rest::RestStore;

use prerender_core::Slug;

/// Read/update access to article records.
///
/// The fetch methods never fail from the caller's point of view: any query
/// error is logged by the implementation and reported as an empty list, so
/// discovery can always continue.
pub trait ContentStore {
    /// Slugs whose static artifact has not been generated, newest first.
    fn fetch_unprocessed(&self) -> Vec<Slug>;

    /// Published slugs whose static artifact has been generated.
    fn fetch_processed(&self) -> Vec<Slug>;

    /// Set `status = processed` and `static_html_generated = true`.
    fn mark_processed(&self, slug: &Slug) -> Result<(), StoreError>;
}

impl<T: ContentStore + ?Sized> ContentStore for &T {
    fn fetch_unprocessed(&self) -> Vec<Slug> {
        (**self).fetch_unprocessed()
    }

    fn fetch_processed(&self) -> Vec<Slug> {
        (**self).fetch_processed()
    }

    fn mark_processed(&self, slug: &Slug) -> Result<(), StoreError> {
        (**self).mark_processed(slug)
    }
}
