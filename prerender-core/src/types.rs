//! Domain types shared by every prerender crate.
//!
//! A [`Slug`] is validated once at the edge (store rows, sitemap entries,
//! manual config) and is then safe to use both as a URL path segment and as
//! the stem of an artifact file name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SlugError;

// ---------------------------------------------------------------------------
// Slug
// ---------------------------------------------------------------------------

/// URL-safe identifier of one article.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate and wrap `raw`. Surrounding whitespace is trimmed.
    pub fn parse(raw: &str) -> Result<Self, SlugError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.contains('/') || s.contains('\\') {
            return Err(SlugError::PathSeparator(s.to_owned()));
        }
        if s == "." || s == ".." {
            return Err(SlugError::Relative(s.to_owned()));
        }
        if s.to_ascii_lowercase().ends_with(".html") {
            return Err(SlugError::HtmlSuffix(s.to_owned()));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(SlugError::InvalidCharacter(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the rendered artifact for this slug.
    pub fn artifact_file_name(&self) -> String {
        format!("{}.html", self.0)
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Slug> for String {
    fn from(s: Slug) -> Self {
        s.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Article records
// ---------------------------------------------------------------------------

/// Publication status of an article in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
    Processed,
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleStatus::Draft => write!(f, "draft"),
            ArticleStatus::Published => write!(f, "published"),
            ArticleStatus::Processed => write!(f, "processed"),
        }
    }
}

/// One article row as the content store reports it.
///
/// Rows are created outside this system; only `status` and
/// `static_html_generated` are ever written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub slug: Slug,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ArticleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_html_generated: Option<bool>,
}

impl ArticleRecord {
    /// A missing flag counts as "not generated".
    pub fn is_processed(&self) -> bool {
        self.static_html_generated == Some(true)
    }
}

// ---------------------------------------------------------------------------
// Work items
// ---------------------------------------------------------------------------

/// Where a work item was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Store,
    LegacySitemap,
    Manual,
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoverySource::Store => write!(f, "store"),
            DiscoverySource::LegacySitemap => write!(f, "legacy-sitemap"),
            DiscoverySource::Manual => write!(f, "manual"),
        }
    }
}

/// One slug scheduled for this batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub slug: Slug,
    /// First source the slug was seen in.
    pub source: DiscoverySource,
    /// True when the store listed this slug as unprocessed during this run.
    pub known_unprocessed: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
