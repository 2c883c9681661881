//! Sitemap entries and the serializable payload handed to Tera.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// XML namespace of the sitemap protocol.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    /// `None` omits the `<lastmod>` element.
    pub lastmod: Option<NaiveDate>,
    pub changefreq: ChangeFreq,
    /// 0.0 ..= 1.0
    pub priority: f32,
}

/// Rendering payload. Values are preformatted so the template stays dumb.
#[derive(Debug, Serialize)]
pub(crate) struct SitemapContext {
    pub namespace: &'static str,
    pub urls: Vec<UrlCtx>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UrlCtx {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: String,
}

impl SitemapContext {
    pub(crate) fn from_entries(entries: &[SitemapEntry]) -> Self {
        let urls = entries
            .iter()
            .map(|e| UrlCtx {
                loc: e.loc.clone(),
                lastmod: e.lastmod.map(|d| d.format("%Y-%m-%d").to_string()),
                changefreq: e.changefreq.as_str(),
                priority: format!("{:.1}", e.priority.clamp(0.0, 1.0)),
            })
            .collect();
        Self {
            namespace: SITEMAP_NS,
            urls,
        }
    }
}
