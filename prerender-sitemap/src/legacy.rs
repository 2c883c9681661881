//! Slug extraction from a previously published sitemap.
//!
//! Only `<loc>` values whose path has an articles segment followed by at
//! least one more segment are kept; the slug is the last non-empty segment,
//! percent-decoded.

use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use prerender_core::Slug;

use crate::context::SITEMAP_NS;
use crate::error::SitemapError;

fn urlset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(?:([A-Za-z_][\w.-]*):)?urlset\b([^>]*)>").unwrap())
}

fn cdata_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap())
}

fn unescape_xml(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Every `<loc>` slug in `xml`, in document order.
///
/// Fails with [`SitemapError::NotASitemap`] when the root is not a
/// `urlset` in the sitemap 0.9 namespace (a sitemap index, an HTML error
/// page, ...).
pub fn extract_slugs(xml: &str, articles_path: &str) -> Result<Vec<Slug>, SitemapError> {
    let caps = urlset_re()
        .captures(xml)
        .ok_or_else(|| SitemapError::NotASitemap("no <urlset> element".to_string()))?;
    let attrs = caps.get(2).map_or("", |m| m.as_str());
    if !attrs.contains(SITEMAP_NS) {
        return Err(SitemapError::NotASitemap(format!(
            "<urlset> is not in the {SITEMAP_NS} namespace"
        )));
    }

    // Only the urlset's own <loc>; extension elements such as <image:loc>
    // carry another prefix.
    let prefix = caps
        .get(1)
        .map(|m| format!("{}:", regex::escape(m.as_str())))
        .unwrap_or_default();
    let loc_re = Regex::new(&format!(r"(?s)<{prefix}loc>(.*?)</{prefix}loc>"))
        .map_err(|e| SitemapError::NotASitemap(format!("bad element prefix: {e}")))?;

    let mut slugs = Vec::new();
    let mut skipped = 0usize;
    for cap in loc_re.captures_iter(xml) {
        let raw = cap.get(1).map_or("", |m| m.as_str());
        let raw = cdata_re().replace_all(raw, "$1");
        let loc = unescape_xml(raw.trim());
        match slug_from_loc(&loc, articles_path) {
            Some(slug) => slugs.push(slug),
            None => skipped += 1,
        }
    }
    debug!(found = slugs.len(), skipped, "legacy sitemap parsed");
    Ok(slugs)
}

/// The article slug of one sitemap location, if it names an article.
pub fn slug_from_loc(loc: &str, articles_path: &str) -> Option<Slug> {
    let path = match Url::parse(loc) {
        Ok(url) => url.path().to_string(),
        Err(_) if loc.starts_with('/') => loc.to_string(),
        Err(_) => return None,
    };

    let marker: Vec<&str> = articles_path.split('/').filter(|s| !s.is_empty()).collect();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if marker.is_empty() || segments.len() <= marker.len() {
        return None;
    }

    let last = segments.len() - 1;
    let has_marker = (0..last)
        .filter(|&i| i + marker.len() <= last)
        .any(|i| segments[i..i + marker.len()] == marker[..]);
    if !has_marker {
        return None;
    }

    let decoded = match percent_decode_str(segments[last]).decode_utf8() {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(loc = %loc, "skipping sitemap entry: {e}");
            return None;
        }
    };
    match Slug::parse(&decoded) {
        Ok(slug) => Some(slug),
        Err(e) => {
            warn!(loc = %loc, "skipping sitemap entry: {e}");
            None
        }
    }
}
