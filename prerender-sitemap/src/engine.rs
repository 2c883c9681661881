//! Tera sitemap engine: [`SitemapBuilder`].
//!
//! Output layout:
//!
//! | Entry      | `loc`                               | lastmod | changefreq | priority |
//! |------------|-------------------------------------|---------|------------|----------|
//! | Homepage   | `<public_url>/`                     | none    | daily      | 1.0      |
//! | Article    | `<public_url>/<articles_path>/<slug>` | today | weekly     | 0.8      |

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use tera::{Context, Tera, Value};
use tracing::debug;
use url::Url;

use prerender_core::{Config, Slug};

use crate::context::{ChangeFreq, SitemapContext, SitemapEntry};
use crate::error::SitemapError;

const TEMPLATE_NAME: &str = "sitemap.xml.tera";
const TEMPLATE: &str = include_str!("templates/sitemap.xml.tera");

const HOME_PRIORITY: f32 = 1.0;
const ARTICLE_PRIORITY: f32 = 0.8;

/// Escape the five XML special characters.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

fn xml_escape_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("xml_escape", "value", String, value);
    Ok(Value::String(escape_xml(&s)))
}

/// Builds the public sitemap for the homepage plus a set of processed slugs.
pub struct SitemapBuilder {
    tera: Tera,
    base: Url,
    articles_path: String,
}

impl SitemapBuilder {
    /// `public_url` is the origin articles are published under;
    /// `articles_path` the path segment(s) between it and the slug.
    pub fn new(public_url: &str, articles_path: &str) -> Result<Self, SitemapError> {
        let trimmed = public_url.trim().trim_end_matches('/');
        let base = Url::parse(trimmed).map_err(|source| SitemapError::BaseUrl {
            url: public_url.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(SitemapError::BaseUrl {
                url: public_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        let mut tera = Tera::default();
        // Escaping is explicit through `xml_escape`; Tera's HTML escaping
        // would also rewrite `/`.
        tera.autoescape_on(vec![]);
        tera.register_filter("xml_escape", xml_escape_filter);
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;

        Ok(Self {
            tera,
            base,
            articles_path: articles_path.trim_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SitemapError> {
        Self::new(config.public_url(), &config.articles_path)
    }

    pub fn home_url(&self) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("");
        }
        url.to_string()
    }

    pub fn article_url(&self, slug: &Slug) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for part in self.articles_path.split('/').filter(|p| !p.is_empty()) {
                segments.push(part);
            }
            segments.push(slug.as_str());
        }
        url.to_string()
    }

    /// Homepage first, then one entry per slug in the given order.
    pub fn entries(&self, slugs: &[Slug], today: NaiveDate) -> Vec<SitemapEntry> {
        let mut entries = Vec::with_capacity(slugs.len() + 1);
        entries.push(SitemapEntry {
            loc: self.home_url(),
            lastmod: None,
            changefreq: ChangeFreq::Daily,
            priority: HOME_PRIORITY,
        });
        entries.extend(slugs.iter().map(|slug| SitemapEntry {
            loc: self.article_url(slug),
            lastmod: Some(today),
            changefreq: ChangeFreq::Weekly,
            priority: ARTICLE_PRIORITY,
        }));
        entries
    }

    pub fn render(&self, entries: &[SitemapEntry]) -> Result<String, SitemapError> {
        let ctx = Context::from_serialize(SitemapContext::from_entries(entries))?;
        let mut xml = self.tera.render(TEMPLATE_NAME, &ctx)?;
        if !xml.ends_with('\n') {
            xml.push('\n');
        }
        debug!(entries = entries.len(), bytes = xml.len(), "sitemap rendered");
        Ok(xml)
    }

    /// Render the sitemap dated `today`.
    pub fn build_on(&self, slugs: &[Slug], today: NaiveDate) -> Result<String, SitemapError> {
        self.render(&self.entries(slugs, today))
    }

    /// Render the sitemap dated with the local calendar day.
    pub fn build(&self, slugs: &[Slug]) -> Result<String, SitemapError> {
        self.build_on(slugs, Local::now().date_naive())
    }
}
