//! Per-slug render policy: navigate, wait for the ready element, settle,
//! capture.

use std::thread::sleep;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use prerender_core::{Config, Slug};

use crate::browser::Browser;
use crate::error::RenderError;

/// Characters of partial page source logged with a failure.
pub const EXCERPT_CHARS: usize = 500;

/// Markup captured for one slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub slug: Slug,
    pub url: String,
    /// Text of the ready element (the article heading).
    pub title: String,
    pub html: String,
}

/// Owns the batch's single browser and renders slugs through it.
pub struct PageRenderer<B> {
    browser: B,
    site_url: String,
    path_prefix: String,
    ready_selector: String,
    ready_timeout: Duration,
    settle: Duration,
}

impl<B: Browser> PageRenderer<B> {
    pub fn new(browser: B, config: &Config) -> Self {
        Self {
            browser,
            site_url: config.site_url.clone(),
            path_prefix: config.render_path_prefix.clone(),
            ready_selector: config.browser.ready_selector.clone(),
            ready_timeout: config.browser.ready_timeout(),
            settle: config.browser.settle(),
        }
    }

    /// `<site_url>/<prefix>/<slug>`; an empty prefix is skipped.
    pub fn page_url(&self, slug: &Slug) -> Result<Url, RenderError> {
        let mut url = Url::parse(&self.site_url)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.pop_if_empty();
            for part in self.path_prefix.split('/').filter(|p| !p.is_empty()) {
                segments.push(part);
            }
            segments.push(slug.as_str());
        }
        Ok(url)
    }

    /// Render one slug. Failures are logged with a page-source excerpt.
    pub fn render(&mut self, slug: &Slug) -> Result<RenderedPage, RenderError> {
        let result = self.render_inner(slug);
        if let Err(err) = &result {
            let excerpt = self
                .browser
                .capture_page()
                .map(|source| source.chars().take(EXCERPT_CHARS).collect::<String>())
                .unwrap_or_else(|_| "<page source unavailable>".to_string());
            warn!(slug = %slug, excerpt = %excerpt, "render failed: {err}");
        }
        result
    }

    fn render_inner(&mut self, slug: &Slug) -> Result<RenderedPage, RenderError> {
        let url = self.page_url(slug)?.to_string();
        info!(slug = %slug, url = %url, "rendering");

        self.browser
            .navigate(&url)
            .map_err(|source| RenderError::Navigation {
                url: url.clone(),
                source: Box::new(source),
            })?;

        let title = self
            .browser
            .wait_for_element(&self.ready_selector, self.ready_timeout)?;

        if !self.settle.is_zero() {
            sleep(self.settle);
        }

        let html = self
            .browser
            .capture_page()
            .map_err(|source| RenderError::Capture {
                source: Box::new(source),
            })?;

        Ok(RenderedPage {
            slug: slug.clone(),
            url,
            title: title.trim().to_string(),
            html,
        })
    }

    pub fn browser_mut(&mut self) -> &mut B {
        &mut self.browser
    }

    /// Release the browser session.
    pub fn quit(mut self) -> Result<(), RenderError> {
        self.browser.quit()
    }
}
