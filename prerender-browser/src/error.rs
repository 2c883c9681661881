//! Error types for prerender-browser.

use std::time::Duration;

use thiserror::Error;

/// All errors that can arise while driving the browser.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The WebDriver server refused or failed to create a session.
    #[error("could not start browser session: {0}")]
    SessionStart(String),

    /// Connection-level failure talking to the WebDriver server.
    #[error("webdriver transport error: {0}")]
    Transport(#[source] Box<ureq::Transport>),

    /// A WebDriver command returned an error payload.
    #[error("webdriver error {status} ({error}): {message}")]
    WebDriver {
        status: u16,
        error: String,
        message: String,
    },

    /// The response did not have the expected `{"value": …}` shape.
    #[error("unexpected webdriver response: {0}")]
    Protocol(String),

    /// The session was already released.
    #[error("browser session is closed")]
    Closed,

    #[error("invalid page URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: Box<RenderError>,
    },

    #[error("timed out after {}s waiting for '{selector}'", .waited.as_secs())]
    Timeout { selector: String, waited: Duration },

    #[error("failed to capture page: {source}")]
    Capture {
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::Timeout { .. })
    }
}
