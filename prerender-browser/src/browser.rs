//! Browser capability interface.

use std::time::Duration;

use crate::error::RenderError;

/// The three operations the renderer needs from a browser, plus teardown.
///
/// Implementations are used serially; one instance is shared by every slug
/// of a batch.
pub trait Browser {
    /// Load `url` in the current window.
    fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Block until an element matching the CSS `selector` is present, or fail
    /// with [`RenderError::Timeout`] once `timeout` has elapsed.
    ///
    /// Returns the element's visible text.
    fn wait_for_element(&mut self, selector: &str, timeout: Duration)
        -> Result<String, RenderError>;

    /// Serialize the current DOM.
    fn capture_page(&mut self) -> Result<String, RenderError>;

    /// Release the underlying session. Calling it twice is a no-op.
    fn quit(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

impl<B: Browser + ?Sized> Browser for Box<B> {
    fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        (**self).navigate(url)
    }

    fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, RenderError> {
        (**self).wait_for_element(selector, timeout)
    }

    fn capture_page(&mut self) -> Result<String, RenderError> {
        (**self).capture_page()
    }

    fn quit(&mut self) -> Result<(), RenderError> {
        (**self).quit()
    }
}
