//! # prerender-browser
//!
//! Drives a browser to a client-rendered article page and captures the final
//! DOM serialization.
//!
//! [`Browser`] is the capability seam: [`WebDriverSession`] speaks the W3C
//! WebDriver protocol to chromedriver (or any compatible server), while tests
//! plug in scripted fakes. [`PageRenderer`] owns one browser and applies the
//! readiness policy for each slug.
//!
//! ```rust,no_run
//! use prerender_browser::{PageRenderer, WebDriverSession};
//! use prerender_core::{Config, Slug};
//!
//! fn render_one(config: &Config) -> Result<String, prerender_browser::RenderError> {
//!     let session = WebDriverSession::start(&config.browser)?;
//!     let mut renderer = PageRenderer::new(session, config);
//!     let page = renderer.render(&Slug::parse("hello-world").unwrap())?;
//!     renderer.quit()?;
//!     Ok(page.html)
//! }
//! ```

pub mod browser;
pub mod error;
pub mod page;
pub mod webdriver;

pub use browser::Browser;
pub use error::RenderError;
pub use page::{PageRenderer, RenderedPage};
pub use webdriver::WebDriverSession;
