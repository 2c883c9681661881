//! Minimal W3C WebDriver client.
//!
//! Only the commands the renderer needs:
//!
//! | Command         | Request                                   |
//! |-----------------|-------------------------------------------|
//! | New Session     | `POST   /session`                         |
//! | Navigate To     | `POST   /session/{id}/url`                |
//! | Find Element    | `POST   /session/{id}/element`            |
//! | Element Text    | `GET    /session/{id}/element/{eid}/text` |
//! | Page Source     | `GET    /session/{id}/source`             |
//! | Delete Session  | `DELETE /session/{id}`                    |
//!
//! Every response is `{"value": …}`; errors carry
//! `{"value": {"error": "...", "message": "..."}}` with a 4xx/5xx status.
//! The session is deleted on [`Browser::quit`] or, failing that, on drop.

use std::thread::sleep;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use prerender_core::BrowserConfig;

use crate::browser::Browser;
use crate::error::RenderError;

/// Key under which W3C element references are returned.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorValue {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

/// One live browser session on a WebDriver server.
#[derive(Debug)]
pub struct WebDriverSession {
    agent: ureq::Agent,
    base: String,
    session_id: Option<String>,
    poll_interval: Duration,
}

impl WebDriverSession {
    /// Create a new Chrome session with the configured window and flags.
    pub fn start(config: &BrowserConfig) -> Result<Self, RenderError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .build();
        let base = config.webdriver_url.trim_end_matches('/').to_string();

        let mut session = Self {
            agent,
            base,
            session_id: None,
            poll_interval: config.poll_interval(),
        };

        let value = session
            .command("POST", "/session", Some(capabilities(config)))
            .map_err(|e| RenderError::SessionStart(e.to_string()))?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::SessionStart("response carried no sessionId".to_string()))?;

        info!(session = id, headless = config.headless, "browser session started");
        session.session_id = Some(id.to_string());
        Ok(session)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn session_path(&self, suffix: &str) -> Result<String, RenderError> {
        let id = self.session_id.as_deref().ok_or(RenderError::Closed)?;
        Ok(format!("/session/{id}{suffix}"))
    }

    /// Send one command and unwrap its `value`.
    fn command(&self, method: &str, path: &str, body: Option<Value>) -> Result<Value, RenderError> {
        let url = format!("{}{}", self.base, path);
        let request = self.agent.request(method, &url);
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(response) => {
                let envelope: Envelope = response
                    .into_json()
                    .map_err(|e| RenderError::Protocol(format!("{method} {path}: {e}")))?;
                Ok(envelope.value)
            }
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                Err(decode_error(status, &text))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(RenderError::Transport(Box::new(transport)))
            }
        }
    }

    /// Element reference for `selector`, or `None` while it is absent.
    fn find_element(&self, selector: &str) -> Result<Option<String>, RenderError> {
        let path = self.session_path("/element")?;
        let found = self.command(
            "POST",
            &path,
            Some(json!({ "using": "css selector", "value": selector })),
        );
        match found {
            Ok(value) => value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Some(id.to_string()))
                .ok_or_else(|| RenderError::Protocol(format!("no element reference in {value}"))),
            Err(RenderError::WebDriver { error, .. }) if error == "no such element" => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn element_text(&self, element: &str) -> Result<String, RenderError> {
        let path = self.session_path(&format!("/element/{element}/text"))?;
        let value = self.command("GET", &path, None)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

fn capabilities(config: &BrowserConfig) -> Value {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--ignore-certificate-errors".to_string(),
        format!("--window-size={}", config.window_size),
        format!(
            "user-agent={}",
            config.user_agent.as_deref().unwrap_or(DESKTOP_USER_AGENT)
        ),
    ];
    if config.headless {
        args.insert(0, "--headless=new".to_string());
    }
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

fn decode_error(status: u16, body: &str) -> RenderError {
    let parsed = serde_json::from_str::<Envelope>(body)
        .ok()
        .and_then(|env| serde_json::from_value::<ErrorValue>(env.value).ok());
    match parsed {
        Some(err) => RenderError::WebDriver {
            status,
            error: err.error,
            message: err.message,
        },
        None => RenderError::WebDriver {
            status,
            error: "unknown error".to_string(),
            message: body.chars().take(200).collect(),
        },
    }
}

impl Browser for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        let path = self.session_path("/url")?;
        self.command("POST", &path, Some(json!({ "url": url })))?;
        Ok(())
    }

    fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, RenderError> {
        let started = Instant::now();
        let deadline = started + timeout;
        loop {
            if let Some(element) = self.find_element(selector)? {
                // Text is informational; a stale element must not fail the wait.
                let text = self.element_text(&element).unwrap_or_default();
                debug!(selector, waited_ms = started.elapsed().as_millis() as u64, "element present");
                return Ok(text);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(RenderError::Timeout {
                    selector: selector.to_string(),
                    waited: timeout,
                });
            }
            sleep(self.poll_interval.min(deadline - now));
        }
    }

    fn capture_page(&mut self) -> Result<String, RenderError> {
        let path = self.session_path("/source")?;
        let value = self.command("GET", &path, None)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RenderError::Protocol("page source was not a string".to_string()))
    }

    fn quit(&mut self) -> Result<(), RenderError> {
        let Some(id) = self.session_id.take() else {
            return Ok(());
        };
        self.command("DELETE", &format!("/session/{id}"), None)?;
        info!(session = %id, "browser session closed");
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.session_id.is_some() {
            if let Err(err) = self.quit() {
                warn!("failed to close browser session on drop: {err}");
            }
        }
    }
}
