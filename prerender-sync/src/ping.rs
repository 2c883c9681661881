//! Sitemap submission: `GET <endpoint>?sitemap=<public sitemap url>`.

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use prerender_core::Config;

/// Result of pinging one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingResult {
    Success { status: u16 },
    Failed { status: u16 },
    Error { message: String },
}

impl PingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PingResult::Success { .. })
    }
}

impl fmt::Display for PingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PingResult::Success { status } => write!(f, "ok ({status})"),
            PingResult::Failed { status } => write!(f, "rejected ({status})"),
            PingResult::Error { message } => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingOutcome {
    pub endpoint: String,
    pub result: PingResult,
}

/// Endpoint URL with the `sitemap` query parameter appended.
pub fn ping_url(endpoint: &str, sitemap_url: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(endpoint)?;
    url.query_pairs_mut().append_pair("sitemap", sitemap_url);
    Ok(url)
}

/// Ping every configured endpoint. Never fails; each endpoint reports on its own.
pub fn submit_sitemap(config: &Config) -> Vec<PingOutcome> {
    let sitemap_url = config.public_sitemap_url();
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(config.store.timeout_secs.max(1)))
        .build();

    config
        .ping
        .endpoints
        .iter()
        .map(|endpoint| {
            let result = ping_one(&agent, endpoint, &sitemap_url);
            match &result {
                PingResult::Success { status } => {
                    info!(endpoint = %endpoint, status, "sitemap submitted")
                }
                other => warn!(endpoint = %endpoint, "sitemap submission {other}"),
            }
            PingOutcome {
                endpoint: endpoint.clone(),
                result,
            }
        })
        .collect()
}

fn ping_one(agent: &ureq::Agent, endpoint: &str, sitemap_url: &str) -> PingResult {
    let url = match ping_url(endpoint, sitemap_url) {
        Ok(url) => url,
        Err(e) => {
            return PingResult::Error {
                message: format!("invalid endpoint: {e}"),
            }
        }
    };
    match agent.request_url("GET", &url).call() {
        Ok(response) => PingResult::Success {
            status: response.status(),
        },
        Err(ureq::Error::Status(status, _)) => PingResult::Failed { status },
        Err(ureq::Error::Transport(t)) => PingResult::Error {
            message: t.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_url_encodes_sitemap() {
        let url = ping_url("https://www.google.com/ping", "https://x.example/sitemap.xml").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/ping?sitemap=https%3A%2F%2Fx.example%2Fsitemap.xml"
        );
    }

    #[test]
    fn ping_url_keeps_existing_query() {
        let url = ping_url("https://search.example/ping?v=1", "https://x/s.xml").unwrap();
        assert_eq!(url.as_str(), "https://search.example/ping?v=1&sitemap=https%3A%2F%2Fx%2Fs.xml");
    }

    #[test]
    fn bad_endpoint_is_an_error_result() {
        let mut config = Config::default();
        config.ping.endpoints = vec!["not a url".to_string()];
        let outcomes = submit_sitemap(&config);
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0].result, PingResult::Error { .. }));
    }
}
