//! PostgREST-style client for the `articles` table.
//!
//! | Call                | Request                                                                    |
//! |---------------------|----------------------------------------------------------------------------|
//! | unprocessed         | `GET  /rest/v1/<table>?select=<cols>&or=(flag.is.null,flag.eq.false)&order=created_at.desc` |
//! | processed           | `GET  /rest/v1/<table>?select=<cols>&status=eq.published&flag=eq.true&order=created_at.desc` |
//! | mark processed      | `PATCH /rest/v1/<table>?slug=eq.<slug>` with `Prefer: return=minimal`     |
//!
//! `<cols>` is `slug,status,static_html_generated`; rows decode into
//! [`ArticleRecord`] one at a time so a bad row only drops itself.
//!
//! Every request carries the static key as both `apikey` and bearer token.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use prerender_core::{ArticleRecord, ArticleStatus, Slug, StoreConfig};

use crate::error::StoreError;
use crate::ContentStore;

const FLAG: &str = "static_html_generated";
const COLUMNS: &str = "slug,status,static_html_generated";

/// Blocking REST client over a shared `ureq` agent.
#[derive(Debug, Clone)]
pub struct RestStore {
    agent: ureq::Agent,
    endpoint: Url,
    api_key: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let endpoint = Url::parse(&format!(
            "{}/rest/v1/{}",
            config.url.trim_end_matches('/'),
            config.table
        ))?;
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("prerender/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(Self {
            agent,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request(&self, method: &str) -> ureq::Request {
        self.agent
            .request_url(method, &self.endpoint)
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
    }

    /// Unprocessed slugs, surfacing query errors.
    pub fn try_fetch_unprocessed(&self) -> Result<Vec<Slug>, StoreError> {
        let response = self
            .request("GET")
            .query("select", COLUMNS)
            .query("or", &format!("({FLAG}.is.null,{FLAG}.eq.false)"))
            .query("order", "created_at.desc")
            .call()?;
        let records = decode_records(response)?;
        Ok(records
            .into_iter()
            .filter(|record| {
                if record.is_processed() {
                    debug!(slug = %record.slug, "row already generated; skipping");
                }
                !record.is_processed()
            })
            .map(|record| record.slug)
            .collect())
    }

    /// Published and processed slugs, surfacing query errors.
    pub fn try_fetch_processed(&self) -> Result<Vec<Slug>, StoreError> {
        let response = self
            .request("GET")
            .query("select", COLUMNS)
            .query("status", &format!("eq.{}", ArticleStatus::Published))
            .query(FLAG, "eq.true")
            .query("order", "created_at.desc")
            .call()?;
        let records = decode_records(response)?;
        Ok(records.into_iter().map(|record| record.slug).collect())
    }
}

fn decode_records(response: ureq::Response) -> Result<Vec<ArticleRecord>, StoreError> {
    let rows: Vec<Value> = response.into_json().map_err(StoreError::Decode)?;
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<ArticleRecord>(row.clone()) {
            Ok(record) => records.push(record),
            Err(err) => warn!(row = %row, "skipping store row: {err}"),
        }
    }
    Ok(records)
}

impl ContentStore for RestStore {
    fn fetch_unprocessed(&self) -> Vec<Slug> {
        match self.try_fetch_unprocessed() {
            Ok(slugs) => {
                info!(count = slugs.len(), "found unprocessed articles in store");
                slugs
            }
            Err(err) => {
                warn!("failed to fetch unprocessed articles: {err}");
                Vec::new()
            }
        }
    }

    fn fetch_processed(&self) -> Vec<Slug> {
        match self.try_fetch_processed() {
            Ok(slugs) => {
                info!(count = slugs.len(), "found processed articles for sitemap");
                slugs
            }
            Err(err) => {
                warn!("failed to fetch processed articles: {err}");
                Vec::new()
            }
        }
    }

    fn mark_processed(&self, slug: &Slug) -> Result<(), StoreError> {
        let response = self
            .request("PATCH")
            .query("slug", &format!("eq.{slug}"))
            .set("Prefer", "return=minimal")
            .send_json(json!({
                "status": ArticleStatus::Processed,
                "static_html_generated": true,
            }))?;

        match response.status() {
            200 | 204 => {
                debug!(slug = %slug, "store updated");
                Ok(())
            }
            status => Err(StoreError::Status {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> StoreConfig {
        StoreConfig {
            url: url.to_string(),
            api_key: "k".to_string(),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn endpoint_joins_table_without_double_slash() {
        let store = RestStore::new(&config("https://x.example/")).unwrap();
        assert_eq!(store.endpoint().as_str(), "https://x.example/rest/v1/articles");
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = RestStore::new(&config("not a url")).unwrap_err();
        assert!(matches!(err, StoreError::Url(_)));
    }
}
