//! Batch configuration.
//!
//! # Lookup order
//!
//! ```text
//! --config <path> / $PRERENDER_CONFIG   (must exist)
//! ./prerender.yaml
//! <config_dir>/prerender/config.yaml
//! built-in defaults
//! ```
//!
//! Environment overrides are applied on top of whichever source won, then the
//! result is validated. The loaded [`Config`] is never mutated afterwards.
//!
//! # API pattern
//!
//! As in the rest of the workspace, functions that touch the outside world have
//! an explicit form (`load_at`, `resolve_path_at`, `apply_env_with`) used by
//! tests, and a convenience form (`load`) that reads cwd, `dirs::config_dir()`
//! and the process environment.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::types::Slug;

/// Upper bound on the DOM-ready wait, in seconds.
pub const MAX_READY_TIMEOUT_SECS: u64 = 30;

/// Allowed settle delay after the ready element appears. Zero disables it.
pub const SETTLE_WINDOW_MILLIS: RangeInclusive<u64> = 3_000..=5_000;

pub const CONFIG_FILE_NAME: &str = "prerender.yaml";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Root configuration value handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the client-rendered application the browser navigates to.
    pub site_url: String,
    /// Base URL written into the sitemap. Defaults to `site_url`.
    pub public_url: Option<String>,
    /// Route under which the application renders a single article.
    pub render_path_prefix: String,
    /// Route segment articles are published under (sitemap + legacy parsing).
    pub articles_path: String,
    pub store: StoreConfig,
    pub sources: SourcesConfig,
    pub output: OutputConfig,
    /// Skip slugs whose artifact already exists on disk.
    pub incremental: bool,
    pub browser: BrowserConfig,
    pub ping: PingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:5173".to_string(),
            public_url: None,
            render_path_prefix: "draft".to_string(),
            articles_path: "articles".to_string(),
            store: StoreConfig::default(),
            sources: SourcesConfig::default(),
            output: OutputConfig::default(),
            incremental: false,
            browser: BrowserConfig::default(),
            ping: PingConfig::default(),
        }
    }
}

/// Remote content store connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Project URL; the REST endpoint lives under `/rest/v1/<table>`.
    pub url: String,
    /// Static bearer credential, sent as both `apikey` and `Authorization`.
    pub api_key: String,
    pub table: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: "articles".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Which discovery sources feed the work list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    pub store: bool,
    /// Manually curated slugs, appended after store results.
    pub manual: Vec<String>,
    pub legacy_sitemap: LegacySitemapConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            store: true,
            manual: Vec::new(),
            legacy_sitemap: LegacySitemapConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegacySitemapConfig {
    pub enabled: bool,
    pub url: Option<String>,
}

/// Where artifacts and the sitemap land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub artifacts_dir: PathBuf,
    pub sitemap_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("public").join("articles"),
            sitemap_path: PathBuf::from("public").join("sitemap.xml"),
        }
    }
}

/// WebDriver session and page-readiness policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    /// CSS selector whose presence means client rendering finished.
    pub ready_selector: String,
    pub ready_timeout_secs: u64,
    pub settle_millis: u64,
    pub poll_interval_millis: u64,
    pub window_size: String,
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            ready_selector: "h1".to_string(),
            ready_timeout_secs: MAX_READY_TIMEOUT_SECS,
            settle_millis: 5_000,
            poll_interval_millis: 250,
            window_size: "1920,1080".to_string(),
            user_agent: None,
        }
    }
}

impl BrowserConfig {
    /// Ready wait, clamped to [`MAX_READY_TIMEOUT_SECS`].
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs.min(MAX_READY_TIMEOUT_SECS))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis.max(1))
    }
}

/// Search-engine sitemap submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PingConfig {
    pub enabled: bool,
    pub endpoints: Vec<String>,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoints: vec![
                "https://www.google.com/ping".to_string(),
                "https://www.bing.com/ping".to_string(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

impl Config {
    /// Sitemap base URL, without a trailing slash.
    pub fn public_url(&self) -> &str {
        self.public_url
            .as_deref()
            .unwrap_or(&self.site_url)
            .trim_end_matches('/')
    }

    /// Public URL the written sitemap is served from.
    pub fn public_sitemap_url(&self) -> String {
        let file = self
            .output
            .sitemap_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sitemap.xml".to_string());
        format!("{}/{}", self.public_url(), file)
    }

    /// Manual slugs, validated.
    pub fn manual_slugs(&self) -> Result<Vec<Slug>, ConfigError> {
        self.sources
            .manual
            .iter()
            .map(|raw| {
                Slug::parse(raw)
                    .map_err(|e| ConfigError::Invalid(format!("sources.manual: {e}")))
            })
            .collect()
    }

    /// Legacy sitemap URL when that source is enabled.
    pub fn legacy_sitemap_url(&self) -> Option<&str> {
        let legacy = &self.sources.legacy_sitemap;
        if legacy.enabled {
            legacy.url.as_deref()
        } else {
            None
        }
    }

    /// Reject values that would only fail later, mid-batch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("site_url", &self.site_url)?;
        if let Some(public) = &self.public_url {
            check_url("public_url", public)?;
        }
        check_url("browser.webdriver_url", &self.browser.webdriver_url)?;

        // Marking and the sitemap rebuild use the store even when it is not
        // a discovery source.
        check_url("store.url", &self.store.url)?;
        if self.store.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("store.api_key is required".to_string()));
        }

        if self.sources.legacy_sitemap.enabled {
            match &self.sources.legacy_sitemap.url {
                Some(url) => check_url("sources.legacy_sitemap.url", url)?,
                None => {
                    return Err(ConfigError::Invalid(
                        "sources.legacy_sitemap.url is required when the source is enabled"
                            .to_string(),
                    ))
                }
            }
        }

        let settle = self.browser.settle_millis;
        if settle != 0 && !SETTLE_WINDOW_MILLIS.contains(&settle) {
            return Err(ConfigError::Invalid(format!(
                "browser.settle_millis must be 0 or within {}..={} (got {settle})",
                SETTLE_WINDOW_MILLIS.start(),
                SETTLE_WINDOW_MILLIS.end(),
            )));
        }

        if self.browser.ready_selector.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "browser.ready_selector must not be empty".to_string(),
            ));
        }

        self.manual_slugs()?;
        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid(format!("{field}: '{value}' is not a valid URL ({e})")))
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

impl Config {
    /// Apply `PRERENDER_*` overrides using `lookup` as the environment.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PRERENDER_SITE_URL") {
            self.site_url = v;
        }
        if let Some(v) = lookup("PRERENDER_PUBLIC_URL") {
            self.public_url = Some(v);
        }
        if let Some(v) = lookup("PRERENDER_STORE_URL") {
            self.store.url = v;
        }
        if let Some(v) = lookup("PRERENDER_STORE_KEY") {
            self.store.api_key = v;
        }
        if let Some(v) = lookup("PRERENDER_WEBDRIVER_URL") {
            self.browser.webdriver_url = v;
        }
        if let Some(v) = lookup("PRERENDER_OUTPUT_DIR") {
            self.output.artifacts_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("PRERENDER_SITEMAP_PATH") {
            self.output.sitemap_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("PRERENDER_LEGACY_SITEMAP_URL") {
            self.sources.legacy_sitemap.enabled = true;
            self.sources.legacy_sitemap.url = Some(v);
        }
        if let Some(v) = lookup("PRERENDER_INCREMENTAL") {
            self.incremental = parse_bool("PRERENDER_INCREMENTAL", &v)?;
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!(
            "{name}: expected a boolean, got '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a config document. `path` is only used for error context.
pub fn parse(contents: &str, path: &Path) -> Result<Config, ConfigError> {
    // An empty file means "all defaults".
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config file at `path`, without env overrides or validation.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, path)
}

/// Pick the config file to load. `None` means "use defaults".
///
/// An explicit path is returned even when absent so the caller reports it.
pub fn resolve_path_at(
    explicit: Option<&Path>,
    cwd: &Path,
    config_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let user = config_dir?.join("prerender").join("config.yaml");
    user.exists().then_some(user)
}

/// Resolve, load, apply overrides from `lookup`, validate.
pub fn load_with<F>(
    explicit: Option<&Path>,
    cwd: &Path,
    config_dir: Option<&Path>,
    lookup: F,
) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match resolve_path_at(explicit, cwd, config_dir) {
        Some(path) => load_at(&path)?,
        None => Config::default(),
    };
    config.apply_env_with(lookup)?;
    config.validate()?;
    Ok(config)
}

/// `load_with` against the real cwd, config dir and process environment.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    load_with(explicit, &cwd, dirs::config_dir().as_deref(), |key| {
        std::env::var(key).ok()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
