//! Config lookup, parse-error and override integration tests.

use std::path::Path;

use assert_fs::prelude::*;
use prerender_core::{
    config::{self, CONFIG_FILE_NAME},
    ConfigError, Slug, SlugError,
};
use rstest::rstest;

const FULL: &str = r#"
site_url: "http://localhost:8080"
public_url: "https://www.example.com"
render_path_prefix: draft
store:
  url: "https://store.example"
  api_key: "anon-key"
sources:
  store: true
  manual: ["hand-picked", "another-one"]
  legacy_sitemap:
    enabled: true
    url: "https://store.example/storage/sitemap.xml"
output:
  artifacts_dir: "out/articles"
  sitemap_path: "out/sitemap.xml"
incremental: true
browser:
  headless: false
  settle_millis: 3000
"#;

fn no_env(_: &str) -> Option<String> {
    None
}

// ---------------------------------------------------------------------------
// 1. Lookup order
// ---------------------------------------------------------------------------

#[test]
fn explicit_path_wins_and_must_exist() {
    let cwd = assert_fs::TempDir::new().expect("tempdir");
    let missing = cwd.path().join("nope.yaml");
    let err = config::load_with(Some(&missing), cwd.path(), None, no_env).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("nope.yaml"));
}

#[test]
fn local_file_is_preferred_over_user_config_dir() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    let user = assert_fs::TempDir::new().expect("user");
    cwd.child(CONFIG_FILE_NAME).write_str(FULL).unwrap();
    user.child("prerender/config.yaml")
        .write_str("site_url: \"http://user.example\"\n")
        .unwrap();

    let resolved = config::resolve_path_at(None, cwd.path(), Some(user.path())).unwrap();
    assert_eq!(resolved, cwd.path().join(CONFIG_FILE_NAME));
}

#[test]
fn user_config_dir_used_when_no_local_file() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    let user = assert_fs::TempDir::new().expect("user");
    user.child("prerender/config.yaml").write_str(FULL).unwrap();

    let loaded = config::load_with(None, cwd.path(), Some(user.path()), no_env).expect("load");
    assert_eq!(loaded.public_url(), "https://www.example.com");
}

#[test]
fn no_file_anywhere_uses_defaults_plus_env() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    let loaded = config::load_with(None, cwd.path(), None, |k| match k {
        "PRERENDER_STORE_URL" => Some("https://store.example".to_string()),
        "PRERENDER_STORE_KEY" => Some("anon".to_string()),
        _ => None,
    })
    .expect("defaults validate once the store is configured");
    assert_eq!(loaded.store.api_key, "anon");
    assert_eq!(loaded.render_path_prefix, "draft");
}

// ---------------------------------------------------------------------------
// 2. Parsing
// ---------------------------------------------------------------------------

#[test]
fn full_document_round_trips_into_config() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    cwd.child(CONFIG_FILE_NAME).write_str(FULL).unwrap();
    let loaded = config::load_with(None, cwd.path(), None, no_env).expect("load");

    assert!(loaded.incremental);
    assert!(!loaded.browser.headless);
    assert_eq!(loaded.browser.ready_selector, "h1", "unset fields keep defaults");
    assert_eq!(
        loaded.legacy_sitemap_url(),
        Some("https://store.example/storage/sitemap.xml")
    );
    let manual: Vec<String> = loaded
        .manual_slugs()
        .unwrap()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(manual, vec!["hand-picked", "another-one"]);
}

#[test]
fn malformed_yaml_reports_path() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    cwd.child(CONFIG_FILE_NAME)
        .write_str("store: [unclosed\n  - : :")
        .unwrap();
    let err = config::load_at(&cwd.path().join(CONFIG_FILE_NAME)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains(CONFIG_FILE_NAME));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = config::parse("sit_url: \"http://typo\"\n", Path::new("x.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn env_override_beats_file_value() {
    let cwd = assert_fs::TempDir::new().expect("cwd");
    cwd.child(CONFIG_FILE_NAME).write_str(FULL).unwrap();
    let loaded = config::load_with(None, cwd.path(), None, |k| {
        (k == "PRERENDER_INCREMENTAL").then(|| "off".to_string())
    })
    .expect("load");
    assert!(!loaded.incremental);
}

// ---------------------------------------------------------------------------
// 3. Slugs
// ---------------------------------------------------------------------------

#[rstest]
#[case("foo-bar", Ok("foo-bar"))]
#[case(" spaced ", Ok("spaced"))]
#[case("", Err(SlugError::Empty))]
#[case("nested/path", Err(SlugError::PathSeparator("nested/path".to_string())))]
#[case("..", Err(SlugError::Relative("..".to_string())))]
#[case("page.html", Err(SlugError::HtmlSuffix("page.html".to_string())))]
fn slug_parse_cases(#[case] raw: &str, #[case] expected: Result<&str, SlugError>) {
    let parsed = Slug::parse(raw);
    match expected {
        Ok(s) => assert_eq!(parsed.unwrap().as_str(), s),
        Err(e) => assert_eq!(parsed.unwrap_err(), e),
    }
}
