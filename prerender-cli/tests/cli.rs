use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const ENV_KEYS: &[&str] = &[
    "PRERENDER_CONFIG",
    "PRERENDER_SITE_URL",
    "PRERENDER_PUBLIC_URL",
    "PRERENDER_STORE_URL",
    "PRERENDER_STORE_KEY",
    "PRERENDER_WEBDRIVER_URL",
    "PRERENDER_OUTPUT_DIR",
    "PRERENDER_SITEMAP_PATH",
    "PRERENDER_LEGACY_SITEMAP_URL",
    "PRERENDER_INCREMENTAL",
];

fn prerender(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("prerender").expect("prerender binary");
    cmd.current_dir(cwd).env("RUST_LOG", "warn");
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

fn write_config(dir: &TempDir, server: &MockServer, extra: &str) -> PathBuf {
    let path = dir.path().join("prerender.yaml");
    let yaml = format!(
        r#"site_url: "http://app.test"
public_url: "https://www.example.com"
store:
  url: "{store}"
  api_key: "anon"
output:
  artifacts_dir: "{dir}/public/articles"
  sitemap_path: "{dir}/public/sitemap.xml"
browser:
  webdriver_url: "http://127.0.0.1:9"
  settle_millis: 0
{extra}"#,
        store = server.base_url(),
        dir = dir.path().display(),
    );
    fs::write(&path, yaml).unwrap();
    path
}

fn mock_unprocessed<'a>(server: &'a MockServer, rows: Value) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/articles")
            .query_param("or", "(static_html_generated.is.null,static_html_generated.eq.false)");
        then.status(200).json_body(rows);
    })
}

fn mock_processed<'a>(server: &'a MockServer, rows: Value) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/articles")
            .query_param("status", "eq.published")
            .query_param("static_html_generated", "eq.true");
        then.status(200).json_body(rows);
    })
}

#[test]
fn help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    prerender(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("discover"))
                .and(predicate::str::contains("sitemap"))
                .and(predicate::str::contains("submit")),
        );
}

#[test]
fn missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    prerender(dir.path())
        .args(["sitemap", "--config", "does-not-exist.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.yaml"));
}

#[test]
fn sitemap_command_writes_processed_articles() {
    let server = MockServer::start();
    let processed = mock_processed(&server, json!([{ "slug": "a" }, { "slug": "b" }]));
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server, "");

    prerender(dir.path())
        .arg("sitemap")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("sitemap written").and(predicate::str::contains("3 entries")));

    processed.assert();
    let xml = fs::read_to_string(dir.path().join("public/sitemap.xml")).unwrap();
    assert!(xml.contains("<loc>https://www.example.com/articles/a</loc>"));
    assert!(xml.contains("<loc>https://www.example.com/articles/b</loc>"));
}

#[test]
fn sitemap_dry_run_writes_nothing() {
    let server = MockServer::start();
    mock_processed(&server, json!([{ "slug": "a" }]));
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server, "");

    prerender(dir.path())
        .env("PRERENDER_CONFIG", &config)
        .args(["sitemap", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run]"));
    assert!(!dir.path().join("public/sitemap.xml").exists());
}

#[test]
fn discover_json_lists_sources_in_order() {
    let server = MockServer::start();
    mock_unprocessed(&server, json!([{ "slug": "fresh" }, { "slug": null }]));
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server, "sources:\n  manual: [\"fresh\", \"pinned\"]\n");

    let output = prerender(dir.path())
        .args(["discover", "--json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let items: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        items,
        json!([
            { "slug": "fresh", "source": "store", "known_unprocessed": true },
            { "slug": "pinned", "source": "manual", "known_unprocessed": false }
        ])
    );
}

#[test]
fn run_with_nothing_to_do_skips_the_browser() {
    let server = MockServer::start();
    mock_unprocessed(&server, json!([]));
    mock_processed(&server, json!([{ "slug": "old" }]));
    let dir = TempDir::new().unwrap();
    write_config(&dir, &server, "");

    // No subcommand, config picked up from ./prerender.yaml.
    prerender(dir.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("No unprocessed articles found")
                .and(predicate::str::contains("Processed: 0 articles"))
                .and(predicate::str::contains("Failed: 0 articles")),
        );
    assert!(dir.path().join("public/sitemap.xml").exists());
}

#[test]
fn run_logs_to_stderr_and_keeps_stdout_for_the_summary() {
    let server = MockServer::start();
    mock_unprocessed(&server, json!([]));
    mock_processed(&server, json!([{ "slug": "old" }]));
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server, "");

    prerender(dir.path())
        .env("RUST_LOG", "info")
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("starting batch"))
        .stdout(
            predicate::str::contains("starting batch")
                .not()
                .and(predicate::str::contains("Batch generation complete")),
        );
}

#[test]
fn run_aborts_when_browser_is_unavailable() {
    let server = MockServer::start();
    mock_unprocessed(&server, json!([{ "slug": "a" }]));
    let patch = server.mock(|when, then| {
        when.method(PATCH).path("/rest/v1/articles");
        then.status(204);
    });
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server, "");

    prerender(dir.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("batch run aborted")
                .and(predicate::str::contains("batch aborted before rendering")),
        );

    patch.assert_hits(0);
    assert!(!dir.path().join("public/articles/a.html").exists());
}

#[test]
fn invalid_config_is_rejected_before_any_request() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.method(GET).path("/rest/v1/articles");
        then.status(200).json_body(json!([]));
    });
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server, "sources:\n  manual: [\"a/b\"]\n");

    prerender(dir.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("sources.manual"));
    any.assert_hits(0);
}

#[test]
fn submit_pings_configured_endpoints() {
    let server = MockServer::start();
    let ping = server.mock(|when, then| {
        when.method(GET)
            .path("/ping")
            .query_param("sitemap", "https://www.example.com/sitemap.xml");
        then.status(200);
    });
    let dir = TempDir::new().unwrap();
    let extra = format!("ping:\n  endpoints: [\"{}\"]\n", server.url("/ping"));
    let config = write_config(&dir, &server, &extra);

    prerender(dir.path())
        .arg("submit")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (200)"));
    ping.assert();
}
