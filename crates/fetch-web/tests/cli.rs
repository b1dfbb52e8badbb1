// ABOUTME: Integration tests for the fetch-web CLI binary.
// ABOUTME: Runs listing and article subcommands against local HTML files and a mock server.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn fetch_web_cmd() -> Command {
    Command::cargo_bin("fetch-web").unwrap()
}

const DEMO_LISTING: &str = r#"<html><body><script>self.__next_f.push([1,"{\"title\":\"Demo\",\"slug\":{\"current\":\"demo\"},\"publishedOn\":\"2025-01-01\",\"summary\":\"S\"}"])</script></body></html>"#;

const DEMO_ARTICLE: &str = r#"<html><body><script>self.__next_f.push([1,"{\"_type\":\"post\",\"publishedOn\":\"2025-01-01\",\"title\":\"Demo article\",\"body\":[{\"_type\":\"block\",\"style\":\"h2\",\"children\":[{\"_type\":\"span\",\"text\":\"Section\"}]},{\"_type\":\"block\",\"style\":\"normal\",\"children\":[{\"_type\":\"span\",\"text\":\"text\"}]}]}"])</script></body></html>"#;

#[test]
fn listing_from_file_prints_json_stubs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("listing.html");
    fs::write(&path, DEMO_LISTING).unwrap();

    fetch_web_cmd()
        .arg("listing")
        .arg("https://www.anthropic.com/engineering")
        .arg("--html")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\"url\": \"https://www.anthropic.com/engineering/demo\"",
        ))
        .stdout(predicate::str::contains("\"published_on\": \"2025-01-01\""));
}

#[test]
fn article_from_file_renders_markdown_by_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("article.html");
    fs::write(&path, DEMO_ARTICLE).unwrap();

    fetch_web_cmd()
        .args(["article", "https://www.anthropic.com/engineering/demo", "--html"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Demo article"))
        .stdout(predicate::str::contains("---\n\n## Section\n\ntext"));
}

#[test]
fn article_html_and_json_formats() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("article.html");
    fs::write(&path, DEMO_ARTICLE).unwrap();

    fetch_web_cmd()
        .args(["article", "https://www.anthropic.com/engineering/demo", "-f", "html", "--html"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("<h2>Section</h2>\n<p>text</p>"));

    fetch_web_cmd()
        .args(["--json", "article", "https://www.anthropic.com/engineering/demo", "--html"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"source\": \"structured\""));
}

#[test]
fn fetches_listing_over_http() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/engineering");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(DEMO_LISTING);
    });

    fetch_web_cmd()
        .args(["--site-base", server.base_url().as_str(), "listing", server.url("/engineering").as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains(server.url("/engineering/demo")));
    mock.assert();
}

#[test]
fn http_failure_exits_non_zero() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });

    fetch_web_cmd()
        .args(["article", server.url("/missing").as_str()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("HTTP status 404"));
}

#[test]
fn missing_html_file_is_an_error() {
    fetch_web_cmd()
        .args(["listing", "https://www.anthropic.com/engineering", "--html", "/nonexistent/page.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading /nonexistent/page.html"));
}
