//! End-to-end test of the generate command: flag parsing through API
//! access to the written document.

use clap::Parser;
use relnotes::cli::generate::GenerateCommand;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Sets GITHUB_TOKEN, so this must stay the only test in this binary.
#[tokio::test]
async fn generate_writes_document_to_output_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/releases/latest"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("notes.md");
    let cmd = GenerateCommand::parse_from([
        "generate",
        "--repository",
        "owner/repo",
        "--tag-name",
        "v1.0.0",
        "--chapters",
        r#"[{"title": "Bugfixes", "label": "bug"}]"#,
        "--api-url",
        &server.uri(),
        "--output",
        output.to_str().unwrap(),
    ]);

    std::env::set_var("GITHUB_TOKEN", "test-token");
    cmd.execute().await.unwrap();

    let document = std::fs::read_to_string(&output).unwrap();
    assert!(document.starts_with("### Bugfixes\nNo entries detected.\n"));
    assert!(document.contains("### Closed Issues without Pull Request ⚠️"));
    assert!(document.ends_with("#### Full Changelog\nhttps://github.com/owner/repo/commits/v1.0.0\n"));
}
