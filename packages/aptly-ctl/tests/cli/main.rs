//! Runs the compiled binaries against a minimal Aptly stand-in and checks
//! what a shell script calling them would see: exit codes and output.

use std::{
    path::Path,
    process::{Command, Output},
};

use axum::{Json, Router, http::StatusCode, routing::get};
use axum_test::TestServer;
use serde_json::json;
use tempfile::NamedTempFile;

const APTLY_CTL: &str = env!("CARGO_BIN_EXE_aptly-ctl");
const DIDWW_APTLY_CTL: &str = env!("CARGO_BIN_EXE_didww-aptly-ctl");

fn server() -> TestServer {
    let app = Router::new()
        .route(
            "/api/version",
            get(|| async { Json(json!({ "Version": "1.5.0" })) }),
        )
        .route(
            "/api/publish",
            get(|| async {
                Json(json!([{
                    "Prefix": "nightly",
                    "Distribution": "bionic",
                    "SourceKind": "local",
                    "Sources": [{"Name": "nightly-bionic", "Component": "main"}],
                }]))
            }),
        )
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 page not found") });
    TestServer::builder()
        .http_transport()
        .build(app)
        .expect("create test server")
}

fn config_file(url: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("create config file");
    std::fs::write(
        file.path(),
        format!("[[profile]]\nname = \"test\"\nurl = \"{url}\"\n"),
    )
    .expect("write config file");
    file
}

/// Run a binary without blocking the runtime the test server lives on.
async fn run(binary: &'static str, args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        Command::new(binary)
            .args(args)
            .env_remove("APTLY_URL")
            .env_remove("APTLY_PASS_FILE")
            .env_remove("RUST_LOG")
            .output()
            .expect("run binary")
    })
    .await
    .expect("join binary runner")
}

async fn aptly_ctl(config: &Path, args: &[&str]) -> Output {
    let mut all = vec![String::from("-c"), config.display().to_string()];
    all.extend(args.iter().map(|arg| arg.to_string()));
    run(APTLY_CTL, all).await
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test_log::test(tokio::test)]
async fn version() {
    let server = server();
    let url = server.server_url("/").expect("server url");
    let config = config_file(url.as_str());

    let output = aptly_ctl(config.path(), &["version"]).await;
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Aptly server version: 1.5.0");
}

#[test_log::test(tokio::test)]
async fn help_and_missing_subcommand() {
    let output = run(APTLY_CTL, vec![String::from("--help")]).await;
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("publish"));

    let output = run(APTLY_CTL, Vec::new()).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Usage"), "{}", stdout(&output));

    let output = run(APTLY_CTL, vec![String::from("--bogus")]).await;
    assert_eq!(output.status.code(), Some(1));
}

#[test_log::test(tokio::test)]
async fn invalid_pub_spec() {
    let server = server();
    let url = server.server_url("/").expect("server url");
    let config = config_file(url.as_str());

    let output = aptly_ctl(config.path(), &["publish", "drop", "=foo"]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("PUB_SPEC '=foo' invalid. See 'publish' subcommand --help"),
        "{}",
        stderr(&output)
    );
}

#[test_log::test(tokio::test)]
async fn config_errors() {
    let config = config_file("http://localhost:8090/");

    let output = aptly_ctl(config.path(), &["-C", "bogus=1", "version"]).await;
    assert_eq!(output.status.code(), Some(127), "{}", stderr(&output));

    let output = aptly_ctl(config.path(), &["-p", "prod", "version"]).await;
    assert_eq!(output.status.code(), Some(127), "{}", stderr(&output));
}

#[test_log::test(tokio::test)]
async fn url_override_and_page_not_found() {
    let server = server();
    let url = server.server_url("/").expect("server url");
    let config = config_file("http://localhost:1/");
    let wrong = url.join("aptly/").expect("join");

    let output = aptly_ctl(config.path(), &["-C", &format!("url={wrong}"), "version"]).await;
    assert_eq!(output.status.code(), Some(128));
    assert!(
        stderr(&output).contains(
            "API responded with '404 page not found'. Check configured API url and run command with -vv to see failed request details."
        ),
        "{}",
        stderr(&output)
    );

    let output = aptly_ctl(config.path(), &["-C", &format!("url={url}"), "version"]).await;
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
}

#[test_log::test(tokio::test)]
async fn didww_publish_list() {
    let server = server();
    let url = server.server_url("/").expect("server url");

    let output = run(
        DIDWW_APTLY_CTL,
        vec![
            String::from("-u"),
            url.to_string(),
            String::from("publish"),
            String::from("list"),
        ],
    )
    .await;
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "nightly/bionic");
}

#[test_log::test(tokio::test)]
async fn unreachable_server() {
    let config = config_file("http://localhost:1/");
    let output = aptly_ctl(config.path(), &["version"]).await;
    assert_eq!(output.status.code(), Some(128), "{}", stderr(&output));
    assert!(stderr(&output).contains("request failed"), "{}", stderr(&output));
}

#[test_log::test(tokio::test)]
async fn didww_missing_subcommand() {
    let output = run(DIDWW_APTLY_CTL, Vec::new()).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Usage"), "{}", stdout(&output));
    assert!(stdout(&output).contains("publish"), "{}", stdout(&output));
}

#[test_log::test(tokio::test)]
async fn didww_invalid_log_level() {
    let output = run(
        DIDWW_APTLY_CTL,
        vec![
            String::from("-L"),
            String::from("loud"),
            String::from("publish"),
            String::from("list"),
        ],
    )
    .await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid log level: loud"));
}
