//! Integration test: CLI interface.
//!
//! Runs the compiled binary as a subprocess and checks the JSON line it
//! prints and the exit code, including a full run against a mock API.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::process::{Command, Output};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MISSING: &str = "Missing required arguments: file_path api_key [model]";

/// Command for the binary with an isolated config directory.
fn transcribe_cmd(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("dashscope-transcribe").expect("binary");
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("DASHSCOPE_HTTP_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "expected exactly one line, got: {:?}", stdout);
    serde_json::from_str(lines[0]).expect("valid JSON")
}

/// No arguments prints the missing-arguments object and exits 1.
#[test]
fn cli_no_arguments() {
    let home = tempfile::tempdir().unwrap();
    let output = transcribe_cmd(home.path()).output().expect("failed to execute");

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\"success\": false, \"text\": null, \"error\": \"Missing required arguments: file_path api_key [model]\"}\n"
    );
}

/// A single argument is still missing the API key.
#[test]
fn cli_one_argument() {
    let home = tempfile::tempdir().unwrap();
    transcribe_cmd(home.path())
        .arg("audio.wav")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(MISSING));
}

/// --help prints usage information and exits successfully.
#[test]
fn cli_help_flag() {
    let home = tempfile::tempdir().unwrap();
    transcribe_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dashscope-transcribe"));
}

/// A missing audio file is a handled failure: exit 0, success false.
#[test]
fn cli_nonexistent_file() {
    let home = tempfile::tempdir().unwrap();
    let output = transcribe_cmd(home.path())
        .args(["/tmp/definitely_nonexistent_dashscope_test.wav", "sk-test"])
        .output()
        .expect("failed to execute");

    assert_eq!(output.status.code(), Some(0));
    let value = stdout_json(&output);
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["text"], Value::Null);
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("Failed to read audio file"));
}

/// A file name starting with `-` is a path, not a flag.
#[test]
fn cli_hyphen_leading_file_name() {
    let home = tempfile::tempdir().unwrap();
    let output = transcribe_cmd(home.path())
        .current_dir(home.path())
        .args(["-take1.wav", "sk-test"])
        .output()
        .expect("failed to execute");

    assert_eq!(output.status.code(), Some(0));
    let value = stdout_json(&output);
    assert_eq!(value["success"], json!(false));
    assert!(value["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to read audio file: -take1.wav"));
}

/// Full run against a mock API: remote URL, default model, text extracted.
#[tokio::test(flavor = "multi_thread")]
async fn cli_transcribes_with_mock_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/aigc/multimodal-generation/generation"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "qwen-audio-asr"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": {"choices": [{"finish_reason": "stop",
                "message": {"role": "assistant", "content": [{"text": "hello world"}]}}]},
            "request_id": "req-cli"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = transcribe_cmd(home.path());
    cmd.env("DASHSCOPE_HTTP_BASE_URL", server.uri())
        .args(["https://audio.test/clip.wav", "sk-test"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().expect("failed to execute"))
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\"success\": true, \"text\": \"hello world\", \"error\": null}\n"
    );
}

/// A throttled call reports the API error and still exits 0.
#[tokio::test(flavor = "multi_thread")]
async fn cli_reports_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/aigc/multimodal-generation/generation"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "code": "Throttling", "message": "rate limit", "request_id": "req-429"
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("custom.toml");
    std::fs::write(&config, format!("base_url = \"{}\"\n", server.uri())).unwrap();

    let mut cmd = transcribe_cmd(home.path());
    cmd.arg("--config")
        .arg(&config)
        .args(["https://audio.test/clip.wav", "sk-test", "qwen3-asr-flash"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().expect("failed to execute"))
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\"success\": false, \"text\": null, \"error\": \"API Error: Throttling - rate limit\"}\n"
    );
}
