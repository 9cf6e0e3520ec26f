use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_ads") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let fallback = target_dir
        .join("debug")
        .join(format!("ads{}", env::consts::EXE_SUFFIX));

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_ads is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// `ads` with the bundled schema packs and a scrubbed environment.
fn ads(args: &[&str]) -> Command {
    let mut cmd = Command::new(cargo_bin());
    for (key, _) in env::vars() {
        if key.starts_with("ADS_") {
            cmd.env_remove(key);
        }
    }
    cmd.env_remove("RUST_LOG")
        .arg("--schema-dir")
        .arg(repo_root().join("schemas"))
        .args(args);
    cmd
}

async fn run(cmd: Command) -> Output {
    let mut cmd = cmd;
    tokio::task::spawn_blocking(move || cmd.output().expect("ads should run"))
        .await
        .expect("blocking task should finish")
}

fn assert_exit_code(output: &Output, expected: i32) {
    assert_eq!(
        output.status.code(),
        Some(expected),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn envelope(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be a JSON envelope")
}

#[test]
fn lint_strict_violation_exits_3() {
    let output = ads(&["--strict", "lint", "GET", "act_1/campaigns", "-f", "id,spend"])
        .output()
        .unwrap();

    assert_exit_code(&output, 3);
    let env = envelope(&output);
    assert_eq!(env["success"], false);
    assert_eq!(env["error"]["kind"], "lint");
    assert_eq!(env["error"]["issues"][0]["code"], "UNKNOWN_FIELD");
    assert_eq!(env["error"]["issues"][0]["name"], "spend");
}

#[test]
fn lint_non_strict_reports_warnings_and_succeeds() {
    let output = ads(&["lint", "POST", "act_1/adsets", "-p", "name=x", "-p", "bid_cap=5"])
        .output()
        .unwrap();

    assert_exit_code(&output, 0);
    let env = envelope(&output);
    assert_eq!(env["data"]["endpoint"], "adset.post");
    assert!(env["warnings"][0].as_str().unwrap().contains("bid_cap"));
}

#[test]
fn deprecated_param_warns_even_in_strict_mode() {
    let output = ads(&["--strict", "lint", "POST", "act_1/campaigns", "-p", "pacing_type=standard"])
        .output()
        .unwrap();

    assert_exit_code(&output, 0);
    assert!(envelope(&output)["warnings"][0]
        .as_str()
        .unwrap()
        .contains("pacing_type"));
}

#[test]
fn schema_list_and_show() {
    let output = ads(&["schema", "list"]).output().unwrap();
    assert_exit_code(&output, 0);
    assert_eq!(envelope(&output)["data"]["versions"], json!(["v21.0"]));

    let output = ads(&["schema", "show", "--entity", "campaign"]).output().unwrap();
    assert_exit_code(&output, 0);
    let env = envelope(&output);
    let data = &env["data"];
    assert_eq!(data["pack"], "marketing/v21.0");
    assert!(data["endpoints"]["campaign.post"]["params"]
        .as_array()
        .unwrap()
        .contains(&json!("objective")));
}

#[test]
fn missing_schema_pack_exits_4() {
    let output = ads(&["--api-version", "v2.0", "lint", "GET", "act_1/ads"])
        .output()
        .unwrap();
    assert_exit_code(&output, 4);
    assert_eq!(envelope(&output)["error"]["kind"], "schema_not_found");
}

#[test]
fn missing_token_exits_5() {
    let output = ads(&["get", "act_1/campaigns", "-f", "id"]).output().unwrap();
    assert_exit_code(&output, 5);
    let message = envelope(&output)["error"]["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(message.contains("ADS_ACCESS_TOKEN"));
}

#[test]
fn malformed_param_is_usage_error() {
    let output = ads(&["post", "act_1/ads", "-p", "oops"]).output().unwrap();
    assert_exit_code(&output, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_sends_fields_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/act_1/campaigns"))
        .and(query_param("fields", "id,name"))
        .and(header("authorization", "Bearer EAAB-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "1", "name": "Spring"}],
            "paging": {"cursors": {"before": "a", "after": "b"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = ads(&["--base-url", server.uri().as_str(), "get", "act_1/campaigns", "-f", "id,name"]);
    cmd.env("ADS_ACCESS_TOKEN", "EAAB-test");
    let output = run(cmd).await;

    assert_exit_code(&output, 0);
    let env = envelope(&output);
    assert_eq!(env["data"]["data"][0]["name"], "Spring");
    assert_eq!(env["paging"]["cursors"]["after"], "b");
}

#[tokio::test(flavor = "multi_thread")]
async fn post_writes_ledger_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v21.0/act_1/adsets"))
        .and(body_string_contains("name=Prospecting"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "2385"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let ledger = dir.path().join("created.jsonl");
    let mut cmd = ads(&[
        "--base-url",
        server.uri().as_str(),
        "--ledger",
        ledger.to_str().unwrap(),
        "post",
        "act_1/adsets",
        "-p",
        "name=Prospecting",
        "-p",
        "campaign_id=9",
    ]);
    cmd.env("ADS_ACCESS_TOKEN", "EAAB-test");
    let output = run(cmd).await;

    assert_exit_code(&output, 0);
    let raw = fs::read_to_string(&ledger).unwrap();
    let entry: Value = serde_json::from_str(raw.lines().next().unwrap()).unwrap();
    assert_eq!(entry["kind"], "adset");
    assert_eq!(entry["id"], "2385");
    assert_eq!(entry["cleanup_action"], "DELETE 2385");
}

#[tokio::test(flavor = "multi_thread")]
async fn lint_failure_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = ads(&[
        "--strict",
        "--base-url",
        server.uri().as_str(),
        "post",
        "act_1/ads",
        "-p",
        "bogus=1",
    ]);
    cmd.env("ADS_ACCESS_TOKEN", "EAAB-test");
    let output = run(cmd).await;

    assert_exit_code(&output, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn api_error_is_classified_in_text_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": {
            "message": "(#100) Tried accessing nonexisting field (spend) on node type (Campaign)",
            "type": "OAuthException",
            "code": 100,
            "fbtrace_id": "Bq7"
        }})))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = ads(&[
        "--skip-lint",
        "--format",
        "text",
        "--base-url",
        server.uri().as_str(),
        "get",
        "123",
        "-f",
        "spend",
    ]);
    cmd.env("ADS_ACCESS_TOKEN", "EAAB-test");
    let output = run(cmd).await;

    assert_exit_code(&output, 1);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("warning: Schema lint skipped"));
    assert!(stdout.contains("get failed: OAuthException (#100"));
    assert!(stdout.contains("validation"));
}

#[tokio::test(flavor = "multi_thread")]
async fn deadline_exits_with_cancelled_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "1"}))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let mut cmd = ads(&[
        "--deadline",
        "1",
        "--base-url",
        server.uri().as_str(),
        "get",
        "act_1/campaigns",
        "-f",
        "id",
    ]);
    cmd.env("ADS_ACCESS_TOKEN", "EAAB-test");
    let started = Instant::now();
    let output = run(cmd).await;

    assert_exit_code(&output, 6);
    assert!(started.elapsed() < Duration::from_secs(20));
    let env = envelope(&output);
    assert_eq!(env["error"]["kind"], "cancelled");
    assert!(env["error"]["message"]
        .as_str()
        .unwrap()
        .contains("deadline exceeded"));
}
