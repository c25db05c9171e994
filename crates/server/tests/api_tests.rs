use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{Value, json};

use jimini_audit::AuditChain;
use jimini_crypto::{HashAlgo, RecordSigner};
use jimini_forwarder::{DeadLetterQueue, Forwarder, ForwarderConfig};
use jimini_gateway::GatewayBuilder;
use jimini_rules::{RuleSnapshot, RuleStore, frontend};
use jimini_server::api::{AppState, router};

const API_KEY: &str = "test-key";

const RULES: &str = r#"
rules:
  - id: OPENAI-KEY-1.0
    title: OpenAI API key
    severity: error
    action: block
    pattern: "sk-[A-Za-z0-9]{20,}"
  - id: LEN-1.0
    title: Oversized payload
    severity: warning
    action: flag
    max_chars: 1000
"#;

struct TestApp {
    server: TestServer,
    audit_path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");

    let rules = frontend::parse(RULES).unwrap();
    let store = Arc::new(RuleStore::from_snapshot(RuleSnapshot::compile(rules).unwrap()));
    let chain = Arc::new(
        AuditChain::open(&audit_path, HashAlgo::Sha3_256, RecordSigner::disabled()).unwrap(),
    );
    let dlq = Arc::new(DeadLetterQueue::new(dir.path().join("dlq.jsonl")));
    let forwarder = Forwarder::spawn(Vec::new(), dlq, ForwarderConfig::default());

    let gateway = GatewayBuilder::new()
        .rules(store)
        .chain(chain)
        .forwarder(forwarder)
        .build()
        .expect("gateway should build");

    let state = AppState {
        gateway: Arc::new(gateway),
        api_key: Arc::new(API_KEY.to_owned()),
    };

    TestApp {
        server: TestServer::new(router(state)).unwrap(),
        audit_path,
        _dir: dir,
    }
}

fn evaluate_body(text: &str) -> Value {
    json!({
        "api_key": API_KEY,
        "agent_id": "agent-1",
        "text": text,
        "direction": "response",
        "endpoint": "/v1/chat",
    })
}

#[tokio::test]
async fn evaluate_blocks_a_secret() {
    let app = test_app();
    let response = app
        .server
        .post("/v1/evaluate")
        .json(&evaluate_body("my key sk-ABCDEFGHIJKLMNOPQRST"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["action"], "block");
    assert_eq!(body["rule_ids"], json!(["OPENAI-KEY-1.0"]));
    assert_eq!(body["shadow_mode"], false);
    assert!(body["request_id"].as_str().unwrap().starts_with("req_"));
}

#[tokio::test]
async fn evaluate_allows_clean_text_and_echoes_request_id() {
    let app = test_app();
    let mut body = evaluate_body("hello world");
    body["request_id"] = json!("req_caller000001");

    let response = app.server.post("/v1/evaluate").json(&body).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["action"], "allow");
    assert_eq!(body["message"], "OK");
    assert_eq!(body["request_id"], "req_caller000001");
}

#[tokio::test]
async fn wrong_api_key_is_unauthorized_and_unaudited() {
    let app = test_app();
    let mut body = evaluate_body("sk-ABCDEFGHIJKLMNOPQRST");
    body["api_key"] = json!("wrong");

    let response = app.server.post("/v1/evaluate").json(&body).await;
    response.assert_status_unauthorized();
    assert!(!app.audit_path.exists() || std::fs::read_to_string(&app.audit_path).unwrap().is_empty());
}

#[tokio::test]
async fn missing_field_is_bad_request() {
    let app = test_app();
    let mut body = evaluate_body("hello");
    body.as_object_mut().unwrap().remove("text");

    let response = app.server.post("/v1/evaluate").json(&body).await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "bad request: missing field: text");
}

#[tokio::test]
async fn bad_direction_is_bad_request() {
    let app = test_app();
    let mut body = evaluate_body("hello");
    body["direction"] = json!("sideways");

    let response = app.server.post("/v1/evaluate").json(&body).await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn unknown_fields_are_ignored() {
    let app = test_app();
    let mut body = evaluate_body("hello");
    body["future_field"] = json!({"nested": true});

    let response = app.server.post("/v1/evaluate").json(&body).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn health_reports_rules_and_mode() {
    let app = test_app();
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["loaded_rules"], 2);
    assert_eq!(body["shadow_mode"], false);
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn metrics_aggregate_decisions() {
    let app = test_app();
    app.server
        .post("/v1/evaluate")
        .json(&evaluate_body("sk-ABCDEFGHIJKLMNOPQRST"))
        .await
        .assert_status_ok();
    app.server
        .post("/v1/evaluate")
        .json(&evaluate_body("clean"))
        .await
        .assert_status_ok();

    let response = app.server.get("/v1/metrics").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["loaded_rules"], 2);
    assert_eq!(body["totals"]["block"], 1);
    assert_eq!(body["totals"]["allow"], 1);
    assert_eq!(body["by_rule"]["OPENAI-KEY-1.0"], 1);
}

#[tokio::test]
async fn audit_verify_detects_tampering() {
    let app = test_app();
    for i in 0..5 {
        app.server
            .post("/v1/evaluate")
            .json(&evaluate_body(&format!("message {i}")))
            .await
            .assert_status_ok();
    }

    let response = app.server.get("/v1/audit/verify").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["records_checked"], 5);

    // Flip a byte in record 2.
    let content = std::fs::read_to_string(&app.audit_path).unwrap();
    let mutated: Vec<String> = content
        .lines()
        .enumerate()
        .map(|(i, l)| {
            if i == 2 {
                l.replace("message 2", "message X")
            } else {
                l.to_owned()
            }
        })
        .collect();
    std::fs::write(&app.audit_path, mutated.join("\n") + "\n").unwrap();

    let response = app.server.get("/v1/audit/verify").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["first_bad_index"], 2);
}

#[tokio::test]
async fn sarif_exports_non_allow_decisions() {
    let app = test_app();
    app.server
        .post("/v1/evaluate")
        .json(&evaluate_body("sk-ABCDEFGHIJKLMNOPQRST"))
        .await
        .assert_status_ok();
    app.server
        .post("/v1/evaluate")
        .json(&evaluate_body("clean"))
        .await
        .assert_status_ok();

    let response = app.server.get("/v1/audit/sarif").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["version"], "2.1.0");
    let results = body["runs"][0]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["ruleId"], "OPENAI-KEY-1.0");
}

#[tokio::test]
async fn dlq_stats_and_breakers_start_empty() {
    let app = test_app();

    let response = app.server.get("/v1/dlq/stats").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_events"], 0);

    let response = app.server.get("/admin/circuit-breakers").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn audited_excerpt_is_redacted() {
    let app = test_app();
    app.server
        .post("/v1/evaluate")
        .json(&evaluate_body("key sk-ABCDEFGHIJKLMNOPQRST here"))
        .await
        .assert_status_ok();

    let content = std::fs::read_to_string(&app.audit_path).unwrap();
    let record: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(record["text_excerpt"], "key [REDACTED] here");
    assert!(!content.contains("sk-ABCDEFGHIJKLMNOPQRST"));
}
