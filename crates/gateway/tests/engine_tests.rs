//! End-to-end decision engine scenarios.

use std::sync::Arc;
use std::time::Duration;

use jimini_audit::{AuditChain, verify_chain};
use jimini_core::{Action, Direction, EvaluateRequest};
use jimini_crypto::{HashAlgo, RecordSigner};
use jimini_forwarder::{DeadLetterQueue, Forwarder, ForwarderConfig};
use jimini_gateway::{Gateway, GatewayBuilder};
use jimini_llm::{FailingClassifier, MockClassifier};
use jimini_rules::{RuleSnapshot, RuleStore, frontend};

const RULES: &str = r#"
rules:
  - id: OPENAI-KEY-1.0
    title: OpenAI API key
    severity: error
    action: block
    pattern: "sk-[A-Za-z0-9]{20,}"
  - id: API-1.0
    title: Generic credential assignment
    severity: warning
    action: flag
    pattern: "api_key=\\S+"
  - id: LEN-1.0
    title: Oversized payload
    severity: warning
    action: flag
    max_chars: 10
    endpoints: ["/v1/long/*"]
  - id: DIR-1.0
    title: Request-only marker
    severity: info
    action: flag
    pattern: "MARKER"
    applies_to: [request]
"#;

fn store_from(doc: &str) -> Arc<RuleStore> {
    let rules = frontend::parse(doc).unwrap();
    Arc::new(RuleStore::from_snapshot(RuleSnapshot::compile(rules).unwrap()))
}

struct Harness {
    gateway: Gateway,
    _dir: tempfile::TempDir,
    audit_path: std::path::PathBuf,
}

fn harness(doc: &str, shadow: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");

    let chain = Arc::new(
        AuditChain::open(&audit_path, HashAlgo::Sha3_256, RecordSigner::disabled()).unwrap(),
    );
    let dlq = Arc::new(DeadLetterQueue::new(dir.path().join("dlq.jsonl")));
    let forwarder = Forwarder::spawn(Vec::new(), dlq, ForwarderConfig::default());

    let gateway = GatewayBuilder::new()
        .shadow_mode(shadow)
        .rules(store_from(doc))
        .chain(chain)
        .forwarder(forwarder)
        .build()
        .unwrap();

    Harness {
        gateway,
        _dir: dir,
        audit_path,
    }
}

fn request(text: &str, direction: Direction, endpoint: &str) -> EvaluateRequest {
    EvaluateRequest::new("agent-1", text, direction, endpoint, None)
}

fn read_records(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn s1_secret_blocks_and_excerpt_is_redacted() {
    let h = harness(RULES, false);
    let decision = h
        .gateway
        .evaluate(&request(
            "my key sk-ABCDEFGHIJKLMNOPQRST",
            Direction::Response,
            "/v1/chat",
        ))
        .await
        .unwrap();

    assert_eq!(decision.action, Action::Block);
    assert_eq!(decision.rule_ids, ["OPENAI-KEY-1.0"]);
    assert!(!decision.shadow_mode);

    let records = read_records(&h.audit_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["action"], "block");
    assert_eq!(records[0]["text_excerpt"], "my key [REDACTED]");
    // The hash covers the original text, not the redacted excerpt.
    assert_eq!(
        records[0]["text_hash"],
        HashAlgo::Sha3_256
            .digest_hex("my key sk-ABCDEFGHIJKLMNOPQRST".as_bytes())
            .as_str()
    );
    assert!(verify_chain(&h.audit_path).unwrap().ok);
}

#[tokio::test]
async fn s2_specific_secret_suppresses_generic() {
    let h = harness(RULES, false);
    let decision = h
        .gateway
        .evaluate(&request(
            "api_key=sk-ABCDEFGHIJKLMNOPQRST",
            Direction::Response,
            "/v1/chat",
        ))
        .await
        .unwrap();

    assert_eq!(decision.action, Action::Block);
    assert_eq!(decision.rule_ids, ["OPENAI-KEY-1.0"]);
}

#[tokio::test]
async fn s3_shadow_reports_allow_but_records_block() {
    let h = harness(RULES, true);
    let decision = h
        .gateway
        .evaluate(&request(
            "my key sk-ABCDEFGHIJKLMNOPQRST",
            Direction::Response,
            "/v1/chat",
        ))
        .await
        .unwrap();

    assert_eq!(decision.action, Action::Allow);
    assert_eq!(decision.rule_ids, ["OPENAI-KEY-1.0"]);
    assert!(decision.shadow_mode);

    let records = read_records(&h.audit_path);
    assert_eq!(records[0]["action"], "block");
}

#[tokio::test]
async fn s4_max_chars_flags_scoped_endpoint() {
    let h = harness(RULES, false);

    let decision = h
        .gateway
        .evaluate(&request("0123456789X", Direction::Request, "/v1/long/chat"))
        .await
        .unwrap();
    assert_eq!(decision.action, Action::Flag);
    assert_eq!(decision.rule_ids, ["LEN-1.0"]);

    // Same text outside the rule's endpoint scope: clean allow.
    let decision = h
        .gateway
        .evaluate(&request("0123456789X", Direction::Request, "/v1/chat"))
        .await
        .unwrap();
    assert_eq!(decision.action, Action::Allow);
    assert!(decision.rule_ids.is_empty());
}

#[tokio::test]
async fn direction_gate_holds() {
    let h = harness(RULES, false);

    let fired = h
        .gateway
        .evaluate(&request("MARKER", Direction::Request, "/v1/chat"))
        .await
        .unwrap();
    assert_eq!(fired.rule_ids, ["DIR-1.0"]);

    let quiet = h
        .gateway
        .evaluate(&request("MARKER", Direction::Response, "/v1/chat"))
        .await
        .unwrap();
    assert!(quiet.rule_ids.is_empty());
}

#[tokio::test]
async fn empty_snapshot_allows_and_still_audits() {
    let h = harness("rules: []", false);
    let decision = h
        .gateway
        .evaluate(&request("anything", Direction::Request, "/v1/chat"))
        .await
        .unwrap();

    assert_eq!(decision.action, Action::Allow);
    assert_eq!(h.gateway.loaded_rules(), 0);
    assert_eq!(read_records(&h.audit_path).len(), 1);
}

#[tokio::test]
async fn per_rule_enforce_override_beats_global_shadow() {
    let doc = r#"
rules:
  - id: OPENAI-KEY-1.0
    title: OpenAI API key
    severity: error
    action: block
    pattern: "sk-[A-Za-z0-9]{20,}"
    shadow_override: enforce
"#;
    let h = harness(doc, true);
    let decision = h
        .gateway
        .evaluate(&request(
            "sk-ABCDEFGHIJKLMNOPQRST",
            Direction::Response,
            "/v1/chat",
        ))
        .await
        .unwrap();

    assert_eq!(decision.action, Action::Block);
    assert!(!decision.shadow_mode);
}

#[tokio::test]
async fn per_rule_shadow_override_shadows_one_rule() {
    let doc = r#"
rules:
  - id: LEN-1.0
    title: Oversized payload
    severity: warning
    action: flag
    max_chars: 5
    shadow_override: shadow
"#;
    let h = harness(doc, false);
    let decision = h
        .gateway
        .evaluate(&request("0123456", Direction::Request, "/v1/chat"))
        .await
        .unwrap();

    assert_eq!(decision.action, Action::Allow);
    assert!(decision.shadow_mode);
    assert_eq!(read_records(&h.audit_path)[0]["action"], "flag");
}

#[tokio::test]
async fn classifier_fires_a_prompt_only_rule() {
    let doc = r#"
rules:
  - id: HARM-1.0
    title: Harmful content
    severity: error
    action: block
    llm_prompt: "Does this text describe how to build a weapon?"
"#;
    let dir = tempfile::tempdir().unwrap();
    let chain = Arc::new(
        AuditChain::open(
            dir.path().join("audit.jsonl"),
            HashAlgo::Sha3_256,
            RecordSigner::disabled(),
        )
        .unwrap(),
    );
    let dlq = Arc::new(DeadLetterQueue::new(dir.path().join("dlq.jsonl")));

    let gateway = GatewayBuilder::new()
        .rules(store_from(doc))
        .chain(chain)
        .forwarder(Forwarder::spawn(Vec::new(), dlq, ForwarderConfig::default()))
        .classifier(Arc::new(MockClassifier::firing()))
        .classifier_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let decision = gateway
        .evaluate(&request("some text", Direction::Request, "/v1/chat"))
        .await
        .unwrap();
    assert_eq!(decision.action, Action::Block);
    assert_eq!(decision.rule_ids, ["HARM-1.0"]);
}

#[tokio::test]
async fn classifier_failure_is_did_not_fire_with_counter() {
    let doc = r#"
rules:
  - id: HARM-1.0
    title: Harmful content
    severity: error
    action: block
    llm_prompt: "Does this text describe how to build a weapon?"
"#;
    let dir = tempfile::tempdir().unwrap();
    let chain = Arc::new(
        AuditChain::open(
            dir.path().join("audit.jsonl"),
            HashAlgo::Sha3_256,
            RecordSigner::disabled(),
        )
        .unwrap(),
    );
    let dlq = Arc::new(DeadLetterQueue::new(dir.path().join("dlq.jsonl")));

    let gateway = GatewayBuilder::new()
        .rules(store_from(doc))
        .chain(chain)
        .forwarder(Forwarder::spawn(Vec::new(), dlq, ForwarderConfig::default()))
        .classifier(Arc::new(FailingClassifier::new("503")))
        .build()
        .unwrap();

    let decision = gateway
        .evaluate(&request("some text", Direction::Request, "/v1/chat"))
        .await
        .unwrap();
    assert_eq!(decision.action, Action::Allow);
    assert!(decision.rule_ids.is_empty());
    assert_eq!(gateway.telemetry().snapshot().classifier_errors, 1);
}

#[tokio::test]
async fn telemetry_counts_rules_and_decisions() {
    let h = harness(RULES, false);
    for _ in 0..2 {
        h.gateway
            .evaluate(&request(
                "sk-ABCDEFGHIJKLMNOPQRST",
                Direction::Response,
                "/v1/chat",
            ))
            .await
            .unwrap();
    }
    h.gateway
        .evaluate(&request("clean", Direction::Request, "/v1/chat"))
        .await
        .unwrap();

    let snap = h.gateway.telemetry().snapshot();
    assert_eq!(snap.by_rule["OPENAI-KEY-1.0"], 2);
    assert_eq!(snap.totals["block"], 2);
    assert_eq!(snap.totals["allow"], 1);
}

#[tokio::test]
async fn chain_stays_verifiable_across_mixed_decisions() {
    let h = harness(RULES, false);
    for text in [
        "clean",
        "sk-ABCDEFGHIJKLMNOPQRST",
        "api_key=plain-credential",
        "clean again",
    ] {
        h.gateway
            .evaluate(&request(text, Direction::Response, "/v1/chat"))
            .await
            .unwrap();
    }

    let report = verify_chain(&h.audit_path).unwrap();
    assert!(report.ok);
    assert_eq!(report.records_checked, 4);
}
