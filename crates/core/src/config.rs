//! Gateway configuration captured once at startup.
//!
//! There is no global mutable state: the config is read from the environment
//! in `main`, then threaded explicitly through the decision engine, audit
//! chain, and forwarder constructors.

use std::path::PathBuf;

/// Immutable configuration for the evaluation engine and audit plane.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Global shadow switch: when on, decisions are reported as `allow`
    /// while the would-have-been action is recorded.
    pub shadow_mode: bool,
    /// Path to the YAML rules source.
    pub rules_path: PathBuf,
    /// Path of the append-only audit chain (JSON Lines).
    pub audit_log_path: PathBuf,
    /// Path of the dead-letter queue (JSON Lines).
    pub dlq_path: PathBuf,
    /// Hash algorithm label: `sha3_256` (default), `sha3_512`, or `sha256`.
    pub hash_algo: String,
    /// Signature algorithm label: `ed25519` or `none`.
    pub sig_algo: String,
    /// Path to the Ed25519 signing seed (32-byte hex).
    pub signing_key_path: PathBuf,
    /// Path to the Ed25519 public key (32-byte hex).
    pub signing_pub_path: PathBuf,
}

impl GatewayConfig {
    /// Capture the gateway configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            shadow_mode: std::env::var("JIMINI_SHADOW").as_deref() == Ok("1"),
            rules_path: env_path("JIMINI_RULES_PATH", "policy_rules.yaml"),
            audit_log_path: env_path("AUDIT_LOG_PATH", "logs/audit.jsonl"),
            dlq_path: env_path("JIMINI_DLQ_PATH", "logs/deadletter.jsonl"),
            hash_algo: env_or("JIMINI_HASH_ALGO", "sha3_256"),
            sig_algo: env_or("JIMINI_SIG_ALGO", "none").to_lowercase(),
            signing_key_path: env_path("JIMINI_SIGNING_KEY", "keys/jimini_ed25519.key"),
            signing_pub_path: env_path("JIMINI_SIGNING_PUB", "keys/jimini_ed25519.pub"),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            shadow_mode: false,
            rules_path: PathBuf::from("policy_rules.yaml"),
            audit_log_path: PathBuf::from("logs/audit.jsonl"),
            dlq_path: PathBuf::from("logs/deadletter.jsonl"),
            hash_algo: "sha3_256".to_owned(),
            sig_algo: "none".to_owned(),
            signing_key_path: PathBuf::from("keys/jimini_ed25519.key"),
            signing_pub_path: PathBuf::from("keys/jimini_ed25519.pub"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).map_or_else(|_| PathBuf::from(default), PathBuf::from)
}
