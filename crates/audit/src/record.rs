use serde::{Deserialize, Serialize};

use jimini_core::{Action, Direction};

/// Algorithm labels stamped into every record.
///
/// Verification reads these per record rather than trusting a global, so a
/// chain written across a configuration change still verifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgoLabels {
    /// Chain digest algorithm (`sha3_256`, `sha3_512`, `sha256`).
    pub hash: String,
    /// Signature algorithm (`ed25519` or `none`).
    pub sig: String,
}

/// One line of the audit chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// UTC ISO-8601 timestamp with millisecond precision.
    pub timestamp: String,
    /// Correlation id of the evaluation.
    pub request_id: String,
    /// Agent on whose behalf the message crossed the boundary.
    pub agent_id: String,
    /// Caller endpoint.
    pub endpoint: String,
    /// Message direction.
    pub direction: Direction,
    /// The *original* action, before any shadow downgrade.
    pub action: Action,
    /// Firing rule ids after suppression, sorted.
    pub rule_ids: Vec<String>,
    /// Digest of the original (unredacted) text.
    pub text_hash: String,
    /// First 200 characters of the redacted text.
    pub text_excerpt: String,
    /// `record_hash` of the previous record; 64 zeros for the first.
    pub previous_hash: String,
    /// Digest of this record's canonical form.
    pub record_hash: String,
    /// Algorithms this record was written under.
    pub algo_labels: AlgoLabels,
    /// Detached base64 Ed25519 signature over `record_hash`, when signing
    /// is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl AuditRecord {
    /// Canonical bytes for hashing: the JSON object with `record_hash` and
    /// `signature` removed, keys in lexicographic order, no whitespace, no
    /// trailing newline.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(map) = value.as_object_mut() {
            map.remove("record_hash");
            map.remove("signature");
        }
        // serde_json maps are BTreeMap-backed, so key order is already
        // lexicographic in the serialized form.
        Ok(serde_json::to_string(&value)?.into_bytes())
    }
}

/// The hashless precursor handed to the chain writer.
///
/// The writer owns `previous_hash`, `record_hash`, `algo_labels`, and
/// `signature`; everything else is fixed by the decision engine.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub timestamp: String,
    pub request_id: String,
    pub agent_id: String,
    pub endpoint: String,
    pub direction: Direction,
    pub action: Action,
    pub rule_ids: Vec<String>,
    pub text_hash: String,
    pub text_excerpt: String,
}

impl RecordDraft {
    /// Create a draft stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        request_id: impl Into<String>,
        agent_id: impl Into<String>,
        endpoint: impl Into<String>,
        direction: Direction,
        action: Action,
        rule_ids: Vec<String>,
        text_hash: impl Into<String>,
        text_excerpt: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: jimini_core::now_iso(),
            request_id: request_id.into(),
            agent_id: agent_id.into(),
            endpoint: endpoint.into(),
            direction,
            action,
            rule_ids,
            text_hash: text_hash.into(),
            text_excerpt: text_excerpt.into(),
        }
    }
}
