//! SARIF export of the audit chain.
//!
//! Renders every non-allow record as a SARIF 2.1.0 result so compliance
//! tooling can ingest gateway decisions alongside static-analysis findings.
//! This is a read-only projection; the chain file is never modified and the
//! output is not hashed.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::json;
use tracing::warn;

use jimini_core::Action;

use crate::error::AuditError;
use crate::record::AuditRecord;

/// SARIF level for a gateway action.
fn level_for(action: Action) -> &'static str {
    match action {
        Action::Block => "error",
        Action::Flag => "warning",
        Action::Allow => "note",
    }
}

/// Build a SARIF 2.1.0 document from the chain at `path`.
///
/// Corrupt lines are skipped with a warning; tamper detection is the
/// verifier's job, not the exporter's.
pub fn export_sarif(path: &Path) -> Result<serde_json::Value, AuditError> {
    let mut results = Vec::new();
    let mut rule_ids: BTreeSet<String> = BTreeSet::new();

    if path.exists() {
        let reader = BufReader::new(File::open(path)?);
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: AuditRecord = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    warn!(index = idx, error = %e, "skipping corrupt audit line in SARIF export");
                    continue;
                }
            };
            if record.action == Action::Allow {
                continue;
            }

            rule_ids.extend(record.rule_ids.iter().cloned());
            results.push(json!({
                "ruleId": record.rule_ids.first().cloned().unwrap_or_else(|| "UNMATCHED".to_owned()),
                "level": level_for(record.action),
                "message": {
                    "text": format!(
                        "{} on {} {} (rules: {})",
                        record.action,
                        record.direction,
                        record.endpoint,
                        record.rule_ids.join(", "),
                    ),
                },
                "properties": {
                    "timestamp": record.timestamp,
                    "request_id": record.request_id,
                    "endpoint": record.endpoint,
                    "direction": record.direction.as_str(),
                    "action": record.action.as_str(),
                    "rule_ids": record.rule_ids,
                },
            }));
        }
    }

    let rules: Vec<_> = rule_ids
        .into_iter()
        .map(|id| json!({ "id": id }))
        .collect();

    Ok(json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "jimini",
                    "version": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "results": results,
        }],
    }))
}

#[cfg(test)]
mod tests {
    use jimini_core::Direction;
    use jimini_crypto::{HashAlgo, RecordSigner};

    use super::*;
    use crate::chain::AuditChain;
    use crate::record::RecordDraft;

    #[test]
    fn only_non_allow_records_are_exported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let chain = AuditChain::open(&path, HashAlgo::Sha3_256, RecordSigner::disabled()).unwrap();

        for (action, rules) in [
            (Action::Allow, vec![]),
            (Action::Block, vec!["OPENAI-KEY-1.0".to_owned()]),
            (Action::Flag, vec!["LEN-1.0".to_owned()]),
        ] {
            chain
                .append(RecordDraft::new(
                    "req_000000000000",
                    "agent",
                    "/v1/chat",
                    Direction::Response,
                    action,
                    rules,
                    "cd".repeat(32),
                    "excerpt",
                ))
                .unwrap();
        }

        let doc = export_sarif(&path).unwrap();
        assert_eq!(doc["version"], "2.1.0");

        let results = doc["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["level"], "error");
        assert_eq!(results[0]["ruleId"], "OPENAI-KEY-1.0");
        assert_eq!(results[1]["level"], "warning");

        let rules = doc["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn missing_chain_exports_empty_document() {
        let doc = export_sarif(Path::new("/nonexistent/audit.jsonl")).unwrap();
        assert!(doc["runs"][0]["results"].as_array().unwrap().is_empty());
    }
}
