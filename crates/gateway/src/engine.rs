//! The decision engine.
//!
//! Per evaluation: collect the firing set in lexicographic rule-id order,
//! suppress generic catch-alls outranked by specific secret rules, reduce to
//! an action by precedence, resolve shadow mode, redact the audit excerpt,
//! append the record to the chain, and hand it to the forwarder. The caller
//! gets its decision only after the record is durably on disk.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use jimini_audit::{AuditChain, RecordDraft, excerpt, redact_with};
use jimini_core::{
    Action, Decision, EvaluateRequest, ShadowOverride, is_secret_rule, risk_level, risk_score,
    suppress_generic,
};
use jimini_crypto::HashAlgo;
use jimini_forwarder::Forwarder;
use jimini_llm::TextClassifier;
use jimini_rules::{RuleSnapshot, RuleStore};

use crate::error::GatewayError;
use crate::telemetry::Telemetry;

/// Number of characters retained in the audit excerpt.
const EXCERPT_CHARS: usize = 200;

/// The assembled evaluation pipeline.
///
/// Cheap to share behind an `Arc`; every request reads the then-current rule
/// snapshot and holds it for the whole evaluation.
pub struct Gateway {
    pub(crate) shadow_mode: bool,
    pub(crate) rules: Arc<RuleStore>,
    pub(crate) chain: Arc<AuditChain>,
    pub(crate) forwarder: Forwarder,
    pub(crate) classifier: Option<Arc<dyn TextClassifier>>,
    pub(crate) classifier_timeout: Duration,
    pub(crate) hash_algo: HashAlgo,
    pub(crate) telemetry: Arc<Telemetry>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("shadow_mode", &self.shadow_mode)
            .field("classifier_timeout", &self.classifier_timeout)
            .field("hash_algo", &self.hash_algo)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Evaluate one message and durably record the decision.
    ///
    /// Returns an error only when the audit append fails; in that case no
    /// decision is reported and no record exists.
    pub async fn evaluate(&self, request: &EvaluateRequest) -> Result<Decision, GatewayError> {
        let snapshot = self.rules.current();

        let mut fired = self.collect_firing(&snapshot, request).await;
        suppress_generic(&mut fired);

        let original_action = fired
            .iter()
            .filter_map(|id| snapshot.get(id).map(|r| r.rule.action))
            .max()
            .unwrap_or(Action::Allow);

        let shadowed = self.resolve_shadow(&snapshot, &fired);
        let reported_action = if shadowed { Action::Allow } else { original_action };

        for id in &fired {
            self.telemetry
                .record_rule(&request.endpoint, request.direction, id, original_action);
        }
        self.telemetry
            .record_decision(&request.endpoint, request.direction, reported_action);

        let score = risk_score(
            original_action,
            fired.iter().filter_map(|id| {
                snapshot
                    .get(id)
                    .map(|r| (id.as_str(), r.rule.severity))
            }),
        );
        info!(
            request_id = %request.request_id,
            endpoint = %request.endpoint,
            direction = %request.direction,
            action = %original_action,
            shadow = shadowed,
            rules = ?fired,
            risk = score,
            risk_level = risk_level(score).as_str(),
            "decision"
        );

        // Hash the original text; redact only the stored excerpt.
        let text_hash = self.hash_algo.digest_hex(request.text.as_bytes());
        let redactors = fired.iter().filter_map(|id| {
            if !is_secret_rule(id) {
                return None;
            }
            snapshot.get(id).and_then(|r| r.regex.as_ref())
        });
        let text_excerpt = excerpt(&redact_with(&request.text, redactors), EXCERPT_CHARS);

        let record = self.chain.append(RecordDraft::new(
            request.request_id.clone(),
            request.agent_id.clone(),
            request.endpoint.clone(),
            request.direction,
            original_action,
            fired.clone(),
            text_hash,
            text_excerpt,
        ))?;
        self.forwarder.enqueue(record);

        Ok(Decision {
            action: reported_action,
            rule_ids: fired.clone(),
            message: build_message(original_action, shadowed, &fired),
            request_id: request.request_id.clone(),
            shadow_mode: shadowed,
        })
    }

    /// Collect firing rule ids in lexicographic order.
    async fn collect_firing(
        &self,
        snapshot: &RuleSnapshot,
        request: &EvaluateRequest,
    ) -> Vec<String> {
        let mut fired = Vec::new();
        for (id, compiled) in snapshot.iter() {
            if !compiled.in_scope(request.direction, &request.endpoint) {
                continue;
            }

            if compiled.text_fires(&request.text) {
                fired.push(id.clone());
                continue;
            }

            if let Some(prompt) = &compiled.rule.llm_prompt {
                if self.classify(id, prompt, &request.text).await {
                    fired.push(id.clone());
                }
            }
        }
        fired
    }

    /// Run the external classifier for one rule.
    ///
    /// Fail-safe: errors, timeouts, and an absent classifier are all a
    /// single did-not-fire outcome with a telemetry counter; nothing is
    /// surfaced to the caller.
    async fn classify(&self, rule_id: &str, prompt: &str, text: &str) -> bool {
        let Some(classifier) = &self.classifier else {
            return false;
        };

        match tokio::time::timeout(self.classifier_timeout, classifier.classify(prompt, text))
            .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(rule = rule_id, error = %e, "classifier error, treating as did-not-fire");
                self.telemetry.record_classifier_error();
                false
            }
            Err(_) => {
                warn!(rule = rule_id, "classifier timed out, treating as did-not-fire");
                self.telemetry.record_classifier_error();
                false
            }
        }
    }

    /// Resolve the effective enforcement mode for this firing set.
    fn resolve_shadow(&self, snapshot: &RuleSnapshot, fired: &[String]) -> bool {
        let overrides = fired
            .iter()
            .filter_map(|id| snapshot.get(id).map(|r| r.rule.shadow_override));

        let mut any_shadow = false;
        for o in overrides {
            match o {
                ShadowOverride::Enforce => return false,
                ShadowOverride::Shadow => any_shadow = true,
                ShadowOverride::Inherit => {}
            }
        }
        self.shadow_mode || any_shadow
    }

    /// The global shadow switch this gateway was started with.
    pub fn shadow_mode(&self) -> bool {
        self.shadow_mode
    }

    /// Number of rules in the currently served snapshot.
    pub fn loaded_rules(&self) -> usize {
        self.rules.current().len()
    }

    /// The rule store (for the reload watcher and admin surface).
    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    /// The audit chain.
    pub fn chain(&self) -> &Arc<AuditChain> {
        &self.chain
    }

    /// The forwarder handle.
    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// The evaluation counters.
    pub fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }
}

/// Human-readable decision summary for the response body.
fn build_message(action: Action, shadowed: bool, rule_ids: &[String]) -> String {
    let verb = match action {
        Action::Block => "Blocked by policy",
        Action::Flag => "Flagged by policy",
        Action::Allow => return "OK".to_owned(),
    };
    let rules = rule_ids.join(", ");
    if shadowed {
        format!("{verb} (shadow): {rules}")
    } else {
        format!("{verb}: {rules}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_rules() {
        assert_eq!(build_message(Action::Allow, false, &[]), "OK");
        assert_eq!(
            build_message(Action::Block, false, &["OPENAI-KEY-1.0".to_owned()]),
            "Blocked by policy: OPENAI-KEY-1.0"
        );
        assert_eq!(
            build_message(Action::Flag, true, &["LEN-1.0".to_owned()]),
            "Flagged by policy (shadow): LEN-1.0"
        );
    }
}
