//! Builder for assembling a [`Gateway`].

use std::sync::Arc;
use std::time::Duration;

use jimini_audit::AuditChain;
use jimini_crypto::HashAlgo;
use jimini_forwarder::Forwarder;
use jimini_llm::TextClassifier;
use jimini_rules::RuleStore;

use crate::engine::Gateway;
use crate::error::GatewayError;
use crate::telemetry::Telemetry;

/// Default timeout for one external classifier call.
const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(2);

/// Assembles a [`Gateway`] from its collaborators.
///
/// Rules, chain, and forwarder are required; the classifier is optional
/// (rules with only an `llm_prompt` simply never fire without one).
pub struct GatewayBuilder {
    shadow_mode: bool,
    hash_algo: HashAlgo,
    rules: Option<Arc<RuleStore>>,
    chain: Option<Arc<AuditChain>>,
    forwarder: Option<Forwarder>,
    classifier: Option<Arc<dyn TextClassifier>>,
    classifier_timeout: Duration,
}

impl GatewayBuilder {
    /// Start a builder with defaults: enforce mode, SHA3-256, no classifier.
    pub fn new() -> Self {
        Self {
            shadow_mode: false,
            hash_algo: HashAlgo::default(),
            rules: None,
            chain: None,
            forwarder: None,
            classifier: None,
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }

    /// Set the global shadow switch.
    #[must_use]
    pub fn shadow_mode(mut self, shadow: bool) -> Self {
        self.shadow_mode = shadow;
        self
    }

    /// Set the digest used for `text_hash` (normally the chain's algorithm).
    #[must_use]
    pub fn hash_algo(mut self, algo: HashAlgo) -> Self {
        self.hash_algo = algo;
        self
    }

    /// Set the rule store.
    #[must_use]
    pub fn rules(mut self, rules: Arc<RuleStore>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the audit chain.
    #[must_use]
    pub fn chain(mut self, chain: Arc<AuditChain>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Set the forwarder.
    #[must_use]
    pub fn forwarder(mut self, forwarder: Forwarder) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Attach the optional external classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: Arc<dyn TextClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Override the per-call classifier timeout.
    #[must_use]
    pub fn classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = timeout;
        self
    }

    /// Build the gateway.
    ///
    /// Returns a configuration error naming the first missing collaborator.
    pub fn build(self) -> Result<Gateway, GatewayError> {
        let missing = |what: &str| GatewayError::Configuration(format!("gateway requires {what}"));
        Ok(Gateway {
            shadow_mode: self.shadow_mode,
            rules: self.rules.ok_or_else(|| missing("a rule store"))?,
            chain: self.chain.ok_or_else(|| missing("an audit chain"))?,
            forwarder: self.forwarder.ok_or_else(|| missing("a forwarder"))?,
            classifier: self.classifier,
            classifier_timeout: self.classifier_timeout,
            hash_algo: self.hash_algo,
            telemetry: Arc::new(Telemetry::new()),
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_rules_fails() {
        let err = GatewayBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("rule store"));
    }
}
