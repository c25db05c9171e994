//! Evaluation counters.
//!
//! Two concurrent maps with atomic per-key increments: one keyed by
//! `(endpoint, direction, rule_id, action)` for every firing rule, one keyed
//! by `(endpoint, direction, action)` for the final decision. Reads
//! aggregate on demand; the hot path only ever touches its own keys.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use jimini_core::{Action, Direction};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RuleKey {
    endpoint: String,
    direction: Direction,
    rule_id: String,
    action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DecisionKey {
    endpoint: String,
    direction: Direction,
    action: Action,
}

/// Aggregated counters for the metrics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    /// Final decision counts by action.
    pub totals: BTreeMap<String, u64>,
    /// Firing counts by rule id.
    pub by_rule: BTreeMap<String, u64>,
    /// External classifier failures (treated as did-not-fire).
    pub classifier_errors: u64,
}

/// Concurrent evaluation counters.
#[derive(Debug, Default)]
pub struct Telemetry {
    rules: DashMap<RuleKey, u64>,
    decisions: DashMap<DecisionKey, u64>,
    classifier_errors: AtomicU64,
}

impl Telemetry {
    /// Create an empty counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one firing rule under the decision's original action.
    pub fn record_rule(
        &self,
        endpoint: &str,
        direction: Direction,
        rule_id: &str,
        action: Action,
    ) {
        let key = RuleKey {
            endpoint: endpoint.to_owned(),
            direction,
            rule_id: rule_id.to_owned(),
            action,
        };
        *self.rules.entry(key).or_insert(0) += 1;
    }

    /// Count one final decision.
    pub fn record_decision(&self, endpoint: &str, direction: Direction, action: Action) {
        let key = DecisionKey {
            endpoint: endpoint.to_owned(),
            direction,
            action,
        };
        *self.decisions.entry(key).or_insert(0) += 1;
    }

    /// Count one classifier failure.
    pub fn record_classifier_error(&self) {
        self.classifier_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Aggregate the keyed counters for the metrics endpoint.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut totals: BTreeMap<String, u64> = BTreeMap::new();
        for entry in &self.decisions {
            *totals.entry(entry.key().action.as_str().to_owned()).or_default() += *entry.value();
        }

        let mut by_rule: BTreeMap<String, u64> = BTreeMap::new();
        for entry in &self.rules {
            *by_rule.entry(entry.key().rule_id.clone()).or_default() += *entry.value();
        }

        TelemetrySnapshot {
            totals,
            by_rule,
            classifier_errors: self.classifier_errors.load(Ordering::Relaxed),
        }
    }
}
