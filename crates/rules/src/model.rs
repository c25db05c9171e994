use serde::{Deserialize, Serialize};

use jimini_core::{Action, Direction, Severity, ShadowOverride};

/// Which message directions a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliesTo {
    Request,
    Response,
    Any,
}

/// A single declarative policy rule.
///
/// The three optional predicates are composed by logical OR: a rule fires
/// when any one of them holds. At least one must be present; a rule with
/// none is rejected at load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Unique, stable identifier, e.g. `OPENAI-KEY-1.0`. Forms the audit id.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Severity, used for risk scoring and SARIF export.
    pub severity: Severity,
    /// Action this rule contributes when it fires.
    pub action: Action,
    /// Regex predicate: fires when matches >= `min_count`.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Minimum number of non-overlapping `pattern` matches.
    #[serde(default = "default_min_count")]
    pub min_count: usize,
    /// Length predicate: fires when the text exceeds this many characters.
    #[serde(default)]
    pub max_chars: Option<usize>,
    /// Classifier predicate: fires when the external classifier answers true.
    #[serde(default)]
    pub llm_prompt: Option<String>,
    /// Direction restriction; empty means any.
    #[serde(default)]
    pub applies_to: Vec<AppliesTo>,
    /// Endpoint restriction (exact, trailing-`*` prefix, or glob); empty
    /// means any endpoint.
    #[serde(default)]
    pub endpoints: Vec<String>,
    /// Per-rule override of the global shadow switch.
    #[serde(default)]
    pub shadow_override: ShadowOverride,
}

fn default_min_count() -> usize {
    1
}

impl Rule {
    /// Whether this rule declares at least one predicate.
    pub fn has_predicate(&self) -> bool {
        self.pattern.is_some() || self.max_chars.is_some() || self.llm_prompt.is_some()
    }

    /// Direction gate: does the rule apply to messages going `direction`?
    pub fn applies_to_direction(&self, direction: Direction) -> bool {
        if self.applies_to.is_empty() {
            return true;
        }
        self.applies_to.iter().any(|a| match a {
            AppliesTo::Any => true,
            AppliesTo::Request => direction == Direction::Request,
            AppliesTo::Response => direction == Direction::Response,
        })
    }
}
