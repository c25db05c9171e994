//! Rule-id families.
//!
//! One table drives three behaviors: suppression of generic catch-alls,
//! eligibility for excerpt redaction, and per-rule risk bonuses. A rule
//! belongs to a family when its id starts with the family prefix, so
//! `OPENAI-KEY-1.0` and a future `OPENAI-KEY-2.1` are treated alike.

/// Id prefixes of rules that detect a specific secret material.
pub const SECRET_PREFIXES: &[&str] = &[
    "OPENAI-KEY-",
    "GITHUB-TOKEN-",
    "AWS-KEY-",
    "JWT-",
    "SSH-PRIVATE-",
    "PGP-PRIVATE-",
];

/// Id prefix of the generic credential catch-all family.
pub const GENERIC_PREFIX: &str = "API-";

/// Returns `true` when the rule id belongs to a specific-secret family.
pub fn is_secret_rule(rule_id: &str) -> bool {
    SECRET_PREFIXES.iter().any(|p| rule_id.starts_with(p))
}

/// Returns `true` when the rule id belongs to the generic catch-all family.
pub fn is_generic_rule(rule_id: &str) -> bool {
    rule_id.starts_with(GENERIC_PREFIX)
}

/// Remove generic catch-all rules from a firing set when a specific secret
/// rule also fired. Specific secrets outrank generic catch-alls.
pub fn suppress_generic(fired: &mut Vec<String>) {
    if fired.iter().any(|id| is_secret_rule(id)) {
        fired.retain(|id| !is_generic_rule(id));
    }
}
