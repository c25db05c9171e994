//! Additive risk scoring over a decision and its firing rules.
//!
//! The score feeds operator dashboards and structured logs; it never alters
//! the enforcement action.

use crate::action::{Action, Severity};

/// Points contributed by the decision's original action.
fn action_points(action: Action) -> u32 {
    match action {
        Action::Block => 40,
        Action::Flag => 15,
        Action::Allow => 0,
    }
}

/// Points contributed by a firing rule's severity.
fn severity_points(severity: Severity) -> u32 {
    match severity {
        Severity::Error => 50,
        Severity::Warning => 20,
        Severity::Info => 5,
    }
}

/// Fixed bonus for known-high-value secret detections.
fn rule_bonus(rule_id: &str) -> u32 {
    if rule_id.starts_with("SSH-PRIVATE-") || rule_id.starts_with("PGP-PRIVATE-") {
        50
    } else if crate::family::is_secret_rule(rule_id) {
        40
    } else {
        0
    }
}

/// Coarse risk bucket derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Compute the additive risk score for a decision.
///
/// `rules` yields `(rule_id, severity)` for every rule in the firing set
/// after suppression.
pub fn risk_score<'a>(
    action: Action,
    rules: impl IntoIterator<Item = (&'a str, Severity)>,
) -> u32 {
    let mut score = action_points(action);
    for (id, severity) in rules {
        score += rule_bonus(id) + severity_points(severity);
    }
    score
}

/// Bucket a score: >= 80 high, >= 40 medium, else low.
pub fn risk_level(score: u32) -> RiskLevel {
    if score >= 80 {
        RiskLevel::High
    } else if score >= 40 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_allow_scores_zero() {
        assert_eq!(risk_score(Action::Allow, []), 0);
        assert_eq!(risk_level(0), RiskLevel::Low);
    }

    #[test]
    fn secret_block_is_high() {
        // block (40) + openai bonus (40) + error severity (50) = 130
        let score = risk_score(Action::Block, [("OPENAI-KEY-1.0", Severity::Error)]);
        assert_eq!(score, 130);
        assert_eq!(risk_level(score), RiskLevel::High);
    }

    #[test]
    fn private_key_bonus_outranks_api_keys() {
        let ssh = risk_score(Action::Flag, [("SSH-PRIVATE-1.0", Severity::Info)]);
        let gh = risk_score(Action::Flag, [("GITHUB-TOKEN-1.0", Severity::Info)]);
        assert_eq!(ssh - gh, 10);
    }

    #[test]
    fn flag_with_warning_is_medium() {
        // flag (15) + no bonus + warning (20) = 35 -> low; two rules -> 55 medium
        let one = risk_score(Action::Flag, [("LEN-1.0", Severity::Warning)]);
        assert_eq!(risk_level(one), RiskLevel::Low);
        let two = risk_score(
            Action::Flag,
            [("LEN-1.0", Severity::Warning), ("LEN-2.0", Severity::Warning)],
        );
        assert_eq!(risk_level(two), RiskLevel::Medium);
    }
}
