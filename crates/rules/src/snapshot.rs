//! Immutable compiled rule sets.
//!
//! A snapshot is compiled once from a parsed source and then shared behind
//! an `Arc`; readers hold it for the whole of an evaluation and never see a
//! half-updated rule set.

use std::collections::BTreeMap;

use regex::Regex;

use jimini_core::Direction;

use crate::error::RuleError;
use crate::matcher::EndpointMatcher;
use crate::model::Rule;

/// A rule together with its compiled regex and endpoint matchers.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: Rule,
    /// Compiled `pattern`, when the rule declares one.
    pub regex: Option<Regex>,
    /// Compiled `endpoints`; empty means the rule applies everywhere.
    pub endpoints: Vec<EndpointMatcher>,
}

impl CompiledRule {
    /// Scoping gates: direction and endpoint.
    pub fn in_scope(&self, direction: Direction, endpoint: &str) -> bool {
        if !self.rule.applies_to_direction(direction) {
            return false;
        }
        if self.endpoints.is_empty() {
            return true;
        }
        self.endpoints.iter().any(|m| m.matches(endpoint))
    }

    /// Synchronous predicates: regex match count and text length.
    ///
    /// The classifier predicate is asynchronous and evaluated by the
    /// decision engine, not here.
    pub fn text_fires(&self, text: &str) -> bool {
        if let Some(re) = &self.regex {
            if re.find_iter(text).take(self.rule.min_count).count() >= self.rule.min_count {
                return true;
            }
        }
        if let Some(max) = self.rule.max_chars {
            if text.chars().count() > max {
                return true;
            }
        }
        false
    }
}

/// An immutable, validated collection of compiled rules.
///
/// Backed by a `BTreeMap` so that iteration is always in lexicographic
/// rule-id order, which makes evaluation deterministic.
#[derive(Debug, Default)]
pub struct RuleSnapshot {
    rules: BTreeMap<String, CompiledRule>,
}

impl RuleSnapshot {
    /// Compile a parsed rule list into a snapshot.
    ///
    /// Rejects duplicate ids, invalid regexes, and rules with no predicate.
    /// Any rejection fails the whole load; the caller keeps serving its
    /// previous snapshot.
    pub fn compile(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut compiled = BTreeMap::new();

        for rule in rules {
            if !rule.has_predicate() {
                return Err(RuleError::NoPredicate(rule.id));
            }

            let regex = match &rule.pattern {
                Some(src) => Some(Regex::new(src).map_err(|e| RuleError::BadPattern {
                    id: rule.id.clone(),
                    source: e,
                })?),
                None => None,
            };

            let endpoints = rule
                .endpoints
                .iter()
                .map(|p| EndpointMatcher::compile(&rule.id, p))
                .collect::<Result<Vec<_>, _>>()?;

            let id = rule.id.clone();
            let entry = CompiledRule {
                rule,
                regex,
                endpoints,
            };
            if compiled.insert(id.clone(), entry).is_some() {
                return Err(RuleError::DuplicateId(id));
            }
        }

        Ok(Self { rules: compiled })
    }

    /// Number of rules in this snapshot.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the snapshot holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &str) -> Option<&CompiledRule> {
        self.rules.get(id)
    }

    /// Iterate rules in lexicographic id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CompiledRule)> {
        self.rules.iter()
    }
}
