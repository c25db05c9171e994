//! Endpoint pattern matching.
//!
//! Three semantics, chosen per pattern at compile time:
//! - no wildcard: exact string equality;
//! - a single trailing `*`: prefix match on everything before it;
//! - any other `*` / `?`: glob, compiled to an anchored regex where `*`
//!   matches any run of characters and `?` matches exactly one.

use regex::Regex;

use crate::error::RuleError;

/// A compiled endpoint pattern.
#[derive(Debug, Clone)]
pub enum EndpointMatcher {
    Exact(String),
    Prefix(String),
    Glob(Regex),
}

impl EndpointMatcher {
    /// Compile an endpoint pattern string.
    pub fn compile(rule_id: &str, pattern: &str) -> Result<Self, RuleError> {
        let has_wildcard = pattern.contains(['*', '?']);
        if !has_wildcard {
            return Ok(Self::Exact(pattern.to_owned()));
        }

        if let Some(prefix) = pattern.strip_suffix('*') {
            if !prefix.contains(['*', '?']) {
                return Ok(Self::Prefix(prefix.to_owned()));
            }
        }

        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');
        for c in pattern.chars() {
            match c {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                other => source.push_str(&regex::escape(&other.to_string())),
            }
        }
        source.push('$');

        let re = Regex::new(&source).map_err(|e| RuleError::BadPattern {
            id: rule_id.to_owned(),
            source: e,
        })?;
        Ok(Self::Glob(re))
    }

    /// Does `endpoint` satisfy this pattern?
    pub fn matches(&self, endpoint: &str) -> bool {
        match self {
            Self::Exact(s) => s == endpoint,
            Self::Prefix(p) => endpoint.starts_with(p),
            Self::Glob(re) => re.is_match(endpoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(p: &str) -> EndpointMatcher {
        EndpointMatcher::compile("T-1.0", p).unwrap()
    }

    #[test]
    fn exact_match() {
        let m = compile("/v1/chat");
        assert!(m.matches("/v1/chat"));
        assert!(!m.matches("/v1/chat/extra"));
        assert!(!m.matches("/v1"));
    }

    #[test]
    fn trailing_star_is_prefix() {
        let m = compile("/v1/*");
        assert!(matches!(m, EndpointMatcher::Prefix(_)));
        assert!(m.matches("/v1/chat"));
        assert!(m.matches("/v1/chat/deep/path"));
        assert!(!m.matches("/v2/chat"));
    }

    #[test]
    fn inner_star_is_glob() {
        let m = compile("/api/*/chat");
        assert!(matches!(m, EndpointMatcher::Glob(_)));
        assert!(m.matches("/api/v1/chat"));
        assert!(!m.matches("/api/v1/chat/extra"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        let m = compile("/v?/chat");
        assert!(m.matches("/v1/chat"));
        assert!(m.matches("/v2/chat"));
        assert!(!m.matches("/v10/chat"));
    }

    #[test]
    fn glob_escapes_regex_metacharacters() {
        let m = compile("/v1.*/chat");
        assert!(m.matches("/v1.beta/chat"));
        assert!(!m.matches("/v1xbeta/chat"));
    }
}
