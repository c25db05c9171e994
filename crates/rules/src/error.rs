use thiserror::Error;

/// Errors raised while loading or compiling a rule source.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The source file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or a rule field has an unknown value.
    #[error("rule parse error: {0}")]
    Parse(String),

    /// Two rules in the same source share an id.
    #[error("duplicate rule id: {0}")]
    DuplicateId(String),

    /// A rule's `pattern` is not a valid regular expression.
    #[error("rule {id}: invalid pattern: {source}")]
    BadPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    /// A rule declares none of `pattern`, `max_chars`, `llm_prompt`.
    #[error("rule {0}: no predicate (one of pattern, max_chars, llm_prompt is required)")]
    NoPredicate(String),
}
