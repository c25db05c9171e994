//! YAML rule source parsing.
//!
//! A rule source is a document with a top-level `rules:` sequence. Unknown
//! fields on a rule are ignored; unknown values for enumerated fields
//! (severity, action, direction, shadow override) fail the load, which
//! leaves the previously served snapshot in place.

use std::path::Path;

use serde::Deserialize;

use crate::error::RuleError;
use crate::model::Rule;

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<Rule>,
}

/// Parse a YAML rule document from a string.
pub fn parse(content: &str) -> Result<Vec<Rule>, RuleError> {
    let file: RuleFile = serde_yaml_ng::from_str(content)
        .map_err(|e| RuleError::Parse(format!("YAML parse error: {e}")))?;
    Ok(file.rules)
}

/// Read and parse a YAML rule file.
pub fn parse_file(path: &Path) -> Result<Vec<Rule>, RuleError> {
    let content = std::fs::read_to_string(path).map_err(|e| RuleError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    let file: RuleFile = serde_yaml_ng::from_str(&content).map_err(|e| {
        RuleError::Parse(format!("YAML parse error in {}: {e}", path.display()))
    })?;
    Ok(file.rules)
}
