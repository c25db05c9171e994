use thiserror::Error;

/// Errors surfaced by the evaluation pipeline.
///
/// Downstream delivery failures never appear here; they are absorbed by the
/// forwarder. Only failures that threaten the decision or its record
/// propagate to the caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The audit record could not be durably appended. The evaluation must
    /// fail: no record, no decision.
    #[error("audit error: {0}")]
    Audit(#[from] jimini_audit::AuditError),

    /// The gateway was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}
