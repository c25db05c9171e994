use thiserror::Error;

/// Errors that can occur in the audit plane.
#[derive(Debug, Error)]
pub enum AuditError {
    /// An I/O failure on the chain file. Fatal for the affected append: the
    /// caller must not report a decision whose record did not reach disk.
    #[error("audit io error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
