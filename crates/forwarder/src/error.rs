use thiserror::Error;

/// The distinguished rejection returned while a breaker is open.
#[derive(Debug, Error)]
#[error("circuit breaker {0} is open")]
pub struct CircuitOpenError(pub String);

/// Errors from delivering a record to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The HTTP request could not be sent.
    #[error("http error: {0}")]
    Http(String),

    /// The sink answered with a non-success status.
    #[error("sink returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The record could not be serialized for the sink.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
