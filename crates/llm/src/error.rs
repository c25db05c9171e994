use thiserror::Error;

/// Errors that can occur during classifier evaluation.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out.
    #[error("classifier request timed out after {0}s")]
    Timeout(u64),

    /// Failed to parse the classifier response.
    #[error("failed to parse classifier response: {0}")]
    Parse(String),

    /// The classifier API returned an error response.
    #[error("classifier API error: {0}")]
    Api(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}
