use thiserror::Error;

/// Errors from key loading and signature verification.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key file could not be read.
    #[error("cannot read key file: {0}")]
    KeyRead(#[from] std::io::Error),

    /// The key material is not a 32-byte hex string.
    #[error("invalid key material: {0}")]
    KeyFormat(String),

    /// The signature did not verify against the message.
    #[error("signature verification failed")]
    BadSignature,
}
