//! Digest selection for the audit chain.
//!
//! The algorithm is chosen once at startup from configuration and stamped
//! into every record's `algo_labels.hash`, so verification can replay a
//! chain written under a different default.

use sha2::Digest as _;
use tracing::warn;

/// Sentinel `previous_hash` of the first record in a chain.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Supported chain digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgo {
    Sha3_256,
    Sha3_512,
    Sha256,
}

impl HashAlgo {
    /// Parse an algorithm label, falling back to SHA3-256 for unknown values.
    pub fn from_label(label: &str) -> Self {
        Self::try_from_label(label).unwrap_or_else(|| {
            warn!(algo = label, "unknown hash algorithm, using sha3_256");
            Self::Sha3_256
        })
    }

    /// Strict label parse, used by chain verification where an unknown label
    /// must be reported rather than papered over.
    pub fn try_from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "sha3_256" => Some(Self::Sha3_256),
            "sha3_512" => Some(Self::Sha3_512),
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }

    /// The label stored in `algo_labels.hash`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sha3_256 => "sha3_256",
            Self::Sha3_512 => "sha3_512",
            Self::Sha256 => "sha256",
        }
    }

    /// Hex digest of `data` under this algorithm.
    pub fn digest_hex(self, data: &[u8]) -> String {
        match self {
            Self::Sha3_256 => hex::encode(sha3::Sha3_256::digest(data)),
            Self::Sha3_512 => hex::encode(sha3::Sha3_512::digest(data)),
            Self::Sha256 => hex::encode(sha2::Sha256::digest(data)),
        }
    }
}

impl Default for HashAlgo {
    fn default() -> Self {
        Self::Sha3_256
    }
}
