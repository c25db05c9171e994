//! Optional detached Ed25519 signing of record hashes.
//!
//! Signing is best-effort: a missing key file, bad key material, or an
//! unsupported algorithm label all fall back silently to unsigned records.
//! The chain remains intact either way; the signature only adds an
//! external-attestation layer on top of it.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use tracing::warn;

use crate::error::CryptoError;

/// `algo_labels.sig` value for unsigned records.
pub const SIG_NONE: &str = "none";

/// Signs record hashes with a detached Ed25519 signature.
pub struct RecordSigner {
    key: Option<SigningKey>,
}

impl RecordSigner {
    /// A signer that never signs (`sig_algo = none`).
    pub fn disabled() -> Self {
        Self { key: None }
    }

    /// Build a signer from configuration.
    ///
    /// Returns a disabled signer when `sig_algo` is not `ed25519` or the key
    /// cannot be loaded; the failure is logged, never propagated.
    pub fn from_config(sig_algo: &str, key_path: &Path) -> Self {
        if sig_algo != "ed25519" {
            if sig_algo != SIG_NONE {
                warn!(algo = sig_algo, "unsupported signature algorithm, records will be unsigned");
            }
            return Self::disabled();
        }
        match load_seed(key_path) {
            Ok(seed) => Self {
                key: Some(SigningKey::from_bytes(&seed)),
            },
            Err(e) => {
                warn!(
                    path = %key_path.display(),
                    error = %e,
                    "cannot load signing key, records will be unsigned"
                );
                Self::disabled()
            }
        }
    }

    /// Build a signer from an in-memory seed (used by tests).
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: Some(SigningKey::from_bytes(&seed)),
        }
    }

    /// Whether this signer will actually produce signatures.
    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// The label stored in `algo_labels.sig`.
    pub fn label(&self) -> &'static str {
        if self.key.is_some() { "ed25519" } else { SIG_NONE }
    }

    /// Sign `msg`, returning the base64 detached signature.
    ///
    /// Returns `None` when signing is disabled.
    pub fn sign_detached(&self, msg: &[u8]) -> Option<String> {
        let key = self.key.as_ref()?;
        let sig: Signature = key.sign(msg);
        Some(BASE64.encode(sig.to_bytes()))
    }

    /// The verifying key matching this signer, if enabled.
    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        self.key.as_ref().map(SigningKey::verifying_key)
    }
}

/// Verifies detached signatures produced by a [`RecordSigner`].
pub struct RecordVerifier {
    key: VerifyingKey,
}

impl RecordVerifier {
    /// Load a verifier from a 32-byte hex public key file.
    pub fn from_file(pub_path: &Path) -> Result<Self, CryptoError> {
        let raw = load_seed(pub_path)?;
        let key = VerifyingKey::from_bytes(&raw)
            .map_err(|e| CryptoError::KeyFormat(e.to_string()))?;
        Ok(Self { key })
    }

    /// Build a verifier from an existing key.
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Verify a base64 detached signature over `msg`.
    pub fn verify_detached(&self, msg: &[u8], sig_b64: &str) -> Result<(), CryptoError> {
        let raw = BASE64
            .decode(sig_b64)
            .map_err(|_| CryptoError::BadSignature)?;
        let sig = Signature::from_slice(&raw).map_err(|_| CryptoError::BadSignature)?;
        self.key
            .verify(msg, &sig)
            .map_err(|_| CryptoError::BadSignature)
    }
}

/// Generate a fresh Ed25519 keypair as `(seed_hex, public_hex)`.
///
/// Both values are 32 bytes hex-encoded, in the format [`RecordSigner`] and
/// [`RecordVerifier`] load from disk.
pub fn generate_keypair() -> (String, String) {
    let mut csprng = rand_core::OsRng;
    let key = SigningKey::generate(&mut csprng);
    (
        hex::encode(key.to_bytes()),
        hex::encode(key.verifying_key().to_bytes()),
    )
}

/// Read a 32-byte value from a hex-encoded key file.
fn load_seed(path: &Path) -> Result<[u8; 32], CryptoError> {
    let raw = std::fs::read_to_string(path)?;
    let bytes = hex::decode(raw.trim())
        .map_err(|e| CryptoError::KeyFormat(format!("not hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::KeyFormat("key must be exactly 32 bytes".to_owned()))
}
