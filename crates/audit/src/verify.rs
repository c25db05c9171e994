//! Chain verification.
//!
//! Replays a chain file from the first line, recomputing every record's
//! hash under the algorithm named in its own `algo_labels` and checking the
//! `previous_hash` linkage. The first inconsistency wins; its record index
//! and a reason are reported.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use jimini_crypto::{HashAlgo, ZERO_HASH};

use crate::error::AuditError;
use crate::record::AuditRecord;

/// Outcome of a chain verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    /// True when every record re-hashes and links correctly.
    pub ok: bool,
    /// Index of the first inconsistent record, when not ok.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_bad_index: Option<usize>,
    /// Human-readable description of the inconsistency, when not ok.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Number of records checked (up to and including the first bad one).
    pub records_checked: usize,
}

impl VerifyReport {
    fn ok(records_checked: usize) -> Self {
        Self {
            ok: true,
            first_bad_index: None,
            reason: None,
            records_checked,
        }
    }

    fn bad(index: usize, reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            first_bad_index: Some(index),
            reason: Some(reason.into()),
            records_checked: index + 1,
        }
    }
}

/// Verify the chain at `path`.
///
/// An empty or absent file verifies trivially. I/O failures are returned as
/// errors rather than reported as corruption.
pub fn verify_chain(path: &Path) -> Result<VerifyReport, AuditError> {
    if !path.exists() {
        return Ok(VerifyReport::ok(0));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut expected_previous = ZERO_HASH.to_owned();
    let mut index = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: AuditRecord = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => return Ok(VerifyReport::bad(index, format!("malformed record: {e}"))),
        };

        if record.previous_hash != expected_previous {
            return Ok(VerifyReport::bad(index, "previous_hash mismatch"));
        }

        let Some(algo) = HashAlgo::try_from_label(&record.algo_labels.hash) else {
            return Ok(VerifyReport::bad(
                index,
                format!("unknown hash algorithm: {}", record.algo_labels.hash),
            ));
        };

        let canonical = record.canonical_bytes()?;
        let recomputed = algo.digest_hex(&canonical);
        if recomputed != record.record_hash {
            return Ok(VerifyReport::bad(index, "record hash mismatch"));
        }

        expected_previous = record.record_hash;
        index += 1;
    }

    Ok(VerifyReport::ok(index))
}

/// Verify the detached signatures in the chain at `path`.
///
/// Complements [`verify_chain`]: the hash chain proves internal consistency,
/// the signatures attest that the records were written by the holder of the
/// signing key. Unsigned records (`algo_labels.sig = "none"`) are skipped;
/// a signed record whose signature does not verify is reported at its index.
pub fn verify_signatures(
    path: &Path,
    verifier: &jimini_crypto::RecordVerifier,
) -> Result<VerifyReport, AuditError> {
    if !path.exists() {
        return Ok(VerifyReport::ok(0));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut index = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: AuditRecord = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => return Ok(VerifyReport::bad(index, format!("malformed record: {e}"))),
        };

        if let Some(sig) = &record.signature {
            if verifier
                .verify_detached(record.record_hash.as_bytes(), sig)
                .is_err()
            {
                return Ok(VerifyReport::bad(index, "signature verification failed"));
            }
        }

        index += 1;
    }

    Ok(VerifyReport::ok(index))
}
