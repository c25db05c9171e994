//! The append-only hash-chained audit writer.
//!
//! A single writer instance owns the chain file. Each append runs under one
//! mutex: read the cached tip hash, compute this record's hashes, write one
//! JSON line, flush and fsync, update the cache. The evaluate response path
//! waits on that fsync -- a decision is only reported once its record is
//! durable.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use jimini_crypto::{HashAlgo, RecordSigner, ZERO_HASH};

use crate::error::AuditError;
use crate::record::{AlgoLabels, AuditRecord, RecordDraft};

struct Writer {
    file: File,
    last_hash: String,
}

/// Singleton append-only writer for the audit chain.
pub struct AuditChain {
    path: PathBuf,
    algo: HashAlgo,
    signer: RecordSigner,
    inner: Mutex<Writer>,
}

impl AuditChain {
    /// Open (or create) the chain at `path`.
    ///
    /// The tip-hash cache is initialized from the last parseable line of an
    /// existing file, or the zero-hash sentinel for a fresh chain.
    pub fn open(
        path: impl Into<PathBuf>,
        algo: HashAlgo,
        signer: RecordSigner,
    ) -> Result<Self, AuditError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let last_hash = read_tip_hash(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        info!(
            path = %path.display(),
            algo = algo.label(),
            signed = signer.is_enabled(),
            "audit chain opened"
        );

        Ok(Self {
            path,
            algo,
            signer,
            inner: Mutex::new(Writer { file, last_hash }),
        })
    }

    /// The chain file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record, computing its chain hashes and optional signature.
    ///
    /// Atomic per record: the mutex covers hash computation, the write, and
    /// the fsync, so chain order equals lock-acquisition order.
    pub fn append(&self, draft: RecordDraft) -> Result<AuditRecord, AuditError> {
        let mut writer = self.inner.lock();

        let mut record = AuditRecord {
            timestamp: draft.timestamp,
            request_id: draft.request_id,
            agent_id: draft.agent_id,
            endpoint: draft.endpoint,
            direction: draft.direction,
            action: draft.action,
            rule_ids: draft.rule_ids,
            text_hash: draft.text_hash,
            text_excerpt: draft.text_excerpt,
            previous_hash: writer.last_hash.clone(),
            record_hash: String::new(),
            algo_labels: AlgoLabels {
                hash: self.algo.label().to_owned(),
                sig: self.signer.label().to_owned(),
            },
            signature: None,
        };

        let canonical = record.canonical_bytes()?;
        record.record_hash = self.algo.digest_hex(&canonical);
        record.signature = self.signer.sign_detached(record.record_hash.as_bytes());

        let line = serde_json::to_string(&record)?;
        writeln!(writer.file, "{line}")?;
        writer.file.flush()?;
        writer.file.sync_all()?;

        writer.last_hash = record.record_hash.clone();
        Ok(record)
    }

    /// The current tip hash (the `record_hash` of the most recent record).
    pub fn tip_hash(&self) -> String {
        self.inner.lock().last_hash.clone()
    }
}

/// Scan an existing chain file for the tip hash.
fn read_tip_hash(path: &Path) -> Result<String, AuditError> {
    if !path.exists() {
        return Ok(ZERO_HASH.to_owned());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut tip = ZERO_HASH.to_owned();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditRecord>(&line) {
            Ok(record) => tip = record.record_hash,
            Err(e) => {
                warn!(index = idx, error = %e, "skipping corrupt audit line while reading tip");
            }
        }
    }
    Ok(tip)
}

#[cfg(test)]
mod tests {
    use jimini_core::{Action, Direction};

    use super::*;
    use crate::verify::verify_chain;

    fn draft(n: u32, action: Action) -> RecordDraft {
        RecordDraft::new(
            format!("req_{n:012}"),
            "agent",
            "/v1/chat",
            Direction::Request,
            action,
            vec![],
            "00".repeat(32),
            "excerpt",
        )
    }

    fn open_chain(dir: &tempfile::TempDir) -> AuditChain {
        AuditChain::open(
            dir.path().join("audit.jsonl"),
            HashAlgo::Sha3_256,
            RecordSigner::disabled(),
        )
        .unwrap()
    }

    #[test]
    fn first_record_links_to_zero_hash() {
        let dir = tempfile::tempdir().unwrap();
        let chain = open_chain(&dir);
        let rec = chain.append(draft(0, Action::Allow)).unwrap();
        assert_eq!(rec.previous_hash, ZERO_HASH);
        assert_eq!(rec.record_hash.len(), 64);
    }

    #[test]
    fn records_link_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let chain = open_chain(&dir);
        let first = chain.append(draft(0, Action::Block)).unwrap();
        let second = chain.append(draft(1, Action::Flag)).unwrap();
        assert_eq!(second.previous_hash, first.record_hash);

        let report = verify_chain(chain.path()).unwrap();
        assert!(report.ok, "{report:?}");
    }

    #[test]
    fn tip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let tip = {
            let chain =
                AuditChain::open(&path, HashAlgo::Sha3_256, RecordSigner::disabled()).unwrap();
            chain.append(draft(0, Action::Allow)).unwrap();
            chain.append(draft(1, Action::Allow)).unwrap().record_hash
        };

        let chain = AuditChain::open(&path, HashAlgo::Sha3_256, RecordSigner::disabled()).unwrap();
        assert_eq!(chain.tip_hash(), tip);

        chain.append(draft(2, Action::Allow)).unwrap();
        assert!(verify_chain(&path).unwrap().ok);
    }

    #[test]
    fn signed_records_carry_signature_and_label() {
        let dir = tempfile::tempdir().unwrap();
        let chain = AuditChain::open(
            dir.path().join("audit.jsonl"),
            HashAlgo::Sha3_256,
            RecordSigner::from_seed([3u8; 32]),
        )
        .unwrap();

        let rec = chain.append(draft(0, Action::Block)).unwrap();
        assert_eq!(rec.algo_labels.sig, "ed25519");
        assert!(rec.signature.is_some());

        // The signature is outside the hashed form, so the chain verifies
        // exactly as an unsigned one would.
        assert!(verify_chain(chain.path()).unwrap().ok);
    }

    #[test]
    fn sha3_512_chain_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let chain = AuditChain::open(
            dir.path().join("audit.jsonl"),
            HashAlgo::Sha3_512,
            RecordSigner::disabled(),
        )
        .unwrap();
        let rec = chain.append(draft(0, Action::Allow)).unwrap();
        assert_eq!(rec.record_hash.len(), 128);
        chain.append(draft(1, Action::Allow)).unwrap();
        assert!(verify_chain(chain.path()).unwrap().ok);
    }
}
