//! The durable dead-letter queue.
//!
//! An append-only line-delimited JSON file of deliveries that could not
//! reach their sink. Writes never raise to the caller -- losing a dead
//! letter is logged and accepted, failing an evaluation over one is not.
//! Corrupted lines are skipped with a warning when reading.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// One failed delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    /// When the entry was written (ISO-8601 UTC).
    pub timestamp: String,
    /// The sink the delivery was destined for.
    pub target: String,
    /// Why it landed here (`circuit_open`, `delivery_failure`, `queue_full`).
    pub reason: String,
    /// Delivery attempts made so far.
    pub retry_count: u32,
    /// The audit record that failed to deliver.
    pub original_event: serde_json::Value,
}

/// Aggregate statistics over the queue.
#[derive(Debug, Clone, Serialize)]
pub struct DlqStats {
    pub total_events: usize,
    /// Entry counts per target sink.
    pub targets: BTreeMap<String, usize>,
    pub oldest_event: Option<String>,
    pub newest_event: Option<String>,
}

/// Append-only JSONL queue of failed deliveries.
///
/// One mutex guards the file for appends, reads, and rewrites alike, so a
/// replay never observes a half-written line.
pub struct DeadLetterQueue {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DeadLetterQueue {
    /// Create a queue backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    error!(path = %parent.display(), error = %e, "cannot create dead-letter directory");
                }
            }
        }
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Append a failed delivery.
    ///
    /// Persistence failures are logged and dropped.
    pub fn write(
        &self,
        target: &str,
        original_event: serde_json::Value,
        reason: &str,
        retry_count: u32,
    ) {
        let entry = DeadLetterEntry {
            timestamp: jimini_core::now_iso(),
            target: target.to_owned(),
            reason: reason.to_owned(),
            retry_count,
            original_event,
        };

        let _guard = self.lock.lock();
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| {
                let line = serde_json::to_string(&entry).unwrap_or_default();
                writeln!(file, "{line}")?;
                file.flush()
            });
        if let Err(e) = result {
            error!(
                target = target,
                path = %self.path.display(),
                error = %e,
                "failed to write dead letter"
            );
        }
    }

    /// Read entries, optionally filtered by target, in file (FIFO) order.
    pub fn read(&self, target: Option<&str>) -> Vec<DeadLetterEntry> {
        let _guard = self.lock.lock();
        self.read_locked(target)
    }

    fn read_locked(&self, target: Option<&str>) -> Vec<DeadLetterEntry> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DeadLetterEntry>(line) {
                Ok(entry) => {
                    if target.is_none_or(|t| entry.target == t) {
                        entries.push(entry);
                    }
                }
                Err(e) => {
                    warn!(index = idx, error = %e, "skipping corrupted dead-letter entry");
                }
            }
        }
        entries
    }

    /// Remove all entries for `target` (after a successful replay).
    ///
    /// Rewrites the file holding only the other targets' entries.
    pub fn clear_target(&self, target: &str) {
        let _guard = self.lock.lock();
        if !self.path.exists() {
            return;
        }

        let remaining: Vec<String> = self
            .read_locked(None)
            .into_iter()
            .filter(|e| e.target != target)
            .filter_map(|e| serde_json::to_string(&e).ok())
            .collect();

        let mut content = remaining.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        if let Err(e) = std::fs::write(&self.path, content) {
            error!(
                target = target,
                path = %self.path.display(),
                error = %e,
                "failed to clear dead-letter target"
            );
        }
    }

    /// Aggregate statistics over the whole queue.
    pub fn stats(&self) -> DlqStats {
        let entries = self.read(None);
        let mut targets: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &entries {
            *targets.entry(entry.target.clone()).or_default() += 1;
        }
        DlqStats {
            total_events: entries.len(),
            targets,
            oldest_event: entries.iter().map(|e| e.timestamp.clone()).min(),
            newest_event: entries.iter().map(|e| e.timestamp.clone()).max(),
        }
    }
}
