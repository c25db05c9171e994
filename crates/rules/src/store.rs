//! The hot-reloading rule store.
//!
//! Readers call [`RuleStore::current`] and get the then-current snapshot
//! behind an `Arc`; they use that snapshot consistently for the remainder
//! of an evaluation. Writers compile a fresh snapshot off to the side and
//! publish it with a single pointer swap, so readers never block and never
//! tear.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::RuleError;
use crate::frontend;
use crate::snapshot::RuleSnapshot;

/// Shared, atomically swapped rule snapshot.
pub struct RuleStore {
    path: PathBuf,
    snapshot: RwLock<Arc<RuleSnapshot>>,
    last_error: RwLock<Option<String>>,
}

impl RuleStore {
    /// Load the initial snapshot from `path`.
    ///
    /// Unlike [`reload`](Self::reload), a failure here is fatal: starting to
    /// serve with no rule set at all is only acceptable when the operator
    /// explicitly points at an empty document.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RuleError> {
        let path = path.into();
        let rules = frontend::parse_file(&path)?;
        let snapshot = RuleSnapshot::compile(rules)?;
        info!(path = %path.display(), rules = snapshot.len(), "rule snapshot loaded");
        Ok(Self {
            path,
            snapshot: RwLock::new(Arc::new(snapshot)),
            last_error: RwLock::new(None),
        })
    }

    /// Build a store directly from a snapshot (used by tests and the CLI).
    pub fn from_snapshot(snapshot: RuleSnapshot) -> Self {
        Self {
            path: PathBuf::new(),
            snapshot: RwLock::new(Arc::new(snapshot)),
            last_error: RwLock::new(None),
        }
    }

    /// The rule source path this store reloads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The currently published snapshot.
    pub fn current(&self) -> Arc<RuleSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Recompile from the source file and publish the result.
    ///
    /// On any failure the previous snapshot stays in effect and the error is
    /// retained for [`last_error`](Self::last_error).
    pub fn reload(&self) -> Result<(), RuleError> {
        let result = frontend::parse_file(&self.path).and_then(RuleSnapshot::compile);
        match result {
            Ok(snapshot) => {
                info!(
                    path = %self.path.display(),
                    rules = snapshot.len(),
                    "rule snapshot reloaded"
                );
                *self.snapshot.write() = Arc::new(snapshot);
                *self.last_error.write() = None;
                Ok(())
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "rule reload failed, keeping previous snapshot"
                );
                *self.last_error.write() = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// The failure message of the most recent reload attempt, if it failed.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }
}
