//! Filesystem watcher for rule hot-reload.
//!
//! Monitors the rule source file and triggers a [`RuleStore::reload`] when
//! it changes. Rapid event bursts (editor save cycles, atomic replaces) are
//! debounced so the file is only recompiled once it has settled.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::store::RuleStore;

/// Default debounce interval for filesystem change events.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches the rule source file and hot-reloads the store on changes.
pub struct RuleWatcher {
    store: Arc<RuleStore>,
    debounce: Duration,
}

impl RuleWatcher {
    /// Create a watcher for the given store.
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self {
            store,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Override the default debounce duration.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Spawn the watcher as a background tokio task.
    ///
    /// Returns a `JoinHandle` that can be aborted to stop watching. A reload
    /// failure keeps the previous snapshot in place and is only logged.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!(error = %e, "rule watcher exited with error");
            }
        })
    }

    /// Internal run loop: set up a `notify` watcher and react to changes.
    async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(16);

        // Watch the parent directory since some editors replace the file atomically.
        let rules_path = self.store.path().to_path_buf();
        let watch_dir = rules_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let rules_filename = rules_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();

        let _watcher = {
            let tx = tx.clone();
            let mut watcher = RecommendedWatcher::new(
                move |res: Result<notify::Event, notify::Error>| match res {
                    Ok(event) => {
                        if is_relevant_event(event.kind) {
                            let is_our_file = event.paths.iter().any(|p| {
                                p.file_name()
                                    .is_some_and(|name| name == rules_filename.as_os_str())
                            });
                            if is_our_file {
                                // Best-effort send; a full channel means a
                                // reload is already pending.
                                let _ = tx.try_send(());
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "filesystem watcher error");
                    }
                },
                notify::Config::default(),
            )?;
            watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
            info!(path = %rules_path.display(), "rule watcher started");
            watcher
        };

        loop {
            if rx.recv().await.is_none() {
                debug!("rule watcher channel closed, shutting down");
                break;
            }

            // Debounce: drain events arriving within the window.
            tokio::time::sleep(self.debounce).await;
            while rx.try_recv().is_ok() {}

            let _ = self.store.reload();
        }

        Ok(())
    }
}

/// Returns `true` for filesystem events that might indicate source changes.
fn is_relevant_event(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
