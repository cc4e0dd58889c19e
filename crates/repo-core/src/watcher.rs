//! Background invalidation driven by document change events
//!
//! The [`DependencyIndex`] records which repositories were built from which
//! documents. The [`ChangeWatcher`] thread consumes [`DocumentChange`] events
//! and evicts every repository depending on the changed document. Events for
//! documents the index has never seen mark the registry stale so that the
//! next lookup re-runs discovery.

use parking_lot::RwLock;
use repo_fs::{ChangeKind, ChangeNotifier, DocumentChange, DocumentId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::cache::Invalidate;
use crate::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Document to dependent-repository map, fed by every successful load.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    dependents: RwLock<HashMap<DocumentId, BTreeSet<String>>>,
    stale: AtomicBool,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `repo` was built from `chain`, replacing any earlier record.
    pub fn record(&self, repo: &str, chain: &[DocumentId]) {
        let mut dependents = self.dependents.write();
        dependents.retain(|document, repos| {
            if !chain.contains(document) {
                repos.remove(repo);
            }
            !repos.is_empty()
        });
        for document in chain {
            dependents
                .entry(document.clone())
                .or_default()
                .insert(repo.to_string());
        }
    }

    /// Remove `repo` from every document it was recorded against.
    pub fn forget(&self, repo: &str) {
        self.dependents.write().retain(|_, repos| {
            repos.remove(repo);
            !repos.is_empty()
        });
    }

    /// Repositories depending on `document`, sorted.
    pub fn dependents(&self, document: &DocumentId) -> Vec<String> {
        self.dependents
            .read()
            .get(document)
            .map(|repos| repos.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_known(&self, document: &DocumentId) -> bool {
        self.dependents.read().contains_key(document)
    }

    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// Clear the stale flag, returning whether it was set.
    pub fn take_stale(&self) -> bool {
        self.stale.swap(false, Ordering::AcqRel)
    }

    /// Apply one change event.
    pub fn handle(&self, change: &DocumentChange, target: &dyn Invalidate) {
        let dependents = self.dependents(&change.id);

        if dependents.is_empty() || change.kind != ChangeKind::Modified {
            self.mark_stale();
        }

        // An unrecorded document may belong to a load still in flight; bumping
        // the epoch keeps that load from installing what it read.
        if dependents.is_empty() {
            target.invalidate_all();
        }

        for repo in &dependents {
            target.invalidate(repo);
        }

        tracing::info!(
            document = %change.id,
            kind = ?change.kind,
            invalidated = ?dependents,
            "Configuration document changed"
        );
    }
}

/// Thread consuming change events until stopped.
pub struct ChangeWatcher {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    // Kept alive so the event stream stays connected
    _notifier: Box<dyn ChangeNotifier>,
}

impl ChangeWatcher {
    /// Subscribe to `notifier` and start the event thread.
    pub fn start(
        mut notifier: Box<dyn ChangeNotifier>,
        index: Arc<DependencyIndex>,
        target: Arc<dyn Invalidate>,
    ) -> Result<Self> {
        let events = notifier.subscribe()?;
        let running = Arc::new(AtomicBool::new(true));

        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("repo-layout-watcher".into())
            .spawn(move || Self::run(events, &index, target.as_ref(), &flag))
            .map_err(|e| Error::watcher(format!("failed to spawn watcher thread: {e}")))?;

        tracing::debug!("Change watcher started");
        Ok(Self {
            running,
            handle: Some(handle),
            _notifier: notifier,
        })
    }

    fn run(
        events: Receiver<DocumentChange>,
        index: &DependencyIndex,
        target: &dyn Invalidate,
        running: &AtomicBool,
    ) {
        while running.load(Ordering::Acquire) {
            match events.recv_timeout(POLL_INTERVAL) {
                Ok(change) => index.handle(&change, target),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("Change notifier disconnected");
                    break;
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| Error::watcher("watcher thread panicked"))?;
            tracing::debug!("Change watcher stopped");
        }
        Ok(())
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "Failed to stop change watcher");
        }
    }
}

impl std::fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
