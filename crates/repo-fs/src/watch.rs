//! Change notification for document sources
//!
//! The change watcher in `repo-core` only sees a stream of
//! [`DocumentChange`] events. [`ChannelNotifier`] lets callers (and tests)
//! push events by hand; [`FsNotifier`] derives them from filesystem events
//! under a [`DirectorySource`](crate::DirectorySource) root.

use notify::event::ModifyKind;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::{DocumentId, Error, Result};

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// A single change to a document in a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub id: DocumentId,
    pub kind: ChangeKind,
}

impl DocumentChange {
    pub fn new(id: impl Into<DocumentId>, kind: ChangeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn created(id: impl Into<DocumentId>) -> Self {
        Self::new(id, ChangeKind::Created)
    }

    pub fn modified(id: impl Into<DocumentId>) -> Self {
        Self::new(id, ChangeKind::Modified)
    }

    pub fn removed(id: impl Into<DocumentId>) -> Self {
        Self::new(id, ChangeKind::Removed)
    }
}

/// Producer of document change events.
///
/// `subscribe` is called once by the watcher; the notifier is then kept alive
/// for as long as the watcher runs. Dropping the notifier must eventually
/// disconnect the returned receiver.
pub trait ChangeNotifier: Send {
    fn subscribe(&mut self) -> Result<Receiver<DocumentChange>>;
}

/// Sending half of a [`ChannelNotifier`].
#[derive(Debug, Clone)]
pub struct ChangeSender {
    inner: Sender<DocumentChange>,
}

impl ChangeSender {
    /// Push an event. Returns `false` once the watcher has gone away.
    pub fn send(&self, change: DocumentChange) -> bool {
        self.inner.send(change).is_ok()
    }
}

/// Notifier fed by hand through [`ChangeSender`] handles.
#[derive(Debug)]
pub struct ChannelNotifier {
    sender: Sender<DocumentChange>,
    receiver: Option<Receiver<DocumentChange>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver: Some(receiver),
        }
    }

    pub fn sender(&self) -> ChangeSender {
        ChangeSender {
            inner: self.sender.clone(),
        }
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn subscribe(&mut self) -> Result<Receiver<DocumentChange>> {
        self.receiver
            .take()
            .ok_or_else(|| Error::notifier("channel notifier already subscribed"))
    }
}

/// Notifier backed by the platform filesystem watcher.
///
/// Reports `.json` documents under `root`; other files and directories are
/// ignored.
pub struct FsNotifier {
    root: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl FsNotifier {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        Ok(Self {
            root,
            watcher: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn convert(root: &Path, event: &Event) -> Vec<DocumentChange> {
        event
            .paths
            .iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                let id = path
                    .strip_prefix(root)
                    .ok()
                    .map(DocumentId::from_relative_path)?;
                let kind = match event.kind {
                    EventKind::Create(_) => ChangeKind::Created,
                    EventKind::Remove(_) => ChangeKind::Removed,
                    // Renames and generic events: decide from what is on disk now
                    EventKind::Modify(ModifyKind::Name(_))
                    | EventKind::Modify(ModifyKind::Any)
                    | EventKind::Any => {
                        if path.exists() {
                            ChangeKind::Modified
                        } else {
                            ChangeKind::Removed
                        }
                    }
                    EventKind::Modify(ModifyKind::Data(_)) => ChangeKind::Modified,
                    _ => return None,
                };
                Some(DocumentChange { id, kind })
            })
            .collect()
    }
}

impl ChangeNotifier for FsNotifier {
    fn subscribe(&mut self) -> Result<Receiver<DocumentChange>> {
        if self.watcher.is_some() {
            return Err(Error::notifier("filesystem notifier already subscribed"));
        }

        let (tx, rx) = channel();
        let root = self.root.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for change in Self::convert(&root, &event) {
                        let _ = tx.send(change);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Filesystem watcher error"),
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::notifier(format!("failed to create watcher: {e}")))?;

        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| Error::notifier(format!("failed to watch {}: {e}", self.root.display())))?;

        tracing::debug!(root = %self.root.display(), "Watching document directory");
        self.watcher = Some(watcher);
        Ok(rx)
    }
}
