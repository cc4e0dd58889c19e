//! Document sources the loader reads configuration through
//!
//! The engine never touches the filesystem directly: every read goes through
//! a [`DocumentSource`], so tests can run entirely against a [`MemorySource`].

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::io::{DEFAULT_MAX_DOCUMENT_BYTES, read_bounded};
use crate::{DocumentId, Error, Result};

/// Storage backend holding configuration documents.
///
/// Implementations must be `Send + Sync`: the loader is called from many
/// query threads at once.
pub trait DocumentSource: Send + Sync {
    /// Read the full contents of a document.
    ///
    /// Returns [`Error::NotFound`] when the document does not exist.
    fn read_all(&self, id: &DocumentId) -> Result<Vec<u8>>;

    /// List every document id in the source, sorted.
    fn list(&self) -> Result<Vec<DocumentId>>;

    /// Human-readable description used in log lines.
    fn describe(&self) -> String;
}

impl<S: DocumentSource + ?Sized> DocumentSource for Arc<S> {
    fn read_all(&self, id: &DocumentId) -> Result<Vec<u8>> {
        (**self).read_all(id)
    }

    fn list(&self) -> Result<Vec<DocumentId>> {
        (**self).list()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// JSON documents stored under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    max_document_bytes: u64,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    ///
    /// The root must exist and be a directory; it is canonicalized so that
    /// change events reported with absolute paths map back to document ids.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        if !canonical.is_dir() {
            return Err(Error::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }

        Ok(Self {
            root: canonical,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        })
    }

    /// Override the per-document size limit.
    pub fn with_max_document_bytes(mut self, max: u64) -> Self {
        self.max_document_bytes = max;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an absolute path inside the root back to a document id.
    pub fn id_for_path(&self, path: &Path) -> Option<DocumentId> {
        path.strip_prefix(&self.root)
            .ok()
            .map(DocumentId::from_relative_path)
    }

    fn path_for(&self, id: &DocumentId) -> PathBuf {
        id.segments().fold(self.root.clone(), |acc, seg| acc.join(seg))
    }

    /// Symlinked directories are not followed; symlinked files are.
    fn collect(&self, dir: &Path, out: &mut Vec<DocumentId>) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping entry of unknown type");
                    continue;
                }
            };

            if file_type.is_dir() {
                self.collect(&path, out)?;
            } else if file_type.is_symlink() && path.is_dir() {
                tracing::debug!(path = %path.display(), "Not following symlinked directory");
            } else if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(id) = self.id_for_path(&path) {
                    out.push(id);
                }
            }
        }

        Ok(())
    }
}

impl DocumentSource for DirectorySource {
    fn read_all(&self, id: &DocumentId) -> Result<Vec<u8>> {
        if id.segments().any(|s| s == "..") {
            return Err(Error::NotFound { id: id.clone() });
        }

        let path = self.path_for(id);
        match read_bounded(&path, self.max_document_bytes) {
            Err(Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound { id: id.clone() })
            }
            other => other,
        }
    }

    fn list(&self) -> Result<Vec<DocumentId>> {
        let mut ids = Vec::new();
        self.collect(&self.root, &mut ids)?;
        ids.sort();
        Ok(ids)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-memory document store.
///
/// Used by tests and by embedders that assemble documents programmatically.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: RwLock<BTreeMap<DocumentId, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&self, id: impl Into<DocumentId>, contents: impl Into<Vec<u8>>) {
        self.documents.write().insert(id.into(), contents.into());
    }

    /// Remove a document, returning whether it existed.
    pub fn remove(&self, id: &DocumentId) -> bool {
        self.documents.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentSource for MemorySource {
    fn read_all(&self, id: &DocumentId) -> Result<Vec<u8>> {
        self.documents
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound { id: id.clone() })
    }

    fn list(&self) -> Result<Vec<DocumentId>> {
        Ok(self.documents.read().keys().cloned().collect())
    }

    fn describe(&self) -> String {
        format!("memory ({} documents)", self.len())
    }
}
