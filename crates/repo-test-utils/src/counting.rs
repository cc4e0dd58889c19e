//! [`CountingSource`], a read-counting source wrapper.

use parking_lot::Mutex;
use repo_fs::{DocumentId, DocumentSource, Result};
use std::collections::HashMap;

/// Wraps a source and counts `read_all` calls per document.
///
/// Used to observe whether a query hit the cache or went back to the loader.
#[derive(Debug)]
pub struct CountingSource<S> {
    inner: S,
    reads: Mutex<HashMap<DocumentId, usize>>,
}

impl<S> CountingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            reads: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Reads of one document since creation or the last [`reset`](Self::reset).
    pub fn reads(&self, id: &str) -> usize {
        self.reads
            .lock()
            .get(&DocumentId::new(id))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().values().sum()
    }

    pub fn reset(&self) {
        self.reads.lock().clear();
    }
}

impl<S: DocumentSource> DocumentSource for CountingSource<S> {
    fn read_all(&self, id: &DocumentId) -> Result<Vec<u8>> {
        *self.reads.lock().entry(id.clone()).or_insert(0) += 1;
        self.inner.read_all(id)
    }

    fn list(&self) -> Result<Vec<DocumentId>> {
        self.inner.list()
    }

    fn describe(&self) -> String {
        format!("counting {}", self.inner.describe())
    }
}
