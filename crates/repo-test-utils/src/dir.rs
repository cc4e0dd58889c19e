//! [`ConfigDir`] builder for on-disk document trees.

use repo_fs::DirectorySource;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::fixtures;

/// A temporary directory of layout documents.
///
/// # Example
///
/// ```rust,no_run
/// use repo_test_utils::ConfigDir;
///
/// let dir = ConfigDir::with_prebid();
/// dir.write("repositories/extra.json", r#"{"repo_name": "o/extra"}"#);
/// let source = dir.source();
/// ```
pub struct ConfigDir {
    temp_dir: TempDir,
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDir {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// A directory pre-populated with [`fixtures::PREBID_DOCUMENTS`].
    pub fn with_prebid() -> Self {
        let dir = Self::new();
        for (id, body) in fixtures::PREBID_DOCUMENTS {
            dir.write(id, body);
        }
        dir
    }

    /// A copy of every file under `source`, preserving relative paths.
    pub fn copy_from(source: &Path) -> Self {
        let dir = Self::new();
        dir.copy_tree(source, source);
        dir
    }

    fn copy_tree(&self, base: &Path, current: &Path) {
        for entry in fs::read_dir(current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                self.copy_tree(base, &path);
            } else {
                let relative = path.strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/");
                self.write(&relative, &fs::read_to_string(&path).unwrap());
            }
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a document, creating parent directories.
    pub fn write(&self, relative: &str, body: &str) -> &Self {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, body).unwrap();
        self
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.root().join(relative)).unwrap();
    }

    /// A [`DirectorySource`] over this directory.
    pub fn source(&self) -> DirectorySource {
        DirectorySource::new(self.root()).unwrap()
    }
}
