//! Source-relative document identifiers

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Identifier of a document within a [`DocumentSource`](crate::DocumentSource).
///
/// Always a source-relative path using forward slashes, with `.` segments
/// removed and `..` segments folded lexically. Two spellings of the same
/// document (`repositories/./a.json`, `repositories\a.json`) produce equal ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DocumentId {
    inner: String,
}

impl DocumentId {
    /// Create a normalized identifier from any path-like string.
    pub fn new(id: impl AsRef<str>) -> Self {
        let raw = id.as_ref().replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();

        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => match segments.last() {
                    Some(&last) if last != ".." => {
                        segments.pop();
                    }
                    // Escapes the source root; kept so the lookup fails loudly
                    _ => segments.push(".."),
                },
                other => segments.push(other),
            }
        }

        Self {
            inner: segments.join("/"),
        }
    }

    /// Create an identifier from a filesystem path relative to a source root.
    pub fn from_relative_path(path: &Path) -> Self {
        Self::new(path.to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Directory portion of the identifier, `""` for documents at the root.
    pub fn directory(&self) -> &str {
        match self.inner.rfind('/') {
            Some(idx) => &self.inner[..idx],
            None => "",
        }
    }

    /// Final segment of the identifier.
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }

    /// Extension of the final segment, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        let idx = name.rfind('.')?;
        if idx == 0 { None } else { Some(&name[idx + 1..]) }
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// Resolve a reference made from inside this document.
    ///
    /// Relative references resolve against this document's directory, the
    /// way `extends` targets are written. A leading `/` anchors the reference
    /// at the source root instead.
    pub fn resolve(&self, reference: &str) -> Self {
        let reference = reference.replace('\\', "/");
        if let Some(rooted) = reference.strip_prefix('/') {
            return Self::new(rooted);
        }

        let dir = self.directory();
        if dir.is_empty() {
            Self::new(reference)
        } else {
            Self::new(format!("{dir}/{reference}"))
        }
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.inner
    }
}
