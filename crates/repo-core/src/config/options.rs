//! Tunables for the layout engine

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// Engine tunables, loadable from TOML:
///
/// ```toml
/// cache_capacity = 200
/// strict_validation = false
/// ```
///
/// Every field is optional and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Maximum resolved views kept in the cache.
    pub cache_capacity: usize,
    /// Maximum documents in one `extends` chain.
    pub max_inheritance_depth: usize,
    /// Documents larger than this are rejected.
    pub max_document_bytes: u64,
    /// Fail loads whose configuration has error-severity issues.
    pub strict_validation: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_capacity: crate::cache::DEFAULT_CACHE_CAPACITY,
            max_inheritance_depth: repo_meta::DEFAULT_MAX_INHERITANCE_DEPTH,
            max_document_bytes: repo_fs::DEFAULT_MAX_DOCUMENT_BYTES,
            strict_validation: true,
        }
    }
}

impl EngineOptions {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| repo_fs::Error::io(path, e))?;
        Self::from_toml_str(&content)
    }
}
