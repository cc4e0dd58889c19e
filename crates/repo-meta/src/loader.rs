//! Document loading with `extends` resolution
//!
//! A repository document may name a parent through `extends`, a reference
//! relative to its own directory:
//!
//! ```text
//! repositories/
//!   shared/
//!     prebid-base.json        <- no repo_name: shared base
//!   prebid/
//!     prebid-js.json          <- "extends": "../shared/prebid-base.json"
//! ```
//!
//! The chain is walked leaf to root, then merged root to leaf with
//! [`ConfigFragment::inherit`].

use repo_fs::{DocumentId, DocumentSource};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::schema::{ConfigFragment, RepositoryConfig};
use crate::{Error, Result};

/// Default bound on the number of documents in one `extends` chain.
pub const DEFAULT_MAX_INHERITANCE_DEPTH: usize = 10;

/// Optional index document listing the repository documents to load.
///
/// ```json
/// { "repositories": ["repositories/prebid/prebid-js.json"] }
/// ```
pub const MASTER_DOCUMENT: &str = "repositories.json";

#[derive(Debug, Deserialize)]
struct MasterDocument {
    #[serde(default)]
    repositories: Vec<String>,
}

/// A repository configuration plus the documents it was built from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RepositoryConfig,
    /// Leaf first, root base last.
    pub chain: Vec<DocumentId>,
}

/// Reads and merges layout documents from a [`DocumentSource`].
#[derive(Debug)]
pub struct ConfigLoader<S> {
    source: S,
    max_depth: usize,
}

impl<S: DocumentSource> ConfigLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_depth: DEFAULT_MAX_INHERITANCE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Read and parse one document without following `extends`.
    pub fn read_document(&self, id: &DocumentId) -> Result<ConfigFragment> {
        let bytes = self.source.read_all(id)?;
        ConfigFragment::from_slice(&bytes).map_err(|source| Error::Parse {
            document: id.clone(),
            source,
        })
    }

    /// Resolve the `extends` chain of `id` into one merged fragment.
    ///
    /// The returned chain lists the documents read, leaf first.
    pub fn load_fragment(&self, id: &DocumentId) -> Result<(ConfigFragment, Vec<DocumentId>)> {
        let mut chain: Vec<DocumentId> = Vec::new();
        let mut fragments = Vec::new();
        let mut current = id.clone();

        loop {
            if chain.contains(&current) || chain.len() >= self.max_depth {
                return Err(Error::CyclicInheritance {
                    document: current,
                    chain,
                });
            }

            let fragment = match self.read_document(&current) {
                Err(Error::Fs(e)) if e.is_not_found() => {
                    return Err(match chain.last() {
                        Some(child) => Error::MissingParent {
                            document: child.clone(),
                            parent: current,
                        },
                        None => Error::Fs(e),
                    });
                }
                other => other?,
            };

            let parent = fragment
                .extends
                .as_deref()
                .map(|reference| current.resolve(reference));
            chain.push(current);
            fragments.push(fragment);

            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        let merged = fragments
            .into_iter()
            .rev()
            .fold(ConfigFragment::default(), ConfigFragment::inherit);

        tracing::debug!(
            document = %id,
            depth = chain.len(),
            "Resolved inheritance chain"
        );
        Ok((merged, chain))
    }

    /// Load a repository document with its full inheritance chain.
    pub fn load(&self, id: &DocumentId) -> Result<LoadedConfig> {
        let (fragment, chain) = self.load_fragment(id)?;
        let repo_name = fragment
            .repo_name
            .clone()
            .ok_or_else(|| Error::MissingRepoName {
                document: id.clone(),
            })?;

        Ok(LoadedConfig {
            config: RepositoryConfig::from_fragment(repo_name, fragment),
            chain,
        })
    }

    /// Documents that may describe a repository.
    ///
    /// The master document's list when present, otherwise every document
    /// outside a `schema/` directory.
    pub fn candidate_documents(&self) -> Result<Vec<DocumentId>> {
        let master_id = DocumentId::new(MASTER_DOCUMENT);
        match self.source.read_all(&master_id) {
            Ok(bytes) => {
                let master: MasterDocument =
                    serde_json::from_slice(&bytes).map_err(|source| Error::Parse {
                        document: master_id.clone(),
                        source,
                    })?;
                Ok(master
                    .repositories
                    .iter()
                    .map(|path| master_id.resolve(path))
                    .collect())
            }
            Err(e) if e.is_not_found() => Ok(self
                .source
                .list()?
                .into_iter()
                .filter(|id| *id != master_id && !in_schema_directory(id))
                .collect()),
            Err(e) => Err(e.into()),
        }
    }

    /// Map every repository name to the document declaring it.
    ///
    /// Unreadable documents are logged and skipped. When two documents
    /// declare the same name the first in source order wins.
    pub fn discover(&self) -> Result<BTreeMap<String, DocumentId>> {
        let mut found = BTreeMap::new();

        for id in self.candidate_documents()? {
            let fragment = match self.read_document(&id) {
                Ok(fragment) => fragment,
                Err(e) => {
                    tracing::error!(document = %id, error = %e, "Skipping unreadable document");
                    continue;
                }
            };

            let Some(name) = fragment.repo_name else {
                tracing::trace!(document = %id, "No repo_name, treating as shared base");
                continue;
            };

            if let Some(existing) = found.get(&name) {
                tracing::warn!(
                    repo = %name,
                    kept = %existing,
                    ignored = %id,
                    "Repository declared twice"
                );
                continue;
            }
            found.insert(name, id);
        }

        tracing::info!(
            source = %self.source.describe(),
            repositories = found.len(),
            "Discovered repositories"
        );
        Ok(found)
    }
}

fn in_schema_directory(id: &DocumentId) -> bool {
    let mut segments: Vec<&str> = id.segments().collect();
    segments.pop();
    segments.contains(&"schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use repo_fs::MemorySource;

    fn source(docs: &[(&str, &str)]) -> ConfigLoader<MemorySource> {
        let source = MemorySource::new();
        for (id, body) in docs {
            source.insert(*id, body.as_bytes());
        }
        ConfigLoader::new(source)
    }

    #[test]
    fn loads_single_document() {
        let loader = source(&[(
            "repositories/a.json",
            r#"{"repo_name": "owner/a", "repo_type": "lib"}"#,
        )]);
        let loaded = loader.load(&"repositories/a.json".into()).unwrap();
        assert_eq!(loaded.config.repo_name, "owner/a");
        assert_eq!(loaded.config.repo_type, "lib");
        assert_eq!(loaded.chain, vec![DocumentId::new("repositories/a.json")]);
    }

    #[test]
    fn resolves_relative_extends() {
        let loader = source(&[
            (
                "repositories/shared/base.json",
                r#"{"repo_type": "base", "description": "shared", "paths": {"test": ["test/"]}}"#,
            ),
            (
                "repositories/prebid/mid.json",
                r#"{"extends": "../shared/base.json", "repo_type": "mid"}"#,
            ),
            (
                "repositories/prebid/leaf.json",
                r#"{"extends": "mid.json", "repo_name": "prebid/leaf"}"#,
            ),
        ]);

        let loaded = loader.load(&"repositories/prebid/leaf.json".into()).unwrap();
        assert_eq!(loaded.config.repo_type, "mid");
        assert_eq!(loaded.config.description.as_deref(), Some("shared"));
        assert_eq!(loaded.config.paths.test, vec!["test/"]);
        assert_eq!(
            loaded.chain,
            vec![
                DocumentId::new("repositories/prebid/leaf.json"),
                DocumentId::new("repositories/prebid/mid.json"),
                DocumentId::new("repositories/shared/base.json"),
            ]
        );
    }

    #[test]
    fn missing_parent_names_both_documents() {
        let loader = source(&[(
            "repositories/a.json",
            r#"{"repo_name": "owner/a", "extends": "missing.json"}"#,
        )]);
        match loader.load(&"repositories/a.json".into()) {
            Err(Error::MissingParent { document, parent }) => {
                assert_eq!(document.as_str(), "repositories/a.json");
                assert_eq!(parent.as_str(), "repositories/missing.json");
            }
            other => panic!("expected MissingParent, got {other:?}"),
        }
    }

    #[test]
    fn missing_leaf_is_fs_not_found() {
        let loader = source(&[]);
        let err = loader.load(&"nope.json".into()).unwrap_err();
        assert!(matches!(err, Error::Fs(ref e) if e.is_not_found()));
    }

    #[test]
    fn detects_cycles() {
        let loader = source(&[
            ("a.json", r#"{"repo_name": "o/a", "extends": "b.json"}"#),
            ("b.json", r#"{"extends": "a.json"}"#),
        ]);
        match loader.load(&"a.json".into()) {
            Err(Error::CyclicInheritance { document, chain }) => {
                assert_eq!(document.as_str(), "a.json");
                assert_eq!(chain.len(), 2);
            }
            other => panic!("expected CyclicInheritance, got {other:?}"),
        }
    }

    #[test]
    fn self_extension_is_cyclic() {
        let loader = source(&[("a.json", r#"{"repo_name": "o/a", "extends": "./a.json"}"#)]);
        assert!(matches!(
            loader.load(&"a.json".into()),
            Err(Error::CyclicInheritance { .. })
        ));
    }

    #[test]
    fn depth_bound_is_enforced() {
        let mut docs = Vec::new();
        for i in 0..5 {
            docs.push((format!("d{i}.json"), format!(r#"{{"extends": "d{}.json"}}"#, i + 1)));
        }
        docs.push(("d5.json".to_string(), "{}".to_string()));
        let source = MemorySource::new();
        for (id, body) in &docs {
            source.insert(id.as_str(), body.as_bytes());
        }

        let loader = ConfigLoader::new(source).with_max_depth(3);
        assert!(matches!(
            loader.load_fragment(&"d0.json".into()),
            Err(Error::CyclicInheritance { .. })
        ));

        let loader = ConfigLoader::new(loader.source).with_max_depth(6);
        assert!(loader.load_fragment(&"d0.json".into()).is_ok());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let loader = source(&[("a.json", r#"{"repo_name": "#)]);
        assert!(matches!(
            loader.load(&"a.json".into()),
            Err(Error::Parse { ref document, .. }) if document.as_str() == "a.json"
        ));
    }

    #[test]
    fn leaf_without_name_is_rejected() {
        let loader = source(&[("base.json", r#"{"repo_type": "base"}"#)]);
        assert!(matches!(
            loader.load(&"base.json".into()),
            Err(Error::MissingRepoName { .. })
        ));
    }

    #[test]
    fn discovery_without_master_document() {
        let loader = source(&[
            ("repositories/a.json", r#"{"repo_name": "o/a"}"#),
            ("repositories/b.json", r#"{"repo_name": "o/a"}"#),
            ("repositories/shared/base.json", r#"{"repo_type": "x"}"#),
            ("schema/repository.json", r#"{"repo_name": "not/a-repo"}"#),
            ("repositories/broken.json", "{"),
        ]);
        let found = loader.discover().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["o/a"].as_str(), "repositories/a.json");
    }

    #[test]
    fn discovery_with_master_document() {
        let loader = source(&[
            (MASTER_DOCUMENT, r#"{"repositories": ["repositories/b.json"]}"#),
            ("repositories/a.json", r#"{"repo_name": "o/a"}"#),
            ("repositories/b.json", r#"{"repo_name": "o/b"}"#),
        ]);
        let found = loader.discover().unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["o/b"]);
    }
}
