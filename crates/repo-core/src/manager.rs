//! The public engine API
//!
//! [`ConfigManager`] ties discovery, loading, validation, version
//! specialisation, caching and hot reload together. It is `Send + Sync`;
//! every query runs synchronously on the caller's thread.
//!
//! ```no_run
//! use repo_core::{ConfigManager, EngineOptions};
//!
//! let manager = ConfigManager::open("config", EngineOptions::default())?;
//! let result = manager.categorize_file(
//!     "https://github.com/prebid/Prebid.js",
//!     "modules/rubiconBidAdapter.js",
//!     Some("v9.0"),
//! )?;
//! println!("{:?} {:?}", result.best_match, result.extracted_name);
//! # Ok::<(), repo_core::Error>(())
//! ```

use parking_lot::{Mutex, RwLock};
use repo_fs::{ChangeNotifier, DirectorySource, DocumentId, DocumentSource, FsNotifier};
use repo_meta::{ConfigLoader, RelationshipType};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::cache::{CacheStats, ConfigCache, Invalidate};
use crate::config::{CategorizationResult, ConfigResolver, EngineOptions, ModuleInfo, ResolvedConfig};
use crate::watcher::{ChangeWatcher, DependencyIndex};
use crate::{Error, Result};

/// Normalize a repository identifier to `owner/name`.
///
/// Accepts `owner/name`, `https://github.com/owner/name[.git]` (extra path
/// segments such as `/tree/main` are dropped) and
/// `git@github.com:owner/name.git`.
pub fn normalize_repo_name(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');

    let from_url = if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
        Some(rest)
    } else {
        trimmed
            .find("github.com/")
            .map(|idx| &trimmed[idx + "github.com/".len()..])
    };

    match from_url {
        Some(rest) => {
            let name = rest.split('/').take(2).collect::<Vec<_>>().join("/");
            name.strip_suffix(".git").unwrap_or(&name).to_string()
        }
        None => trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string(),
    }
}

/// Repository layout engine.
pub struct ConfigManager<S> {
    resolver: ConfigResolver<S>,
    options: EngineOptions,
    registry: RwLock<BTreeMap<String, DocumentId>>,
    index: Arc<DependencyIndex>,
    cache: Arc<ConfigCache<ResolvedConfig>>,
    watcher: Mutex<Option<ChangeWatcher>>,
}

impl ConfigManager<DirectorySource> {
    /// Open the documents under `root`.
    pub fn open(root: impl AsRef<Path>, options: EngineOptions) -> Result<Self> {
        let source =
            DirectorySource::new(root)?.with_max_document_bytes(options.max_document_bytes);
        Self::new(source, options)
    }

    /// Start hot reload from filesystem events under the source root.
    pub fn watch(self) -> Result<Self> {
        let notifier = FsNotifier::new(self.source().root())?;
        self.with_watcher(notifier)
    }
}

impl<S: DocumentSource> ConfigManager<S> {
    /// Create an engine over `source` and run discovery.
    pub fn new(source: S, options: EngineOptions) -> Result<Self> {
        let loader = ConfigLoader::new(source).with_max_depth(options.max_inheritance_depth);
        let manager = Self {
            resolver: ConfigResolver::new(loader, options.strict_validation),
            cache: Arc::new(ConfigCache::new(options.cache_capacity)),
            options,
            registry: RwLock::new(BTreeMap::new()),
            index: Arc::new(DependencyIndex::new()),
            watcher: Mutex::new(None),
        };
        manager.rediscover()?;
        Ok(manager)
    }

    /// Attach a change notifier; its events evict affected cache entries.
    pub fn with_watcher(self, notifier: impl ChangeNotifier + 'static) -> Result<Self> {
        let target: Arc<dyn Invalidate> = self.cache.clone();
        let watcher = ChangeWatcher::start(Box::new(notifier), Arc::clone(&self.index), target)?;
        if let Some(mut previous) = self.watcher.lock().replace(watcher) {
            previous.stop()?;
        }
        Ok(self)
    }

    pub fn source(&self) -> &S {
        self.resolver.loader().source()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Known repository names, sorted.
    pub fn repositories(&self) -> Vec<String> {
        self.registry.read().keys().cloned().collect()
    }

    /// The base view of a repository, or its `default_version` view.
    pub fn get_repository(&self, repo: &str) -> Result<Arc<ResolvedConfig>> {
        self.resolve(repo, None)
    }

    /// The view of a repository specialised for `version`.
    pub fn resolve(&self, repo: &str, version: Option<&str>) -> Result<Arc<ResolvedConfig>> {
        let name = normalize_repo_name(repo);
        let document = self.document_for(&name)?;

        self.cache.get_or_compute(&name, version, || {
            let resolved = self.resolver.resolve(&document, version)?;
            self.index.record(&name, resolved.chain());
            Ok::<_, Error>(Arc::new(resolved))
        })
    }

    /// Classify `path` within `repo`.
    pub fn categorize_file(
        &self,
        repo: &str,
        path: &str,
        version: Option<&str>,
    ) -> Result<CategorizationResult> {
        Ok(self.resolve(repo, version)?.categorize(path))
    }

    /// Categorization plus the repository type and a module name.
    pub fn module_info(&self, repo: &str, path: &str, version: Option<&str>) -> Result<ModuleInfo> {
        let resolved = self.resolve(repo, version)?;
        let categorization = resolved.categorize(path);
        Ok(ModuleInfo::new(&resolved, categorization))
    }

    /// `(target, relationship)` pairs declared by `repo`.
    pub fn related_repositories(&self, repo: &str) -> Result<Vec<(String, RelationshipType)>> {
        Ok(self
            .get_repository(repo)?
            .config()
            .relationships
            .iter()
            .map(|rel| (rel.target.clone(), rel.kind.clone()))
            .collect())
    }

    /// Evict every cached view of `repo` without reloading.
    pub fn invalidate(&self, repo: &str) {
        self.cache.invalidate(&normalize_repo_name(repo));
    }

    /// Invalidate and eagerly re-resolve one repository, or everything.
    ///
    /// Reloading everything also re-runs discovery. Every repository is
    /// attempted; the first failure is returned.
    pub fn reload(&self, repo: Option<&str>) -> Result<()> {
        match repo {
            Some(repo) => {
                let name = normalize_repo_name(repo);
                self.cache.invalidate(&name);
                self.get_repository(&name)?;
                tracing::info!(repo = %name, "Reloaded repository configuration");
                Ok(())
            }
            None => {
                self.rediscover()?;
                self.cache.invalidate_all();

                let mut first_error = None;
                let repositories = self.repositories();
                for name in &repositories {
                    if let Err(e) = self.get_repository(name) {
                        tracing::error!(repo = %name, error = %e, "Reload failed");
                        first_error.get_or_insert(e);
                    }
                }
                tracing::info!(repositories = repositories.len(), "Reloaded all configurations");
                first_error.map_or(Ok(()), Err)
            }
        }
    }

    /// Stop the change watcher, if any. Queries keep working afterwards.
    pub fn shutdown(&self) -> Result<()> {
        if let Some(mut watcher) = self.watcher.lock().take() {
            watcher.stop()?;
        }
        Ok(())
    }

    fn document_for(&self, name: &str) -> Result<DocumentId> {
        if self.index.take_stale() {
            self.rediscover()?;
        }

        if let Some(document) = self.registry.read().get(name) {
            return Ok(document.clone());
        }

        tracing::debug!(repo = name, "Unknown repository, re-running discovery");
        self.rediscover()?;
        self.registry
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    fn rediscover(&self) -> Result<()> {
        let found = self.resolver.loader().discover()?;

        let changed: Vec<String> = {
            let mut registry = self.registry.write();
            let changed = registry
                .iter()
                .filter(|(name, document)| found.get(*name) != Some(*document))
                .map(|(name, _)| name.clone())
                .collect();
            *registry = found;
            changed
        };

        for name in &changed {
            self.cache.invalidate(name);
            self.index.forget(name);
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for ConfigManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("options", &self.options)
            .field("repositories", &self.registry.read().len())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
