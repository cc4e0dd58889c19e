//! Version-specialised configuration views
//!
//! A [`ResolvedConfig`] is built once per `(repository, version)` on a cache
//! miss: the merged document has the selected version overrides applied in
//! ascending specificity, and its categories are compiled for matching. It is
//! immutable afterwards and shared as `Arc<ResolvedConfig>`.

use repo_fs::{DocumentId, DocumentSource};
use repo_meta::{ConfigLoader, RepositoryConfig, has_errors, select_overrides, validate};
use serde::Serialize;

use crate::matcher::{CompiledCategory, normalize_path};
use crate::{Error, Result};

/// An immutable, version-specialised repository configuration.
#[derive(Debug)]
pub struct ResolvedConfig {
    config: RepositoryConfig,
    version: Option<String>,
    applied_overrides: Vec<String>,
    chain: Vec<DocumentId>,
    categories: Vec<CompiledCategory>,
}

impl ResolvedConfig {
    /// Specialise `base` for `version`.
    ///
    /// With no version, `base.default_version` is used; with neither, no
    /// overrides apply.
    pub fn new(base: RepositoryConfig, version: Option<&str>, chain: Vec<DocumentId>) -> Self {
        let version = version
            .map(str::to_string)
            .or_else(|| base.default_version.clone());

        let mut config = base.clone();
        let mut applied_overrides = Vec::new();
        if let Some(version) = version.as_deref() {
            for selected in select_overrides(&base.version_overrides, version) {
                config.apply(selected.value);
                applied_overrides.push(selected.key.to_string());
            }
        }

        let categories = config
            .module_categories
            .iter()
            .map(|(key, category)| CompiledCategory::compile(key, category))
            .collect();

        Self {
            config,
            version,
            applied_overrides,
            chain,
            categories,
        }
    }

    pub fn repo_name(&self) -> &str {
        &self.config.repo_name
    }

    /// The effective configuration, overrides applied.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// The version this view was specialised for, if any.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Override keys applied, in application order.
    pub fn applied_overrides(&self) -> &[String] {
        &self.applied_overrides
    }

    /// Documents this view was built from, leaf first.
    pub fn chain(&self) -> &[DocumentId] {
        &self.chain
    }

    /// Classify a repository-relative file path.
    pub fn categorize(&self, path: &str) -> CategorizationResult {
        let path = normalize_path(path);
        let paths = &self.config.paths;
        let mut result = CategorizationResult {
            is_core: paths.is_core(&path),
            is_test: paths.is_test(&path),
            is_doc: paths.is_doc(&path),
            excluded: paths.is_excluded(&path),
            path,
            ..Default::default()
        };

        if result.excluded {
            return result;
        }

        for category in &self.categories {
            if !category.covers(&result.path) {
                continue;
            }
            let outcome = category.match_path(&result.path);
            if !outcome.matched {
                continue;
            }

            result.categories.push(category.key().to_string());
            if result.best_match.is_none() || outcome.confidence > result.confidence {
                result.best_match = Some(category.key().to_string());
                result.module_type = Some(category.display_name().to_string());
                result.confidence = outcome.confidence;
                result.extracted_name = outcome.extracted_name;
            }
        }

        result
    }
}

/// Classification of one file path.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CategorizationResult {
    /// The normalized path that was classified.
    pub path: String,
    /// Every matching category key, in declaration order.
    pub categories: Vec<String>,
    pub best_match: Option<String>,
    pub confidence: f64,
    pub extracted_name: Option<String>,
    /// Display name of the best match.
    pub module_type: Option<String>,
    pub is_core: bool,
    pub is_test: bool,
    pub is_doc: bool,
    /// Under `paths.exclude`; excluded paths match no category.
    pub excluded: bool,
}

impl CategorizationResult {
    pub fn is_categorized(&self) -> bool {
        self.best_match.is_some()
    }
}

/// Categorization plus repository-level facts about a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleInfo {
    #[serde(flatten)]
    pub categorization: CategorizationResult,
    pub repo_type: String,
    /// Extracted name, or the file stem when a category matched without one.
    pub module_name: Option<String>,
}

impl ModuleInfo {
    pub fn new(resolved: &ResolvedConfig, categorization: CategorizationResult) -> Self {
        let module_name = categorization.extracted_name.clone().or_else(|| {
            categorization.is_categorized().then(|| {
                let name = categorization
                    .path
                    .rsplit('/')
                    .next()
                    .unwrap_or(&categorization.path);
                match name.rfind('.') {
                    Some(idx) if idx > 0 => name[..idx].to_string(),
                    _ => name.to_string(),
                }
            })
        });

        Self {
            categorization,
            repo_type: resolved.config().repo_type.clone(),
            module_name,
        }
    }
}

/// Loads, validates and specialises repository configurations.
#[derive(Debug)]
pub struct ConfigResolver<S> {
    loader: ConfigLoader<S>,
    strict: bool,
}

impl<S: DocumentSource> ConfigResolver<S> {
    pub fn new(loader: ConfigLoader<S>, strict: bool) -> Self {
        Self { loader, strict }
    }

    pub fn loader(&self) -> &ConfigLoader<S> {
        &self.loader
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Load `document`, validate it and build the view for `version`.
    pub fn resolve(&self, document: &DocumentId, version: Option<&str>) -> Result<ResolvedConfig> {
        let loaded = self.loader.load(document)?;

        let issues = validate(&loaded.config);
        if self.strict && has_errors(&issues) {
            return Err(Error::Validation {
                document: document.clone(),
                issues,
            });
        }
        for issue in &issues {
            if issue.is_error() {
                tracing::warn!(document = %document, %issue, "Proceeding despite validation error");
            } else {
                tracing::debug!(document = %document, %issue, "Validation warning");
            }
        }

        let resolved = ResolvedConfig::new(loaded.config, version, loaded.chain);
        tracing::debug!(
            repo = resolved.repo_name(),
            version = ?resolved.version(),
            overrides = ?resolved.applied_overrides(),
            "Resolved configuration"
        );
        Ok(resolved)
    }
}
