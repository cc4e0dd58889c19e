//! Fully merged repository configuration

use glob::{MatchOptions, Pattern};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::{DetectionStrategy, ModuleCategory};
use super::fragment::{ConfigFragment, PathsFragment};
use crate::merge;

/// How much of a repository downstream consumers fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    FullContent,
    #[default]
    FilenamesOnly,
    DirectoryNames,
}

/// Kind of link between two repositories.
///
/// Unknown kinds are kept verbatim so documents written for newer tooling
/// still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    UsesModulesFrom,
    Extends,
    Documents,
    DependsOn,
    Other(String),
}

impl RelationshipType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::UsesModulesFrom => "uses_modules_from",
            Self::Extends => "extends",
            Self::Documents => "documents",
            Self::DependsOn => "depends_on",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for RelationshipType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "uses_modules_from" => Self::UsesModulesFrom,
            "extends" => Self::Extends,
            "documents" => Self::Documents,
            "depends_on" => Self::DependsOn,
            _ => Self::Other(s),
        }
    }
}

impl From<RelationshipType> for String {
    fn from(kind: RelationshipType) -> Self {
        kind.as_str().to_string()
    }
}

impl Serialize for RelationshipType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationshipType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared link to another repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type", alias = "relationship_type")]
    pub kind: RelationshipType,

    #[serde(alias = "target_repo")]
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Options every layout glob is matched with: `*` stays within a segment.
pub const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Entries used to flag files as core, test, docs or excluded.
///
/// An entry containing `*`, `?` or `[` is a glob (matched against the file
/// name alone when it has no `/`); anything else is a path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepositoryPaths {
    #[serde(default, alias = "core_paths")]
    pub core: Vec<String>,
    #[serde(default, alias = "test_paths")]
    pub test: Vec<String>,
    #[serde(default, alias = "doc_paths")]
    pub docs: Vec<String>,
    #[serde(default, alias = "exclude_paths")]
    pub exclude: Vec<String>,
}

impl RepositoryPaths {
    /// Replace each list the fragment declares.
    pub fn apply(&mut self, fragment: &PathsFragment) {
        merge::replace_list(&mut self.core, fragment.core.as_ref());
        merge::replace_list(&mut self.test, fragment.test.as_ref());
        merge::replace_list(&mut self.docs, fragment.docs.as_ref());
        merge::replace_list(&mut self.exclude, fragment.exclude.as_ref());
    }

    pub fn is_core(&self, path: &str) -> bool {
        under_any(&self.core, path)
    }

    pub fn is_test(&self, path: &str) -> bool {
        under_any(&self.test, path)
    }

    pub fn is_doc(&self, path: &str) -> bool {
        under_any(&self.docs, path)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        under_any(&self.exclude, path)
    }
}

/// Whether a `paths` entry is matched as a glob rather than a prefix.
pub fn is_glob_entry(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

fn under_any(entries: &[String], path: &str) -> bool {
    entries.iter().any(|entry| {
        if !is_glob_entry(entry) {
            return path.starts_with(entry.as_str());
        }
        let subject = if entry.contains('/') {
            path
        } else {
            path.rsplit('/').next().unwrap_or(path)
        };
        match Pattern::new(entry) {
            Ok(pattern) => pattern.matches_with(subject, GLOB_OPTIONS),
            Err(e) => {
                tracing::trace!(entry = entry.as_str(), error = %e, "Invalid paths glob");
                false
            }
        }
    })
}

impl From<PathsFragment> for RepositoryPaths {
    fn from(fragment: PathsFragment) -> Self {
        Self {
            core: fragment.core.unwrap_or_default(),
            test: fragment.test.unwrap_or_default(),
            docs: fragment.docs.unwrap_or_default(),
            exclude: fragment.exclude.unwrap_or_default(),
        }
    }
}

/// A repository configuration with inheritance fully resolved.
///
/// Version overrides are still carried unapplied; resolving a version view
/// clones this value and [`apply`](Self::apply)s the selected fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub repo_name: String,
    #[serde(default)]
    pub repo_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub detection_strategy: DetectionStrategy,
    #[serde(default)]
    pub fetch_strategy: FetchStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,
    #[serde(default)]
    pub module_categories: IndexMap<String, ModuleCategory>,
    #[serde(default)]
    pub paths: RepositoryPaths,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub version_overrides: IndexMap<String, ConfigFragment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RepositoryConfig {
    /// Fill defaults for everything a merged fragment left unset.
    ///
    /// `repo_name` is passed separately: it never comes from a parent.
    pub fn from_fragment(repo_name: impl Into<String>, fragment: ConfigFragment) -> Self {
        Self {
            repo_name: repo_name.into(),
            repo_type: fragment.repo_type.unwrap_or_default(),
            description: fragment.description,
            detection_strategy: fragment.detection_strategy.unwrap_or_default(),
            fetch_strategy: fragment.fetch_strategy.unwrap_or_default(),
            default_version: fragment.default_version,
            module_categories: fragment.module_categories.unwrap_or_default(),
            paths: fragment.paths.map(RepositoryPaths::from).unwrap_or_default(),
            version_overrides: fragment.version_overrides.unwrap_or_default(),
            relationships: fragment.relationships.unwrap_or_default(),
            metadata: fragment.metadata.unwrap_or_default(),
        }
    }

    /// Overlay a version override fragment.
    ///
    /// Identity fields (`repo_name`, `extends`) and nested
    /// `version_overrides` in the fragment are ignored.
    pub fn apply(&mut self, fragment: &ConfigFragment) {
        merge::replace_scalar(&mut self.repo_type, fragment.repo_type.as_ref());
        merge::replace_optional(&mut self.description, fragment.description.as_ref());
        merge::replace_scalar(&mut self.detection_strategy, fragment.detection_strategy.as_ref());
        merge::replace_scalar(&mut self.fetch_strategy, fragment.fetch_strategy.as_ref());
        merge::replace_optional(&mut self.default_version, fragment.default_version.as_ref());
        if let Some(categories) = &fragment.module_categories {
            merge::replace_by_key(&mut self.module_categories, categories);
        }
        if let Some(paths) = &fragment.paths {
            self.paths.apply(paths);
        }
        if let Some(relationships) = &fragment.relationships {
            merge::concat(&mut self.relationships, relationships);
        }
        if let Some(metadata) = &fragment.metadata {
            merge::replace_metadata(&mut self.metadata, metadata);
        }
    }

    /// `owner` part of `owner/name`, when well formed.
    pub fn owner(&self) -> Option<&str> {
        self.repo_name.split_once('/').map(|(owner, _)| owner)
    }
}
