//! Partial documents: raw bodies and version override values

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::category::{DetectionStrategy, ModuleCategory};
use super::repository::{FetchStrategy, Relationship};

/// Partial `paths` block; an absent list leaves the inherited one alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathsFragment {
    #[serde(default, alias = "core_paths", skip_serializing_if = "Option::is_none")]
    pub core: Option<Vec<String>>,
    #[serde(default, alias = "test_paths", skip_serializing_if = "Option::is_none")]
    pub test: Option<Vec<String>>,
    #[serde(default, alias = "doc_paths", skip_serializing_if = "Option::is_none")]
    pub docs: Option<Vec<String>>,
    #[serde(default, alias = "exclude_paths", skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

impl PathsFragment {
    /// Fill the kinds this block leaves unset from `flat`.
    fn fill_from(&mut self, flat: PathsFragment) {
        for (slot, value) in [
            (&mut self.core, flat.core),
            (&mut self.test, flat.test),
            (&mut self.docs, flat.docs),
            (&mut self.exclude, flat.exclude),
        ] {
            if slot.is_none() {
                *slot = value;
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.core.is_none() && self.test.is_none() && self.docs.is_none() && self.exclude.is_none()
    }
}

/// Any subset of a repository configuration.
///
/// Every field is optional so that "absent" and "explicitly empty" stay
/// distinguishable during merges. Unknown keys such as `$schema` are ignored.
/// Top-level `core_paths`, `test_paths`, `doc_paths` and `exclude_paths`
/// are folded into `paths`; a kind the `paths` block declares wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "FragmentDocument")]
pub struct ConfigFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,

    /// Parent document reference, relative to this document's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_strategy: Option<DetectionStrategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_strategy: Option<FetchStrategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_categories: Option<IndexMap<String, ModuleCategory>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsFragment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_overrides: Option<IndexMap<String, ConfigFragment>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<Relationship>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// On-disk shape of a fragment, before the flat path keys are folded.
#[derive(Deserialize)]
struct FragmentDocument {
    #[serde(default)]
    repo_name: Option<String>,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    repo_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "default_detection_strategy")]
    detection_strategy: Option<DetectionStrategy>,
    #[serde(default)]
    fetch_strategy: Option<FetchStrategy>,
    #[serde(default)]
    default_version: Option<String>,
    #[serde(default)]
    module_categories: Option<IndexMap<String, ModuleCategory>>,
    #[serde(default)]
    paths: Option<PathsFragment>,
    #[serde(default)]
    version_overrides: Option<IndexMap<String, ConfigFragment>>,
    #[serde(default)]
    relationships: Option<Vec<Relationship>>,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default)]
    core_paths: Option<Vec<String>>,
    #[serde(default)]
    test_paths: Option<Vec<String>>,
    #[serde(default)]
    doc_paths: Option<Vec<String>>,
    #[serde(default)]
    exclude_paths: Option<Vec<String>>,
}

impl From<FragmentDocument> for ConfigFragment {
    fn from(doc: FragmentDocument) -> Self {
        let flat = PathsFragment {
            core: doc.core_paths,
            test: doc.test_paths,
            docs: doc.doc_paths,
            exclude: doc.exclude_paths,
        };
        let paths = match (doc.paths, flat.is_empty()) {
            (paths, true) => paths,
            (Some(mut paths), false) => {
                paths.fill_from(flat);
                Some(paths)
            }
            (None, false) => Some(flat),
        };

        Self {
            repo_name: doc.repo_name,
            extends: doc.extends,
            repo_type: doc.repo_type,
            description: doc.description,
            detection_strategy: doc.detection_strategy,
            fetch_strategy: doc.fetch_strategy,
            default_version: doc.default_version,
            module_categories: doc.module_categories,
            paths,
            version_overrides: doc.version_overrides,
            relationships: doc.relationships,
            metadata: doc.metadata,
        }
    }
}

impl ConfigFragment {
    /// Parse a document body.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn absent_and_empty_are_distinct() {
        let fragment: ConfigFragment =
            serde_json::from_str(r#"{"paths": {"test": []}, "$schema": "../schema/repository.json"}"#)
                .unwrap();
        let paths = fragment.paths.unwrap();
        assert_eq!(paths.test, Some(vec![]));
        assert_eq!(paths.core, None);
        assert!(fragment.module_categories.is_none());
    }

    #[test]
    fn detection_strategy_alias() {
        let fragment =
            ConfigFragment::from_slice(br#"{"default_detection_strategy": "hybrid"}"#).unwrap();
        assert_eq!(fragment.detection_strategy, Some(DetectionStrategy::Hybrid));
    }

    #[test]
    fn flat_path_keys_fold_into_paths() {
        let fragment = ConfigFragment::from_slice(
            br#"{
                "core_paths": ["src/"],
                "test_paths": ["test/"],
                "doc_paths": ["docs/"],
                "exclude_paths": ["node_modules/"],
                "paths": {"test": ["spec/"]}
            }"#,
        )
        .unwrap();
        assert_eq!(
            fragment.paths,
            Some(PathsFragment {
                core: Some(vec!["src/".into()]),
                test: Some(vec!["spec/".into()]),
                docs: Some(vec!["docs/".into()]),
                exclude: Some(vec!["node_modules/".into()]),
            })
        );
    }

    #[test]
    fn path_block_accepts_long_key_names() {
        let fragment = ConfigFragment::from_slice(
            br#"{"version_overrides": {"v2+": {"paths": {"exclude_paths": ["vendor/"]}, "test_paths": ["t/"]}}}"#,
        )
        .unwrap();
        let paths = fragment.version_overrides.unwrap()["v2+"].paths.clone().unwrap();
        assert_eq!(paths.exclude, Some(vec!["vendor/".to_string()]));
        assert_eq!(paths.test, Some(vec!["t/".to_string()]));
        assert_eq!(paths.core, None);
    }

    #[test]
    fn nested_overrides_parse() {
        let fragment = ConfigFragment::from_slice(
            br#"{"version_overrides": {"v9.0": {"repo_type": "legacy"}, "v10.0+": {}}}"#,
        )
        .unwrap();
        let overrides = fragment.version_overrides.unwrap();
        let keys: Vec<&String> = overrides.keys().collect();
        assert_eq!(keys, vec!["v9.0", "v10.0+"]);
        assert_eq!(overrides["v9.0"].repo_type.as_deref(), Some("legacy"));
    }
}
