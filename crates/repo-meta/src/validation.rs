//! Schema and semantic checks for merged repository configurations
//!
//! [`validate`] is pure: it never reads documents and never fails. Callers
//! decide what to do with error-severity issues (see [`has_errors`]).

use repo_fs::{DocumentId, DocumentSource};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::loader::ConfigLoader;
use crate::schema::{
    ConfigFragment, DetectionStrategy, ModuleCategory, NameExtraction, PatternType,
    RepositoryConfig, is_glob_entry,
};
use crate::version::VersionSelector;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    SchemaViolation,
    InvalidPattern,
    EmptyPatternList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A single problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// Dotted path to the offending field,
    /// e.g. `module_categories.bid_adapter.patterns[0].pattern`.
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: {}: {}", self.field, self.message)
    }
}

pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}

#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, kind: IssueKind, severity: Severity, field: String, message: String) {
        self.0.push(ValidationIssue {
            kind,
            severity,
            field,
            message,
        });
    }

    fn error(&mut self, kind: IssueKind, field: String, message: impl Into<String>) {
        self.push(kind, Severity::Error, field, message.into());
    }

    fn warning(&mut self, kind: IssueKind, field: String, message: impl Into<String>) {
        self.push(kind, Severity::Warning, field, message.into());
    }
}

/// Check a merged configuration, including every version override.
pub fn validate(config: &RepositoryConfig) -> Vec<ValidationIssue> {
    let mut issues = Issues::default();

    if !is_owner_name(&config.repo_name) {
        issues.error(
            IssueKind::SchemaViolation,
            "repo_name".into(),
            format!("'{}' is not of the form owner/name", config.repo_name),
        );
    }

    if config.repo_type.trim().is_empty() {
        issues.error(IssueKind::SchemaViolation, "repo_type".into(), "must not be empty");
    }

    if config.module_categories.is_empty() {
        issues.error(
            IssueKind::SchemaViolation,
            "module_categories".into(),
            "at least one module category is required",
        );
    }

    for (name, category) in &config.module_categories {
        check_category(
            &mut issues,
            &format!("module_categories.{name}"),
            category,
            config.detection_strategy,
        );
    }

    let paths = &config.paths;
    for (kind, entries) in [
        ("core", &paths.core),
        ("test", &paths.test),
        ("docs", &paths.docs),
        ("exclude", &paths.exclude),
    ] {
        check_path_entries(&mut issues, &format!("paths.{kind}"), entries);
    }

    for (key, fragment) in &config.version_overrides {
        check_override(&mut issues, key, fragment, config.detection_strategy);
    }

    issues.0
}

fn check_path_entries(issues: &mut Issues, prefix: &str, entries: &[String]) {
    for (index, entry) in entries.iter().enumerate() {
        if !is_glob_entry(entry) {
            continue;
        }
        if let Err(e) = glob::Pattern::new(entry) {
            issues.error(
                IssueKind::InvalidPattern,
                format!("{prefix}[{index}]"),
                format!("invalid glob: {e}"),
            );
        }
    }
}

fn is_owner_name(name: &str) -> bool {
    match name.split_once('/') {
        Some((owner, repo)) => {
            !owner.is_empty() && !repo.is_empty() && !repo.contains('/') && !name.contains(' ')
        }
        None => false,
    }
}

fn check_override(
    issues: &mut Issues,
    key: &str,
    fragment: &ConfigFragment,
    repository_default: DetectionStrategy,
) {
    let prefix = format!("version_overrides.{key}");

    if let Err(e) = VersionSelector::parse(key) {
        issues.error(IssueKind::SchemaViolation, prefix.clone(), e.to_string());
    }

    for (field, present) in [
        ("repo_name", fragment.repo_name.is_some()),
        ("extends", fragment.extends.is_some()),
        ("version_overrides", fragment.version_overrides.is_some()),
    ] {
        if present {
            issues.warning(
                IssueKind::SchemaViolation,
                format!("{prefix}.{field}"),
                "ignored inside a version override",
            );
        }
    }

    if let Some(paths) = &fragment.paths {
        for (kind, entries) in [
            ("core", &paths.core),
            ("test", &paths.test),
            ("docs", &paths.docs),
            ("exclude", &paths.exclude),
        ] {
            if let Some(entries) = entries {
                check_path_entries(issues, &format!("{prefix}.paths.{kind}"), entries);
            }
        }
    }

    let default = fragment.detection_strategy.unwrap_or(repository_default);
    for (name, category) in fragment.module_categories.iter().flatten() {
        check_category(
            issues,
            &format!("{prefix}.module_categories.{name}"),
            category,
            default,
        );
    }
}

fn check_category(
    issues: &mut Issues,
    prefix: &str,
    category: &ModuleCategory,
    repository_default: DetectionStrategy,
) {
    let strategy = category.effective_strategy(repository_default);

    if category.patterns.is_empty() && strategy.requires_patterns() {
        issues.error(
            IssueKind::EmptyPatternList,
            format!("{prefix}.patterns"),
            "pattern-based category has no patterns",
        );
    }

    if strategy == DetectionStrategy::MetadataFile && category.metadata_field.is_none() {
        issues.warning(
            IssueKind::SchemaViolation,
            format!("{prefix}.metadata_field"),
            "metadata_file detection without a metadata_field",
        );
    }

    let mut seen = HashSet::new();
    for (index, pattern) in category.patterns.iter().enumerate() {
        let field = format!("{prefix}.patterns[{index}]");

        if !seen.insert(pattern.pattern.as_str()) {
            issues.warning(
                IssueKind::InvalidPattern,
                format!("{field}.pattern"),
                format!("duplicate pattern '{}'", pattern.pattern),
            );
        }

        match pattern.pattern_type {
            PatternType::Regex => {
                if let Err(e) = regex::Regex::new(&pattern.pattern) {
                    issues.error(IssueKind::InvalidPattern, format!("{field}.pattern"), e.to_string());
                }
            }
            PatternType::Glob => {
                if let Err(e) = glob::Pattern::new(&pattern.pattern) {
                    issues.error(
                        IssueKind::InvalidPattern,
                        format!("{field}.pattern"),
                        format!("invalid glob: {e}"),
                    );
                }
            }
            PatternType::Suffix if !pattern.pattern.starts_with('*') => issues.warning(
                IssueKind::InvalidPattern,
                format!("{field}.pattern"),
                format!("suffix pattern should start with '*': {}", pattern.pattern),
            ),
            PatternType::Prefix if !pattern.pattern.ends_with('*') => issues.warning(
                IssueKind::InvalidPattern,
                format!("{field}.pattern"),
                format!("prefix pattern should end with '*': {}", pattern.pattern),
            ),
            _ => {}
        }

        if pattern.pattern.trim().is_empty() {
            issues.error(IssueKind::InvalidPattern, format!("{field}.pattern"), "empty pattern");
        }

        if let Some(rule) = &pattern.name_extraction {
            if NameExtraction::parse(rule).is_none() {
                issues.warning(
                    IssueKind::SchemaViolation,
                    format!("{field}.name_extraction"),
                    format!("unknown name extraction rule '{rule}'"),
                );
            }
        }

        for (exclude_index, exclude) in pattern.exclude_patterns.iter().enumerate() {
            if let Err(e) = glob::Pattern::new(exclude) {
                issues.error(
                    IssueKind::InvalidPattern,
                    format!("{field}.exclude_patterns[{exclude_index}]"),
                    format!("invalid glob: {e}"),
                );
            }
        }
    }
}

/// Outcome of validating one repository document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentReport {
    Issues(Vec<ValidationIssue>),
    /// The document could not be loaded at all.
    LoadFailed(String),
}

impl DocumentReport {
    pub fn is_ok(&self) -> bool {
        match self {
            Self::Issues(issues) => !has_errors(issues),
            Self::LoadFailed(_) => false,
        }
    }
}

/// Load and validate every repository document the loader can find.
///
/// Shared base documents (no `repo_name`) are skipped.
pub fn validate_all<S: DocumentSource>(
    loader: &ConfigLoader<S>,
) -> Result<BTreeMap<DocumentId, DocumentReport>> {
    let mut reports = BTreeMap::new();

    for id in loader.candidate_documents()? {
        let report = match loader.load(&id) {
            Ok(loaded) => DocumentReport::Issues(validate(&loaded.config)),
            Err(Error::MissingRepoName { .. }) => continue,
            Err(e) => DocumentReport::LoadFailed(e.to_string()),
        };
        reports.insert(id, report);
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModulePattern;
    use pretty_assertions::assert_eq;
    use repo_fs::MemorySource;

    fn config(json: &str) -> RepositoryConfig {
        let fragment: ConfigFragment = serde_json::from_str(json).unwrap();
        let name = fragment.repo_name.clone().unwrap_or_default();
        RepositoryConfig::from_fragment(name, fragment)
    }

    fn valid() -> RepositoryConfig {
        config(
            r#"{
                "repo_name": "prebid/Prebid.js",
                "repo_type": "prebid-js",
                "module_categories": {
                    "bid_adapter": {
                        "display_name": "Bid Adapters",
                        "patterns": [{"pattern": "*BidAdapter.js", "type": "suffix", "name_extraction": "remove-suffix:BidAdapter"}]
                    }
                }
            }"#,
        )
    }

    fn fields(issues: &[ValidationIssue]) -> Vec<(&str, Severity)> {
        issues.iter().map(|i| (i.field.as_str(), i.severity)).collect()
    }

    #[test]
    fn valid_config_has_no_issues() {
        assert_eq!(validate(&valid()), vec![]);
    }

    #[test]
    fn identity_errors() {
        let mut config = valid();
        config.repo_name = "Prebid.js".into();
        config.repo_type = " ".into();
        config.module_categories.clear();

        let issues = validate(&config);
        assert_eq!(
            fields(&issues),
            vec![
                ("repo_name", Severity::Error),
                ("repo_type", Severity::Error),
                ("module_categories", Severity::Error),
            ]
        );
    }

    #[test]
    fn invalid_regex_and_globs_are_errors() {
        let mut config = valid();
        let category = config.module_categories.get_mut("bid_adapter").unwrap();
        category.patterns = vec![
            ModulePattern::new("modules/(unclosed", PatternType::Regex),
            ModulePattern::new("modules/[a.js", PatternType::Glob),
            ModulePattern::new("*.js", PatternType::Glob).with_excludes(["[bad"]),
        ];

        let issues = validate(&config);
        assert_eq!(
            fields(&issues),
            vec![
                ("module_categories.bid_adapter.patterns[0].pattern", Severity::Error),
                ("module_categories.bid_adapter.patterns[1].pattern", Severity::Error),
                ("module_categories.bid_adapter.patterns[2].exclude_patterns[0]", Severity::Error),
            ]
        );
        assert!(issues.iter().all(|i| i.kind == IssueKind::InvalidPattern));
    }

    #[test]
    fn invalid_path_globs_are_errors() {
        let config = config(
            r#"{
                "repo_name": "prebid/Prebid.js",
                "repo_type": "prebid-js",
                "module_categories": {"core": {"patterns": [{"pattern": "src/*.js"}]}},
                "test_paths": ["test/", "**/*_spec.js"],
                "exclude_paths": ["*/vendor/*", "a/***/b", "[oops"],
                "version_overrides": {"v10.0+": {"paths": {"docs": ["docs/[x"]}}}
            }"#,
        );

        let issues = validate(&config);
        assert_eq!(
            fields(&issues),
            vec![
                ("paths.exclude[1]", Severity::Error),
                ("paths.exclude[2]", Severity::Error),
                ("version_overrides.v10.0+.paths.docs[0]", Severity::Error),
            ]
        );
        assert!(issues.iter().all(|i| i.kind == IssueKind::InvalidPattern));
    }

    #[test]
    fn empty_pattern_list_depends_on_strategy() {
        let mut config = valid();
        config.module_categories["bid_adapter"].patterns.clear();
        let issues = validate(&config);
        assert_eq!(issues[0].kind, IssueKind::EmptyPatternList);
        assert!(has_errors(&issues));

        config.module_categories["bid_adapter"].detection_strategy =
            Some(DetectionStrategy::DirectoryBased);
        assert!(!has_errors(&validate(&config)));
    }

    #[test]
    fn consistency_warnings() {
        let mut config = valid();
        let category = config.module_categories.get_mut("bid_adapter").unwrap();
        category.patterns = vec![
            ModulePattern::new("BidAdapter.js", PatternType::Suffix),
            ModulePattern::new("BidAdapter.js", PatternType::Suffix),
            ModulePattern::new("prebid", PatternType::Prefix).with_name_extraction("shout"),
        ];

        let issues = validate(&config);
        assert!(!has_errors(&issues));
        assert_eq!(
            fields(&issues),
            vec![
                ("module_categories.bid_adapter.patterns[0].pattern", Severity::Warning),
                ("module_categories.bid_adapter.patterns[1].pattern", Severity::Warning),
                ("module_categories.bid_adapter.patterns[1].pattern", Severity::Warning),
                ("module_categories.bid_adapter.patterns[2].pattern", Severity::Warning),
                ("module_categories.bid_adapter.patterns[2].name_extraction", Severity::Warning),
            ]
        );
    }

    #[test]
    fn override_keys_and_categories_are_checked() {
        let config = config(
            r#"{
                "repo_name": "prebid/Prebid.js",
                "repo_type": "prebid-js",
                "module_categories": {"core": {"patterns": [{"pattern": "src/*.js"}]}},
                "version_overrides": {
                    "someday": {},
                    "v10.0+": {
                        "repo_name": "other/name",
                        "module_categories": {"core": {"patterns": [{"pattern": "(", "type": "regex"}]}}
                    }
                }
            }"#,
        );

        let issues = validate(&config);
        assert_eq!(
            fields(&issues),
            vec![
                ("version_overrides.someday", Severity::Error),
                ("version_overrides.v10.0+.repo_name", Severity::Warning),
                ("version_overrides.v10.0+.module_categories.core.patterns[0].pattern", Severity::Error),
            ]
        );
    }

    #[test]
    fn metadata_strategy_wants_field() {
        let mut config = valid();
        let category = config.module_categories.get_mut("bid_adapter").unwrap();
        category.detection_strategy = Some(DetectionStrategy::MetadataFile);
        let issues = validate(&config);
        assert_eq!(
            fields(&issues),
            vec![("module_categories.bid_adapter.metadata_field", Severity::Warning)]
        );
    }

    #[test]
    fn validate_all_reports_per_document() {
        let source = MemorySource::new();
        source.insert(
            "repositories/good.json",
            r#"{"repo_name": "o/good", "repo_type": "lib", "module_categories": {"c": {"patterns": [{"pattern": "*.rs", "type": "suffix"}]}}}"#,
        );
        source.insert("repositories/bad.json", r#"{"repo_name": "o/bad", "extends": "gone.json"}"#);
        source.insert("repositories/base.json", r#"{"repo_type": "lib"}"#);
        let loader = ConfigLoader::new(source);

        let reports = validate_all(&loader).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[&DocumentId::new("repositories/good.json")], DocumentReport::Issues(vec![]));
        assert!(matches!(
            reports[&DocumentId::new("repositories/bad.json")],
            DocumentReport::LoadFailed(_)
        ));
    }
}
