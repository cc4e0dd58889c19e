//! Module categories and the patterns that identify their files

use serde::{Deserialize, Serialize};
use std::fmt;

/// How modules of a repository (or of one category) are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    #[default]
    FilenamePattern,
    DirectoryBased,
    MetadataFile,
    Hybrid,
}

impl DetectionStrategy {
    /// Whether a category using this strategy needs at least one pattern.
    pub fn requires_patterns(self) -> bool {
        matches!(self, Self::FilenamePattern | Self::Hybrid)
    }
}

/// How a [`ModulePattern::pattern`] string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Suffix,
    Prefix,
    #[default]
    Glob,
    Regex,
    Directory,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suffix => "suffix",
            Self::Prefix => "prefix",
            Self::Glob => "glob",
            Self::Regex => "regex",
            Self::Directory => "directory",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declarative rule identifying files of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulePattern {
    pub pattern: String,

    #[serde(rename = "type", alias = "pattern_type", default)]
    pub pattern_type: PatternType,

    /// Rule for turning a matched path into a clean module name,
    /// e.g. `remove-suffix:BidAdapter`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_extraction: Option<String>,

    /// Globs that veto an otherwise matching path.
    #[serde(default, alias = "exclude", skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<String>,
}

impl ModulePattern {
    pub fn new(pattern: impl Into<String>, pattern_type: PatternType) -> Self {
        Self {
            pattern: pattern.into(),
            pattern_type,
            name_extraction: None,
            exclude_patterns: Vec::new(),
        }
    }

    pub fn with_name_extraction(mut self, rule: impl Into<String>) -> Self {
        self.name_extraction = Some(rule.into());
        self
    }

    pub fn with_excludes<I, S>(mut self, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = excludes.into_iter().map(Into::into).collect();
        self
    }

    /// Parsed form of [`Self::name_extraction`], `None` when absent or unknown.
    pub fn extraction(&self) -> Option<NameExtraction> {
        self.name_extraction.as_deref().and_then(NameExtraction::parse)
    }
}

/// A named classification bucket such as "bid adapter".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleCategory {
    #[serde(default)]
    pub display_name: String,

    /// Directories the category is rooted under. Empty means anywhere.
    #[serde(default)]
    pub paths: Vec<String>,

    #[serde(default)]
    pub patterns: Vec<ModulePattern>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_strategy: Option<DetectionStrategy>,

    /// Only meaningful with [`DetectionStrategy::MetadataFile`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_value: Option<String>,
}

impl ModuleCategory {
    /// The category's own strategy, or the repository default.
    pub fn effective_strategy(&self, repository_default: DetectionStrategy) -> DetectionStrategy {
        self.detection_strategy.unwrap_or(repository_default)
    }
}

/// Parsed `name_extraction` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameExtraction {
    /// Strip the extension, then this suffix, from the file name.
    RemoveSuffix(String),
    /// Strip the extension, then this prefix, from the file name.
    RemovePrefix(String),
    /// Name of the immediate parent directory.
    ParentDirectory,
    /// File name without extension.
    Filename,
}

impl NameExtraction {
    /// Parse a rule string. Both `remove-suffix:` and `remove_suffix:`
    /// spellings are accepted.
    pub fn parse(rule: &str) -> Option<Self> {
        let rule = rule.trim();
        if let Some((op, arg)) = rule.split_once(':') {
            return match op.replace('_', "-").as_str() {
                "remove-suffix" if !arg.is_empty() => Some(Self::RemoveSuffix(arg.to_string())),
                "remove-prefix" if !arg.is_empty() => Some(Self::RemovePrefix(arg.to_string())),
                _ => None,
            };
        }

        match rule.replace('_', "-").as_str() {
            "parent-directory" | "directory" => Some(Self::ParentDirectory),
            "filename" => Some(Self::Filename),
            _ => None,
        }
    }

    /// Apply the rule to a `/`-separated path.
    ///
    /// Returns `None` when the rule does not apply (affix absent, no parent
    /// directory) or would produce an empty name.
    pub fn extract(&self, path: &str) -> Option<String> {
        let mut segments = path.rsplit('/');
        let file_name = segments.next().unwrap_or(path);
        let stem = match file_name.rfind('.') {
            Some(idx) if idx > 0 => &file_name[..idx],
            _ => file_name,
        };

        let name = match self {
            Self::RemoveSuffix(suffix) => stem.strip_suffix(suffix.as_str())?,
            Self::RemovePrefix(prefix) => stem.strip_prefix(prefix.as_str())?,
            Self::ParentDirectory => segments.next()?,
            Self::Filename => stem,
        };

        if name.is_empty() { None } else { Some(name.to_string()) }
    }
}
