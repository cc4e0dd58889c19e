//! Path classification against module categories
//!
//! Patterns are compiled once per resolved configuration. Each pattern type
//! carries a fixed confidence:
//!
//! | type | matches | confidence |
//! |------|---------|------------|
//! | `suffix` | final segment ends with the pattern (leading `*` stripped) | 1.0 |
//! | `prefix` | final segment starts with the pattern (trailing `*` stripped) | 1.0 |
//! | `directory` | directory components, `*` for one segment, trailing `/**` for any depth | 0.9 |
//! | `regex` | searched anywhere in the path | 0.8 |
//! | `glob` | `*` within a segment, `**` across segments | 0.6 |
//!
//! Globs without a `/` (patterns and excludes alike) are matched against the
//! final segment only.

use repo_meta::{GLOB_OPTIONS, ModuleCategory, ModulePattern, NameExtraction, PatternType};
use regex::Regex;

pub const SUFFIX_CONFIDENCE: f64 = 1.0;
pub const PREFIX_CONFIDENCE: f64 = 1.0;
pub const DIRECTORY_CONFIDENCE: f64 = 0.9;
pub const REGEX_CONFIDENCE: f64 = 0.8;
pub const GLOB_CONFIDENCE: f64 = 0.6;

/// Normalize a caller-supplied path to the `/`-separated, root-relative form
/// patterns are written against.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Result of matching one path against one category.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    pub matched: bool,
    pub confidence: f64,
    pub extracted_name: Option<String>,
    /// Index of the winning pattern within the category.
    pub pattern_index: Option<usize>,
}

impl MatchOutcome {
    pub fn no_match() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
struct ScopedGlob {
    pattern: glob::Pattern,
    name_only: bool,
}

impl ScopedGlob {
    fn new(source: &str) -> Result<Self, glob::PatternError> {
        Ok(Self {
            pattern: glob::Pattern::new(source)?,
            name_only: !source.contains('/'),
        })
    }

    fn matches(&self, path: &str) -> bool {
        let subject = if self.name_only { file_name(path) } else { path };
        self.pattern.matches_with(subject, GLOB_OPTIONS)
    }
}

#[derive(Debug)]
enum Rule {
    Suffix(String),
    Prefix(String),
    Directory { segments: Vec<String>, deep: bool },
    Glob(ScopedGlob),
    Regex(Regex),
    /// Failed to compile; never matches.
    Invalid,
}

impl Rule {
    fn compile(category: &str, pattern: &ModulePattern) -> Self {
        let source = pattern.pattern.as_str();
        let compiled = match pattern.pattern_type {
            PatternType::Suffix => Ok(Self::Suffix(source.trim_start_matches('*').to_string())),
            PatternType::Prefix => Ok(Self::Prefix(source.trim_end_matches('*').to_string())),
            PatternType::Directory => {
                let mut segments: Vec<String> = source
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                let deep = segments.last().is_some_and(|s| s == "**");
                if deep {
                    segments.pop();
                }
                Ok(Self::Directory { segments, deep })
            }
            PatternType::Glob => ScopedGlob::new(source)
                .map(Self::Glob)
                .map_err(|e| e.to_string()),
            PatternType::Regex => Regex::new(source).map(Self::Regex).map_err(|e| e.to_string()),
        };

        compiled.unwrap_or_else(|reason| {
            tracing::warn!(
                category,
                pattern = source,
                pattern_type = %pattern.pattern_type,
                %reason,
                "Invalid pattern, treating as non-matching"
            );
            Self::Invalid
        })
    }

    fn confidence(&self) -> f64 {
        match self {
            Self::Suffix(_) => SUFFIX_CONFIDENCE,
            Self::Prefix(_) => PREFIX_CONFIDENCE,
            Self::Directory { .. } => DIRECTORY_CONFIDENCE,
            Self::Regex(_) => REGEX_CONFIDENCE,
            Self::Glob(_) => GLOB_CONFIDENCE,
            Self::Invalid => 0.0,
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Suffix(suffix) => file_name(path).ends_with(suffix.as_str()),
            Self::Prefix(prefix) => file_name(path).starts_with(prefix.as_str()),
            Self::Directory { segments, deep } => {
                let mut directories: Vec<&str> = path.split('/').collect();
                directories.pop();
                let depth_ok = if *deep {
                    directories.len() >= segments.len()
                } else {
                    directories.len() == segments.len()
                };
                depth_ok
                    && segments
                        .iter()
                        .zip(&directories)
                        .all(|(want, have)| want == "*" || want == have)
            }
            Self::Glob(glob) => glob.matches(path),
            Self::Regex(regex) => regex.is_match(path),
            Self::Invalid => false,
        }
    }
}

#[derive(Debug)]
struct CompiledPattern {
    rule: Rule,
    excludes: Vec<ScopedGlob>,
    extraction: Option<NameExtraction>,
}

impl CompiledPattern {
    fn compile(category: &str, pattern: &ModulePattern) -> Self {
        let excludes = pattern
            .exclude_patterns
            .iter()
            .filter_map(|exclude| match ScopedGlob::new(exclude) {
                Ok(glob) => Some(glob),
                Err(e) => {
                    tracing::warn!(category, exclude = %exclude, error = %e, "Invalid exclude glob ignored");
                    None
                }
            })
            .collect();

        Self {
            rule: Rule::compile(category, pattern),
            excludes,
            extraction: pattern.extraction(),
        }
    }

    fn excluded(&self, path: &str) -> bool {
        self.excludes.iter().any(|glob| glob.matches(path))
    }
}

/// A module category with its patterns compiled.
#[derive(Debug)]
pub struct CompiledCategory {
    key: String,
    display_name: String,
    roots: Vec<String>,
    patterns: Vec<CompiledPattern>,
}

impl CompiledCategory {
    pub fn compile(key: &str, category: &ModuleCategory) -> Self {
        Self {
            key: key.to_string(),
            display_name: category.display_name.clone(),
            roots: category.paths.iter().map(|root| normalize_path(root)).collect(),
            patterns: category
                .patterns
                .iter()
                .map(|pattern| CompiledPattern::compile(key, pattern))
                .collect(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether the category's `paths` admit this (normalized) path.
    ///
    /// Roots are directories: `modules/` covers `modules/a.js` but not
    /// `modules.js`, and a root that normalizes to nothing covers everything.
    pub fn covers(&self, path: &str) -> bool {
        self.roots.is_empty()
            || self.roots.iter().any(|root| {
                root.is_empty()
                    || path
                        .strip_prefix(root.as_str())
                        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
    }

    /// Best matching pattern for a normalized path.
    ///
    /// Highest confidence wins; on ties the first declared pattern wins.
    pub fn match_path(&self, path: &str) -> MatchOutcome {
        let mut best: Option<(usize, &CompiledPattern)> = None;

        for (index, pattern) in self.patterns.iter().enumerate() {
            if pattern.excluded(path) || !pattern.rule.matches(path) {
                continue;
            }
            let better = best.is_none_or(|(_, current)| {
                pattern.rule.confidence() > current.rule.confidence()
            });
            if better {
                best = Some((index, pattern));
            }
        }

        match best {
            Some((index, pattern)) => MatchOutcome {
                matched: true,
                confidence: pattern.rule.confidence(),
                extracted_name: pattern
                    .extraction
                    .as_ref()
                    .and_then(|rule| rule.extract(path)),
                pattern_index: Some(index),
            },
            None => MatchOutcome::no_match(),
        }
    }
}

/// Match a path against a single category without caching the compilation.
pub fn match_category(path: &str, key: &str, category: &ModuleCategory) -> MatchOutcome {
    let path = normalize_path(path);
    let compiled = CompiledCategory::compile(key, category);
    if compiled.covers(&path) {
        compiled.match_path(&path)
    } else {
        MatchOutcome::no_match()
    }
}
