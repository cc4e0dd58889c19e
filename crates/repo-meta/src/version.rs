//! Version selectors for `version_overrides`
//!
//! Three selector forms are accepted as override keys:
//!
//! - exact: `v10.0`, matching only `10.0.0`
//! - open lower bound: `v10.0+`, equivalent to `>=10.0`
//! - comparator list: `>=10.0,<11.0` with `>=`, `>`, `<=`, `<` and `==`;
//!   a bare version inside a list means `==`
//!
//! Versions tolerate a leading non-digit prefix (`v`, `release-`) and missing
//! minor or patch components. Pre-release and build suffixes are ignored.
//!
//! # Ordering
//!
//! [`select_overrides`] returns matching overrides least specific first, so
//! that applying them in order lets the most specific one win:
//!
//! 1. ranges before exact selectors
//! 2. a range strictly contained in another range after it
//! 3. an open range (no upper bound) before a non-nested bounded range
//! 4. otherwise declaration order
//!
//! ```
//! use indexmap::IndexMap;
//! use repo_meta::select_overrides;
//!
//! let mut overrides = IndexMap::new();
//! overrides.insert("v10.0".to_string(), "exact");
//! overrides.insert("v10.0+".to_string(), "open");
//! overrides.insert(">=9.0,<11.0".to_string(), "bounded");
//!
//! let keys: Vec<&str> = select_overrides(&overrides, "10.0")
//!     .iter()
//!     .map(|s| s.key)
//!     .collect();
//! assert_eq!(keys, vec!["v10.0+", ">=9.0,<11.0", "v10.0"]);
//! ```

use indexmap::IndexMap;
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

use crate::error::{Error, Result};

/// Parse a loosely formatted version into `major.minor.patch`.
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let start = trimmed
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| Error::invalid_version(input, "no numeric component"))?;
    let rest = &trimmed[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let core = &rest[..end];

    let mut parts = [0u64; 3];
    let mut count = 0;
    for component in core.split('.') {
        if count == parts.len() {
            return Err(Error::invalid_version(input, "more than three components"));
        }
        parts[count] = component
            .parse()
            .map_err(|_| Error::invalid_version(input, format!("bad component '{component}'")))?;
        count += 1;
    }

    Ok(Version::new(parts[0], parts[1], parts[2]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    Exact,
    AtLeast,
    Range,
}

/// A parsed `version_overrides` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSelector {
    raw: String,
    kind: SelectorKind,
    lower: Bound<Version>,
    upper: Bound<Version>,
}

impl VersionSelector {
    pub fn parse(key: &str) -> Result<Self> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_version(key, "empty selector"));
        }

        let is_range = trimmed.starts_with(['<', '>', '=']) || trimmed.contains(',');
        let (kind, lower, upper) = if is_range {
            let (lower, upper) = parse_comparators(key, trimmed)?;
            (SelectorKind::Range, lower, upper)
        } else if let Some(base) = trimmed.strip_suffix('+') {
            let version = parse_version(base)?;
            (SelectorKind::AtLeast, Bound::Included(version), Bound::Unbounded)
        } else {
            let version = parse_version(trimmed)?;
            (
                SelectorKind::Exact,
                Bound::Included(version.clone()),
                Bound::Included(version),
            )
        };

        Ok(Self {
            raw: key.to_string(),
            kind,
            lower,
            upper,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    pub fn lower(&self) -> &Bound<Version> {
        &self.lower
    }

    pub fn upper(&self) -> &Bound<Version> {
        &self.upper
    }

    /// No upper bound.
    pub fn is_open(&self) -> bool {
        matches!(self.upper, Bound::Unbounded)
    }

    pub fn matches(&self, version: &Version) -> bool {
        let above = match &self.lower {
            Bound::Included(v) => version >= v,
            Bound::Excluded(v) => version > v,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(v) => version <= v,
            Bound::Excluded(v) => version < v,
            Bound::Unbounded => true,
        };
        above && below
    }

    fn same_bounds(&self, other: &Self) -> bool {
        self.lower == other.lower && self.upper == other.upper
    }

    /// `other` lies inside `self` and the two differ.
    pub fn strictly_contains(&self, other: &Self) -> bool {
        cmp_lower(&self.lower, &other.lower) != Ordering::Greater
            && cmp_upper(&other.upper, &self.upper) != Ordering::Greater
            && !self.same_bounds(other)
    }

    /// Whether `self` must be applied before `other`.
    pub fn precedes(&self, other: &Self) -> bool {
        match (self.kind, other.kind) {
            (SelectorKind::Exact, _) => false,
            (_, SelectorKind::Exact) => true,
            _ if self.same_bounds(other) => false,
            _ if self.strictly_contains(other) => true,
            _ if other.strictly_contains(self) => false,
            _ => self.is_open() && !other.is_open(),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_comparators(key: &str, list: &str) -> Result<(Bound<Version>, Bound<Version>)> {
    let mut lower = Bound::Unbounded;
    let mut upper = Bound::Unbounded;
    let mut seen = false;

    for spec in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        seen = true;
        let (op, version) = if let Some(rest) = spec.strip_prefix(">=") {
            (">=", rest)
        } else if let Some(rest) = spec.strip_prefix("<=") {
            ("<=", rest)
        } else if let Some(rest) = spec.strip_prefix("==") {
            ("==", rest)
        } else if spec.starts_with("!=") {
            return Err(Error::invalid_version(key, "'!=' is not supported"));
        } else if let Some(rest) = spec.strip_prefix('>') {
            (">", rest)
        } else if let Some(rest) = spec.strip_prefix('<') {
            ("<", rest)
        } else {
            ("==", spec)
        };

        let version = parse_version(version)?;
        let (new_lower, new_upper) = match op {
            ">=" => (Bound::Included(version), Bound::Unbounded),
            ">" => (Bound::Excluded(version), Bound::Unbounded),
            "<=" => (Bound::Unbounded, Bound::Included(version)),
            "<" => (Bound::Unbounded, Bound::Excluded(version)),
            _ => (Bound::Included(version.clone()), Bound::Included(version)),
        };

        if cmp_lower(&new_lower, &lower) == Ordering::Greater {
            lower = new_lower;
        }
        if cmp_upper(&new_upper, &upper) == Ordering::Less {
            upper = new_upper;
        }
    }

    if !seen {
        return Err(Error::invalid_version(key, "empty comparator list"));
    }
    Ok((lower, upper))
}

/// Orders lower bounds from least to most restrictive.
fn cmp_lower(a: &Bound<Version>, b: &Bound<Version>) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Less,
        (_, Bound::Unbounded) => Ordering::Greater,
        (Bound::Included(x), Bound::Included(y)) | (Bound::Excluded(x), Bound::Excluded(y)) => {
            x.cmp(y)
        }
        (Bound::Included(x), Bound::Excluded(y)) => x.cmp(y).then(Ordering::Less),
        (Bound::Excluded(x), Bound::Included(y)) => x.cmp(y).then(Ordering::Greater),
    }
}

/// Orders upper bounds from most to least restrictive.
fn cmp_upper(a: &Bound<Version>, b: &Bound<Version>) -> Ordering {
    match (a, b) {
        (Bound::Unbounded, Bound::Unbounded) => Ordering::Equal,
        (Bound::Unbounded, _) => Ordering::Greater,
        (_, Bound::Unbounded) => Ordering::Less,
        (Bound::Included(x), Bound::Included(y)) | (Bound::Excluded(x), Bound::Excluded(y)) => {
            x.cmp(y)
        }
        (Bound::Excluded(x), Bound::Included(y)) => x.cmp(y).then(Ordering::Less),
        (Bound::Included(x), Bound::Excluded(y)) => x.cmp(y).then(Ordering::Greater),
    }
}

/// An override picked for a queried version.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedOverride<'a, V> {
    pub key: &'a str,
    pub value: &'a V,
}

/// Pick the overrides whose selector contains `queried`, least specific first.
///
/// Keys that fail to parse are skipped. An unparsable `queried` version
/// selects nothing.
pub fn select_overrides<'a, V>(
    overrides: &'a IndexMap<String, V>,
    queried: &str,
) -> Vec<SelectedOverride<'a, V>> {
    let version = match parse_version(queried) {
        Ok(version) => version,
        Err(e) => {
            tracing::debug!(version = queried, error = %e, "Queried version does not parse");
            return Vec::new();
        }
    };

    let mut remaining: Vec<(VersionSelector, &'a String, &'a V)> = overrides
        .iter()
        .filter_map(|(key, value)| match VersionSelector::parse(key) {
            Ok(selector) => Some((selector, key, value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping unparsable version override");
                None
            }
        })
        .filter(|(selector, _, _)| selector.matches(&version))
        .collect();

    let mut ordered = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        // Earliest declared candidate with nothing left that must precede it
        let next = (0..remaining.len())
            .find(|&i| {
                !remaining
                    .iter()
                    .enumerate()
                    .any(|(j, (other, _, _))| j != i && other.precedes(&remaining[i].0))
            })
            .unwrap_or(0);
        let (_, key, value) = remaining.remove(next);
        ordered.push(SelectedOverride {
            key: key.as_str(),
            value,
        });
    }

    tracing::debug!(
        version = %version,
        selected = ?ordered.iter().map(|s| s.key).collect::<Vec<_>>(),
        "Selected version overrides"
    );
    ordered
}
