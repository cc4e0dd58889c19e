//! Repository layout documents for the layout engine.
//!
//! This crate owns everything that happens to configuration documents before
//! any file path is classified:
//!
//! - [`schema`]: typed documents, partial fragments and merged configs
//! - [`merge`]: the per-field-family merge rules used by `extends` and
//!   version overrides
//! - [`loader`]: `extends` chain resolution and repository discovery
//! - [`validation`]: schema and semantic checks
//! - [`version`]: version selector parsing and override ordering

pub mod error;
pub mod loader;
pub mod merge;
pub mod schema;
pub mod validation;
pub mod version;

pub use error::{Error, Result};
pub use loader::{ConfigLoader, DEFAULT_MAX_INHERITANCE_DEPTH, LoadedConfig, MASTER_DOCUMENT};
pub use schema::{
    ConfigFragment, DetectionStrategy, FetchStrategy, GLOB_OPTIONS, ModuleCategory, ModulePattern,
    NameExtraction, PathsFragment, PatternType, Relationship, RelationshipType, RepositoryConfig,
    RepositoryPaths, is_glob_entry,
};
pub use validation::{
    DocumentReport, IssueKind, Severity, ValidationIssue, has_errors, validate, validate_all,
};
pub use version::{SelectedOverride, SelectorKind, VersionSelector, parse_version, select_overrides};
