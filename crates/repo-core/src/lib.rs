//! Repository layout engine
//!
//! Turns inheritable, version-sensitive layout documents into a classifier
//! that maps a file path to a module category, a display type and a clean
//! module name.
//!
//! # Architecture
//!
//! ```text
//!              ConfigManager
//!                    |
//!     +--------------+---------------+
//!     |              |               |
//! ConfigCache   ConfigResolver   ChangeWatcher
//!                    |               |
//!              repo-meta loader  DependencyIndex
//!                    |
//!              repo-fs sources
//! ```
//!
//! Queries go through the cache; a miss loads the `extends` chain, validates
//! the merged configuration, applies the matching version overrides and
//! compiles the categories. The watcher evicts views built from changed
//! documents.

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod matcher;
pub mod watcher;

pub use cache::{CacheStats, ConfigCache, DEFAULT_CACHE_CAPACITY, Invalidate};
pub use config::{CategorizationResult, ConfigResolver, EngineOptions, ModuleInfo, ResolvedConfig};
pub use error::{Error, Result};
pub use manager::{ConfigManager, normalize_repo_name};
pub use matcher::{CompiledCategory, MatchOutcome, match_category, normalize_path};
pub use watcher::{ChangeWatcher, DependencyIndex};
