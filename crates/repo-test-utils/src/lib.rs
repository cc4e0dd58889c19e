//! Shared test fixtures for the repository layout workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`dir`]: [`ConfigDir`] builder over a temporary document directory
//! - [`fixtures`]: canonical Prebid-style layout documents
//! - [`counting`]: [`CountingSource`], a read-counting source wrapper

pub mod dir;
pub mod fixtures;
pub mod counting;

pub use dir::ConfigDir;
pub use counting::CountingSource;
