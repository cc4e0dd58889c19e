//! Command implementations for repo-cli

pub mod list;
pub mod query;
pub mod validate;

pub use list::run_list;
pub use query::{run_categorize, run_related, run_show};
pub use validate::run_validate;

use repo_core::{ConfigManager, EngineOptions};
use repo_fs::DirectorySource;
use std::path::Path;

use crate::error::Result;

/// Engine options from `--options`, or defaults.
pub fn load_options(path: Option<&Path>) -> Result<EngineOptions> {
    match path {
        Some(path) => Ok(EngineOptions::load(path)?),
        None => Ok(EngineOptions::default()),
    }
}

/// Open the engine over the documents in `config`.
pub fn open_manager(config: &Path, options: EngineOptions) -> Result<ConfigManager<DirectorySource>> {
    tracing::debug!(config = %config.display(), ?options, "Opening layout documents");
    Ok(ConfigManager::open(config, options)?)
}
