//! Engine options and version-specialised configuration views

mod options;
mod resolver;

pub use options::EngineOptions;
pub use resolver::{CategorizationResult, ConfigResolver, ModuleInfo, ResolvedConfig};
