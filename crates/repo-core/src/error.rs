//! Error types for repo-core

use repo_fs::DocumentId;
use repo_meta::ValidationIssue;

/// Result type for repo-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the layout engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No document declares this repository
    #[error("Repository not found: {repo}")]
    NotFound { repo: String },

    /// Strict validation rejected the merged configuration
    #[error("{document} failed validation: {}", summarize(.issues))]
    Validation {
        document: DocumentId,
        issues: Vec<ValidationIssue>,
    },

    /// The change watcher could not be started or stopped
    #[error("Change watcher error: {message}")]
    Watcher { message: String },

    /// Loading or merging documents failed
    #[error(transparent)]
    Load(#[from] repo_meta::Error),

    /// Filesystem error from repo-fs
    #[error(transparent)]
    Fs(#[from] repo_fs::Error),

    /// Engine options file could not be parsed
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

fn summarize(issues: &[ValidationIssue]) -> String {
    let errors: Vec<String> = issues
        .iter()
        .filter(|issue| issue.is_error())
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect();
    match errors.as_slice() {
        [] => "no errors".to_string(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

impl Error {
    pub fn not_found(repo: impl Into<String>) -> Self {
        Self::NotFound { repo: repo.into() }
    }

    pub fn watcher(message: impl Into<String>) -> Self {
        Self::Watcher {
            message: message.into(),
        }
    }
}
