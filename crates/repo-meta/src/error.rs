//! Error types for repo-meta

use repo_fs::DocumentId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse {document}: {source}")]
    Parse {
        document: DocumentId,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document} extends {parent}, which does not exist")]
    MissingParent {
        document: DocumentId,
        parent: DocumentId,
    },

    #[error("Cyclic inheritance at {document} (chain: {})", format_chain(.chain))]
    CyclicInheritance {
        document: DocumentId,
        chain: Vec<DocumentId>,
    },

    #[error("Document {document} does not declare repo_name")]
    MissingRepoName { document: DocumentId },

    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    #[error(transparent)]
    Fs(#[from] repo_fs::Error),
}

fn format_chain(chain: &[DocumentId]) -> String {
    chain
        .iter()
        .map(DocumentId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl Error {
    pub(crate) fn invalid_version(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
