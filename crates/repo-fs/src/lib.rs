//! Document sources for the repository layout engine
//!
//! Provides the storage-agnostic [`DocumentSource`] abstraction the loader
//! reads configuration documents through, bounded and scoped document reads,
//! and the [`ChangeNotifier`] abstraction the change watcher consumes.

pub mod document_id;
pub mod error;
pub mod io;
pub mod source;
pub mod watch;

pub use document_id::DocumentId;
pub use error::{Error, Result};
pub use io::DEFAULT_MAX_DOCUMENT_BYTES;
pub use source::{DirectorySource, DocumentSource, MemorySource};
pub use watch::{ChangeKind, ChangeNotifier, ChangeSender, ChannelNotifier, DocumentChange, FsNotifier};
