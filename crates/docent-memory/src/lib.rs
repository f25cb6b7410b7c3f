//! Document ingestion and in-memory semantic retrieval.
//!
//! Build order is fixed: [`document::DirectoryLoader`] → [`splitter::Chunker`] →
//! [`index::EmbeddingIndex`]. The finished index is read-only and shared through
//! [`handle::IndexHandle`]; [`retriever::Retriever`] queries whatever snapshot is current.

pub mod document;
pub mod handle;
pub mod index;
pub mod retriever;
pub mod splitter;

pub use document::{Chunk, DirectoryLoader, DocumentError, LoadOutcome, SourceDocument};
pub use handle::{IndexHandle, IndexSnapshot};
pub use index::{EmbeddingIndex, IndexBuild, IndexError, RetrievalResult, ScoredChunk};
pub use retriever::{QueryRewrite, Retriever};
pub use splitter::{Chunker, ChunkerConfig, SplitterError};

/// Normal, recoverable states in which the assistant runs without document context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// The documents directory is missing or held no loadable files.
    NoDocumentsFound,
    /// Loading produced documents but chunking yielded nothing to index.
    EmptyCorpus,
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDocumentsFound => f.write_str("no documents found"),
            Self::EmptyCorpus => f.write_str("empty corpus"),
        }
    }
}
