//! Local vector index over chunked, embedded document text.
//!
//! Documents are chunked on sentence boundaries, embedded through the
//! remote store's embedding contract, and held in an in-memory vector
//! store supporting cosine-similarity queries and bounded excerpt
//! rendering.

/// Sentence-boundary chunking and token estimation.
pub mod chunking;
/// The collection-scoped document index.
pub mod index;
/// Lazy rendering of matched chunks into excerpts.
pub mod render;
/// In-memory vector store and similarity scoring.
pub mod store;

pub use chunking::{TextChunk, chunk_text, estimate_tokens};
pub use index::{IndexConfig, LocalDocumentIndex, QueryOptions, VectorRecord};
pub use render::{Section, SectionIter};
pub use store::{ScoredDocument, StoredChunk, VectorStore, cosine_similarity};
