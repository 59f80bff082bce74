//! Orchestration layer tying the remote document store to the local
//! vector index.
//!
//! [`DocumentSession`] drives the two catalog protocols: document
//! ingestion (remote write, vectorization, commit) and similarity queries
//! (embedding, ranking, section rendering).

/// Section text sanitization.
pub mod sanitize;
/// The protocol-driving session.
pub mod session;

pub use sanitize::sanitize_section_text;
pub use session::{
    DEFAULT_CHUNK_SIZE, DocumentSession, MAX_QUERY_CHUNKS, MAX_QUERY_DOCUMENTS,
    SECTION_CHAR_LIMIT, SECTIONS_PER_RESULT,
};
