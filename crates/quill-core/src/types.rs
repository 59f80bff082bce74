//! Data types shared across the catalog crates.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Per-document record held by the remote authoritative store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Opaque document identifier assigned by the remote store.
    pub id: String,
    /// Caller-supplied document title, unique within a collection.
    pub title: String,
    /// Number of chunks recorded for the document.
    pub chunk_count: usize,
}

/// Reply to a remote `add_document` call.
///
/// The remote may omit either field; callers must treat absence as a failed
/// write rather than propagating the gap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDocumentResponse {
    /// Principal of the bucket the document was stored in.
    pub collection: Option<String>,
    /// Identifier assigned to the new document.
    pub document_id: Option<String>,
}

/// Reply variants from the embedding RPC.
///
/// The success payload is a serialized JSON string that parses to
/// [`EmbeddingPayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingsReply {
    /// Embeddings were generated; payload is the serialized batch.
    Success(String),
    /// The embedding service reported a failure.
    Failure(String),
}

impl EmbeddingsReply {
    /// Parses the reply into one embedding vector per prompt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Embedding`] for the failure variant or when the
    /// success payload does not parse.
    pub fn into_vectors(self) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::Success(payload) => {
                let parsed: EmbeddingPayload = serde_json::from_str(&payload)
                    .map_err(|err| Error::Embedding(format!("malformed payload: {err}")))?;
                Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
            }
            Self::Failure(message) => Err(Error::Embedding(message)),
        }
    }
}

/// Parsed body of a successful embedding reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingPayload {
    /// One entry per prompt, in prompt order.
    pub data: Vec<EmbeddingData>,
}

/// A single embedding in a batch reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingData {
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

/// Result of a completed ingestion protocol run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Remote document identifier.
    pub document_id: String,
    /// Principal of the bucket holding the document.
    pub bucket_principal: String,
    /// Identifier of the committed vector record.
    pub vector_id: String,
}

/// A rendered excerpt of a matched document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionView {
    /// Sanitized excerpt text.
    pub text: String,
    /// Token count of the excerpt.
    pub tokens: usize,
}

/// One ranked result of a similarity query. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    /// Title of the matched document.
    pub title: String,
    /// Remote document identifier resolved from the title.
    pub id: String,
    /// Similarity score; higher is more similar.
    pub score: f32,
    /// Number of chunks the match drew from.
    pub chunks: usize,
    /// Rendered sections, at most one per result.
    pub sections: Vec<SectionView>,
}

/// Snapshot of a collection's remote state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSnapshot {
    /// Document metadata, empty for a fresh collection.
    pub documents: Vec<DocumentMetadata>,
    /// Opaque serialized vector-index snapshot, if one exists.
    pub index: Option<String>,
}
