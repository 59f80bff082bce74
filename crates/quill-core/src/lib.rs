//! Core types and traits for the quill document catalog.
//!
//! This crate provides the shared error type, data model, collaborator
//! traits, and log sink used across the catalog crates.

/// Error types and result definitions.
pub mod error;
/// Log sink type and default sink.
pub mod log;
/// Trait definitions for the remote store and its collaborators.
pub mod traits;
/// Core data types for documents, embeddings, and query results.
pub mod types;

pub use error::{Error, Result};
pub use log::{LogSink, default_log_sink};
pub use traits::{DocumentResolver, RemoteStore, SecretProvider};
pub use types::{
    AddDocumentResponse, CollectionSnapshot, DocumentMetadata, EmbeddingData, EmbeddingPayload,
    EmbeddingsReply, IngestOutcome, QueryHit, SectionView,
};
