use async_trait::async_trait;

use crate::{AddDocumentResponse, DocumentMetadata, EmbeddingsReply, Result};

/// Request/response facade over the remote authoritative document store.
///
/// Optional return values mirror the wire contract: the remote may hold no
/// record for a lookup, and callers decide what absence means.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lists document metadata for a collection, if the collection exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    async fn get_metadata_list(
        &self,
        collection_id: &str,
    ) -> Result<Option<Vec<DocumentMetadata>>>;

    /// Looks up the document id recorded for a title.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    async fn title_to_document_id(
        &self,
        collection_id: &str,
        title: &str,
    ) -> Result<Option<String>>;

    /// Looks up the title recorded for a document id.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    async fn document_id_to_title(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Option<String>>;

    /// Creates a document record and returns its assigned identifiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    async fn add_document(
        &self,
        collection_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Option<AddDocumentResponse>>;

    /// Marks a vector update as committed for the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    async fn end_update(&self, collection_id: &str, vector_id: &str) -> Result<()>;

    /// Fetches the opaque serialized vector-index snapshot, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    async fn get_index(&self, collection_id: &str) -> Result<Option<String>>;

    /// Generates embeddings for a batch of prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails. A service-level failure is
    /// reported in-band as [`EmbeddingsReply::Failure`].
    async fn generate_embeddings(
        &self,
        prompts: &[String],
        credential: &str,
    ) -> Result<EmbeddingsReply>;
}

/// Supplies the credential required to call the embedding service.
///
/// Fetched lazily per operation; this layer never caches it.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Returns the embedding service credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be fetched.
    async fn openai_secret(&self) -> Result<String>;
}

/// Maps document titles to remote identifiers and back.
///
/// Required by the vector index configuration and reused when query results
/// are mapped back to stable document identities.
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    /// Resolves a title to its remote document id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotInitialized`] without collection context,
    /// or [`crate::Error::Resolution`] when the lookup returns nothing.
    async fn resolve_document_id(&self, title: &str) -> Result<String>;

    /// Resolves a remote document id to its title.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotInitialized`] without collection context,
    /// or [`crate::Error::Resolution`] when the lookup returns nothing.
    async fn resolve_document_title(&self, document_id: &str) -> Result<String>;
}
