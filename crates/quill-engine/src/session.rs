//! Session driving the ingestion and similarity-query protocols.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use quill_core::{
    CollectionSnapshot, DocumentResolver, Error, IngestOutcome, LogSink, QueryHit, RemoteStore,
    Result, SecretProvider, SectionView, default_log_sink,
};
use quill_index::{IndexConfig, LocalDocumentIndex, QueryOptions};

use crate::sanitize::sanitize_section_text;

/// Maximum documents returned by a similarity query.
pub const MAX_QUERY_DOCUMENTS: usize = 4;
/// Maximum chunks carried per queried document.
pub const MAX_QUERY_CHUNKS: usize = 512;
/// Character budget for each rendered section.
pub const SECTION_CHAR_LIMIT: usize = 500;
/// Sections rendered per query result.
pub const SECTIONS_PER_RESULT: usize = 1;
/// Default token budget per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 502;

/// Orchestrates the catalog protocols for one collection.
///
/// A session holds the remote store and secret provider handles plus the
/// collection identity; the vector index itself is owned by the caller and
/// passed into each protocol run.
#[derive(Clone)]
pub struct DocumentSession {
    /// Remote authoritative document store.
    store: Arc<dyn RemoteStore>,
    /// Source of the embedding service credential.
    secrets: Arc<dyn SecretProvider>,
    /// Collection the session operates on.
    collection_id: String,
    /// Token budget per chunk for new indexes.
    chunk_size: usize,
    /// Milestone log sink.
    log: LogSink,
}

impl DocumentSession {
    /// Creates a session for a collection.
    #[must_use]
    pub fn new(
        store: Arc<dyn RemoteStore>,
        secrets: Arc<dyn SecretProvider>,
        collection_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            secrets,
            collection_id: collection_id.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            log: default_log_sink(),
        }
    }

    /// Replaces the milestone log sink.
    #[must_use]
    pub fn with_log_sink(mut self, log: LogSink) -> Self {
        self.log = log;
        self
    }

    /// Overrides the per-chunk token budget for new indexes.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Emits a protocol milestone to the configured sink.
    fn log(&self, message: &str) {
        (self.log)(message);
    }

    /// Whether the remote already holds documents for this collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata listing fails.
    pub async fn is_catalog(&self) -> Result<bool> {
        if self.collection_id.is_empty() {
            return Ok(false);
        }
        let metadata = self.store.get_metadata_list(&self.collection_id).await?;
        Ok(metadata.is_some_and(|documents| !documents.is_empty()))
    }

    /// Builds a fresh local index for the collection, loading the remote
    /// snapshot when a catalog already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] without a collection id, or an
    /// error if the credential fetch fails. Snapshot-loading failures
    /// degrade silently to an empty index.
    pub async fn initialize(&self) -> Result<LocalDocumentIndex> {
        if self.collection_id.is_empty() {
            return Err(Error::NotInitialized("no collection selected".to_owned()));
        }

        let is_existing_catalog = match self.is_catalog().await {
            Ok(exists) => exists,
            Err(catalog_error) => {
                warn!("catalog check failed, assuming empty: {catalog_error}");
                false
            }
        };

        let secret = self.secrets.openai_secret().await?;
        let config = IndexConfig {
            collection_key: self.collection_id.clone(),
            embedding_credential: secret,
            is_existing_catalog,
            chunk_size: self.chunk_size,
            resolver: Arc::new(self.clone()),
        };

        let index = LocalDocumentIndex::initialize(config, Arc::clone(&self.store)).await?;
        self.log(&format!(
            "Initialized local index for collection: {}",
            self.collection_id
        ));
        Ok(index)
    }

    /// Runs the full ingestion protocol for one document.
    ///
    /// Writes the document to the remote store, vectorizes the text into
    /// the local index, and commits the vector update. The protocol aborts
    /// at the first failed step; no local vectors are stored unless the
    /// remote write assigned both identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty or duplicate title,
    /// [`Error::RemoteWrite`] when the remote write returns no usable
    /// record, and whatever the vectorization or commit step raises.
    pub async fn add_document(
        &self,
        index: &mut LocalDocumentIndex,
        title: &str,
        content: &str,
    ) -> Result<IngestOutcome> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("document title is empty".to_owned()));
        }
        if self
            .store
            .title_to_document_id(&self.collection_id, title)
            .await?
            .is_some()
        {
            return Err(Error::InvalidInput(format!(
                "a document titled '{title}' already exists"
            )));
        }

        self.log(&format!("Adding document: {title}"));
        let reply = self
            .store
            .add_document(&self.collection_id, title, content)
            .await?;
        let Some(record) = reply else {
            self.log("Ingestion aborted: remote store returned no document record");
            return Err(Error::RemoteWrite(
                "add_document returned no record".to_owned(),
            ));
        };
        let (Some(bucket_principal), Some(document_id)) = (record.collection, record.document_id)
        else {
            self.log("Ingestion aborted: remote store omitted document identifiers");
            return Err(Error::RemoteWrite(
                "add_document omitted the bucket principal or document id".to_owned(),
            ));
        };
        self.log(&format!(
            "Document added. ID: {document_id}, Bucket: {bucket_principal}"
        ));

        index.stage_text(title, content);
        let vector = index
            .add_vectors(&self.collection_id, title, &document_id)
            .await
            .inspect_err(|vector_error| {
                self.log(&format!("Vectorization failed for '{title}': {vector_error}"));
            })?;
        self.log(&format!("Vector added for document. ID: {}", vector.id));

        self.store
            .end_update(&self.collection_id, &vector.id)
            .await
            .inspect_err(|commit_error| {
                self.log(&format!(
                    "Commit failed for vector {}: {commit_error}",
                    vector.id
                ));
            })?;
        self.log(&format!("Vector update committed for document: {document_id}"));

        Ok(IngestOutcome {
            document_id,
            bucket_principal,
            vector_id: vector.id,
        })
    }

    /// Runs the similarity-query protocol for one prompt.
    ///
    /// Refreshes the index from the remote snapshot when one exists, embeds
    /// the prompt as a single-item batch, ranks stored documents, and maps
    /// each result back to its remote document id with one sanitized
    /// rendered section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty prompt,
    /// [`Error::Embedding`] when the embedding call fails, and
    /// [`Error::Resolution`] when a result title cannot be mapped back to
    /// a document id.
    pub async fn similarity_query(
        &self,
        index: &mut LocalDocumentIndex,
        prompt: &str,
    ) -> Result<Vec<QueryHit>> {
        if prompt.trim().is_empty() {
            return Err(Error::InvalidInput("query prompt is empty".to_owned()));
        }

        // Re-derive the index from remote state so queries observe writes
        // committed elsewhere. Locally built vectors are kept when the
        // remote holds nothing.
        let refreshed = self.initialize().await?;
        if !refreshed.is_empty() {
            *index = refreshed;
        }

        self.log(&format!("Generating embedding for prompt: {prompt}"));
        let secret = self.secrets.openai_secret().await?;
        let reply = self
            .store
            .generate_embeddings(&[prompt.to_owned()], &secret)
            .await?;
        let mut vectors = reply.into_vectors().inspect_err(|embed_error| {
            self.log(&format!("Query aborted: {embed_error}"));
        })?;
        if vectors.is_empty() {
            return Err(Error::Embedding(
                "embedding reply carried no vectors".to_owned(),
            ));
        }
        let embedding = vectors.swap_remove(0);
        self.log("Embedding generated successfully");

        let ranked = index.query_documents(
            &embedding,
            QueryOptions {
                max_documents: MAX_QUERY_DOCUMENTS,
                max_chunks: MAX_QUERY_CHUNKS,
            },
        );
        self.log(&format!("Query matched {} documents", ranked.len()));

        let mut hits = Vec::with_capacity(ranked.len());
        for document in ranked {
            let sections: Vec<SectionView> = document
                .render_sections(SECTION_CHAR_LIMIT, SECTIONS_PER_RESULT, true)
                .map(|section| SectionView {
                    text: sanitize_section_text(&section.text),
                    tokens: section.token_count,
                })
                .collect();
            let id = self.resolve_document_id(&document.title).await?;
            hits.push(QueryHit {
                title: document.title,
                id,
                score: document.score,
                chunks: document.chunks.len(),
                sections,
            });
        }

        Ok(hits)
    }

    /// Reads the collection's remote state: metadata plus the stored index
    /// snapshot. An empty collection yields an empty snapshot without a
    /// second remote call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] without a collection id, or an
    /// error if a remote call fails.
    pub async fn get_documents(&self) -> Result<CollectionSnapshot> {
        if self.collection_id.is_empty() {
            return Err(Error::NotInitialized("no collection selected".to_owned()));
        }

        let documents = self
            .store
            .get_metadata_list(&self.collection_id)
            .await?
            .unwrap_or_default();
        if documents.is_empty() {
            return Ok(CollectionSnapshot::default());
        }

        let index = self.store.get_index(&self.collection_id).await?;
        Ok(CollectionSnapshot { documents, index })
    }
}

#[async_trait]
impl DocumentResolver for DocumentSession {
    async fn resolve_document_id(&self, title: &str) -> Result<String> {
        if self.collection_id.is_empty() {
            return Err(Error::NotInitialized("index is not initialized".to_owned()));
        }
        match self
            .store
            .title_to_document_id(&self.collection_id, title)
            .await
        {
            Ok(Some(document_id)) => Ok(document_id),
            Ok(None) => {
                let resolution_error =
                    Error::Resolution(format!("no document id recorded for title '{title}'"));
                error!("{resolution_error}");
                Err(resolution_error)
            }
            Err(lookup_error) => {
                error!("title lookup failed for '{title}': {lookup_error}");
                Err(lookup_error)
            }
        }
    }

    async fn resolve_document_title(&self, document_id: &str) -> Result<String> {
        if self.collection_id.is_empty() {
            return Err(Error::NotInitialized("sign in required".to_owned()));
        }
        match self
            .store
            .document_id_to_title(&self.collection_id, document_id)
            .await
        {
            Ok(Some(title)) => Ok(title),
            Ok(None) => {
                let resolution_error =
                    Error::Resolution(format!("no title recorded for document '{document_id}'"));
                error!("{resolution_error}");
                Err(resolution_error)
            }
            Err(lookup_error) => {
                error!("id lookup failed for '{document_id}': {lookup_error}");
                Err(lookup_error)
            }
        }
    }
}
