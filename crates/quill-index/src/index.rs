//! Local document index over an in-memory vector store.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use quill_core::{DocumentResolver, Error, RemoteStore, Result};

use crate::chunking::{TextChunk, chunk_text};
use crate::store::{ScoredDocument, StoredChunk, VectorStore};

/// Configuration for initializing a [`LocalDocumentIndex`].
#[derive(Clone)]
pub struct IndexConfig {
    /// Collection the index belongs to.
    pub collection_key: String,
    /// Credential passed to the embedding service.
    pub embedding_credential: String,
    /// Whether a catalog already exists remotely and should be loaded.
    pub is_existing_catalog: bool,
    /// Token budget per chunk.
    pub chunk_size: usize,
    /// Resolver used to recover document titles while loading a catalog.
    pub resolver: Arc<dyn DocumentResolver>,
}

/// Options bounding a similarity query.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Maximum number of documents returned.
    pub max_documents: usize,
    /// Maximum number of chunks carried per document.
    pub max_chunks: usize,
}

/// A committed set of chunk vectors for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorRecord {
    /// Vector record identifier, distinct from the document id.
    pub id: String,
    /// Title of the source document.
    pub title: String,
    /// Remote identifier of the source document.
    pub document_id: String,
    /// Number of chunks embedded.
    pub chunk_count: usize,
}

/// Persisted form of one stored chunk.
///
/// Titles are not persisted; they are recovered through the configured
/// resolver when a catalog is loaded.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    /// Remote identifier of the owning document.
    document_id: String,
    /// Vector record the chunk belongs to.
    vector_id: String,
    /// Chunk position within the document.
    position: usize,
    /// The chunk itself.
    chunk: TextChunk,
    /// Embedding vector.
    embedding: Vec<f32>,
}

/// In-memory vector index for one collection's documents.
pub struct LocalDocumentIndex {
    /// Collection the index was initialized for.
    collection_key: String,
    /// Embedding service credential.
    credential: String,
    /// Token budget per chunk.
    chunk_size: usize,
    /// Remote store used for embedding calls and snapshot loading.
    store: Arc<dyn RemoteStore>,
    /// Embedded chunks.
    vectors: VectorStore,
    /// Parsed text staged per title, consumed by [`Self::add_vectors`].
    staged: HashMap<String, String>,
}

impl LocalDocumentIndex {
    /// Initializes an index for a collection.
    ///
    /// When `is_existing_catalog` is set, the remote snapshot is loaded and
    /// rebuilt; any failure along that path degrades silently to an empty
    /// index.
    ///
    /// # Errors
    ///
    /// Currently infallible beyond the signature; kept fallible because
    /// initialization sits on the protocol's async error path.
    pub async fn initialize(config: IndexConfig, store: Arc<dyn RemoteStore>) -> Result<Self> {
        let mut index = Self {
            collection_key: config.collection_key,
            credential: config.embedding_credential,
            chunk_size: config.chunk_size,
            store,
            vectors: VectorStore::default(),
            staged: HashMap::new(),
        };

        if config.is_existing_catalog {
            index.load_catalog(config.resolver.as_ref()).await;
        }

        Ok(index)
    }

    /// Supplies parsed text for a title ahead of vectorization.
    pub fn stage_text(&mut self, title: &str, content: &str) {
        self.staged.insert(title.to_owned(), content.to_owned());
    }

    /// Chunks and embeds the staged text for `title`, storing the vectors
    /// under a fresh vector record id.
    ///
    /// Empty staged text is a valid degenerate input and produces a record
    /// with zero chunks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] for a foreign collection key,
    /// [`Error::InvalidInput`] when no text was staged for the title, and
    /// [`Error::Embedding`] when the embedding call fails or returns the
    /// wrong batch size.
    pub async fn add_vectors(
        &mut self,
        collection_key: &str,
        title: &str,
        document_id: &str,
    ) -> Result<VectorRecord> {
        if collection_key != self.collection_key {
            return Err(Error::NotInitialized(format!(
                "index was initialized for '{}', not '{collection_key}'",
                self.collection_key
            )));
        }

        let content = self.staged.remove(title).ok_or_else(|| {
            Error::InvalidInput(format!("no text staged for document '{title}'"))
        })?;

        let chunks = chunk_text(&content, self.chunk_size);
        let vector_id = Uuid::new_v4().to_string();

        if chunks.is_empty() {
            return Ok(VectorRecord {
                id: vector_id,
                title: title.to_owned(),
                document_id: document_id.to_owned(),
                chunk_count: 0,
            });
        }

        let prompts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let reply = self
            .store
            .generate_embeddings(&prompts, &self.credential)
            .await?;
        let embeddings = reply.into_vectors()?;

        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, received {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let chunk_count = chunks.len();
        for (position, (chunk, embedding)) in chunks.into_iter().zip(embeddings).enumerate() {
            self.vectors.insert(StoredChunk {
                title: title.to_owned(),
                document_id: document_id.to_owned(),
                vector_id: vector_id.clone(),
                position,
                chunk,
                embedding,
            });
        }

        Ok(VectorRecord {
            id: vector_id,
            title: title.to_owned(),
            document_id: document_id.to_owned(),
            chunk_count,
        })
    }

    /// Ranks stored documents against a query embedding.
    ///
    /// Results are ordered by non-increasing score; that ordering is
    /// authoritative for callers.
    pub fn query_documents(
        &self,
        embedding: &[f32],
        options: QueryOptions,
    ) -> Vec<ScoredDocument> {
        self.vectors
            .query(embedding, options.max_documents, options.max_chunks)
    }

    /// Serializes the stored vectors into an opaque snapshot string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot(&self) -> Result<String> {
        let entries: Vec<SnapshotEntry> = self
            .vectors
            .entries()
            .iter()
            .map(|stored| SnapshotEntry {
                document_id: stored.document_id.clone(),
                vector_id: stored.vector_id.clone(),
                position: stored.position,
                chunk: stored.chunk.clone(),
                embedding: stored.embedding.clone(),
            })
            .collect();
        Ok(serde_json::to_string(&entries)?)
    }

    /// Number of embedded chunks held by the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Loads the remote catalog snapshot, recovering titles through the
    /// resolver. Every failure path leaves the index empty or partially
    /// loaded and logs the reason; nothing propagates.
    async fn load_catalog(&mut self, resolver: &dyn DocumentResolver) {
        let snapshot = match self.store.get_index(&self.collection_key).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return,
            Err(error) => {
                warn!("index snapshot unavailable, starting empty: {error}");
                return;
            }
        };

        let entries: Vec<SnapshotEntry> = match serde_json::from_str(&snapshot) {
            Ok(entries) => entries,
            Err(error) => {
                warn!("index snapshot did not parse, starting empty: {error}");
                return;
            }
        };

        let mut titles: HashMap<String, String> = HashMap::new();
        for entry in entries {
            let title = match titles.get(&entry.document_id) {
                Some(title) => title.clone(),
                None => match resolver.resolve_document_title(&entry.document_id).await {
                    Ok(title) => {
                        titles.insert(entry.document_id.clone(), title.clone());
                        title
                    }
                    Err(error) => {
                        warn!(
                            "skipping document {}: title lookup failed: {error}",
                            entry.document_id
                        );
                        continue;
                    }
                },
            };

            self.vectors.insert(StoredChunk {
                title,
                document_id: entry.document_id,
                vector_id: entry.vector_id,
                position: entry.position,
                chunk: entry.chunk,
                embedding: entry.embedding,
            });
        }
    }
}
