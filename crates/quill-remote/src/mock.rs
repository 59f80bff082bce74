//! Mock remote store for testing the catalog protocols.
//!
//! Holds collection state in memory and records every call, enabling
//! end-to-end protocol tests without a live store or embedding service.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use quill_core::{
    AddDocumentResponse, DocumentMetadata, EmbeddingData, EmbeddingPayload, EmbeddingsReply,
    Error, RemoteStore, Result, SecretProvider,
};

/// How the mock answers `add_document`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum AddDocumentMode {
    /// Assign sequential ids (`d1`, `d2`, ...).
    #[default]
    Assign,
    /// Reply with a record whose identifiers are absent.
    MissingIdentifiers,
    /// Reply with no record at all.
    Absent,
}

/// Mutable mock state behind the lock.
#[derive(Default)]
struct MockState {
    /// Metadata per collection.
    metadata: HashMap<String, Vec<DocumentMetadata>>,
    /// (collection, title) -> document id.
    title_to_id: HashMap<(String, String), String>,
    /// (collection, document id) -> title.
    id_to_title: HashMap<(String, String), String>,
    /// Serialized index snapshots per collection.
    snapshots: HashMap<String, String>,
    /// Queued embedding replies, consumed in order.
    embedding_replies: VecDeque<EmbeddingsReply>,
    /// Current `add_document` behavior.
    add_document_mode: AddDocumentMode,
    /// Recorded `end_update` calls as (collection, vector id).
    committed: Vec<(String, String)>,
    /// Every call made, as `method:arg` strings.
    call_history: Vec<String>,
    /// Next sequential document number.
    next_document: usize,
    /// Whether lookup calls fail with a transport-style error.
    fail_lookups: bool,
}

/// In-memory [`RemoteStore`] double with call recording.
#[derive(Clone)]
pub struct MockRemoteStore {
    /// Shared mock state.
    state: Arc<Mutex<MockState>>,
    /// Bucket principal reported by `add_document`.
    bucket_principal: String,
    /// Credential returned by the secret endpoint.
    secret: String,
}

impl Default for MockRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteStore {
    /// Creates an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            bucket_principal: "bucket-main".to_owned(),
            secret: "sk-mock".to_owned(),
        }
    }

    /// Sets the bucket principal reported for new documents.
    #[must_use]
    pub fn with_bucket_principal(mut self, principal: impl Into<String>) -> Self {
        self.bucket_principal = principal.into();
        self
    }

    /// Sets the credential returned by the secret endpoint.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    /// Seeds a document record with its title/id mappings.
    #[must_use]
    pub fn with_document(
        self,
        collection_id: &str,
        document_id: &str,
        title: &str,
        chunk_count: usize,
    ) -> Self {
        {
            let mut state = self.state_guard();
            state
                .metadata
                .entry(collection_id.to_owned())
                .or_default()
                .push(DocumentMetadata {
                    id: document_id.to_owned(),
                    title: title.to_owned(),
                    chunk_count,
                });
            state.title_to_id.insert(
                (collection_id.to_owned(), title.to_owned()),
                document_id.to_owned(),
            );
            state.id_to_title.insert(
                (collection_id.to_owned(), document_id.to_owned()),
                title.to_owned(),
            );
        }
        self
    }

    /// Stores a serialized index snapshot for a collection.
    #[must_use]
    pub fn with_index_snapshot(self, collection_id: &str, snapshot: &str) -> Self {
        self.state_guard()
            .snapshots
            .insert(collection_id.to_owned(), snapshot.to_owned());
        self
    }

    /// Queues one embedding reply; once the queue drains, deterministic
    /// fake embeddings are synthesized instead.
    #[must_use]
    pub fn with_embedding_reply(self, reply: EmbeddingsReply) -> Self {
        self.state_guard().embedding_replies.push_back(reply);
        self
    }

    /// Makes `add_document` reply with absent identifiers.
    #[must_use]
    pub fn with_missing_add_document_identifiers(self) -> Self {
        self.state_guard().add_document_mode = AddDocumentMode::MissingIdentifiers;
        self
    }

    /// Makes `add_document` reply with no record at all.
    #[must_use]
    pub fn with_absent_add_document(self) -> Self {
        self.state_guard().add_document_mode = AddDocumentMode::Absent;
        self
    }

    /// Makes title/id lookups fail with a transport-style error.
    #[must_use]
    pub fn with_failing_lookups(self) -> Self {
        self.state_guard().fail_lookups = true;
        self
    }

    /// Every call made so far, as `method:arg` strings.
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.state_guard().call_history.clone()
    }

    /// Number of calls made to the named method.
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        let prefix = format!("{method}:");
        self.state_guard()
            .call_history
            .iter()
            .filter(|entry| entry.starts_with(&prefix))
            .count()
    }

    /// Recorded `end_update` calls as (collection, vector id) pairs.
    #[must_use]
    pub fn end_update_calls(&self) -> Vec<(String, String)> {
        self.state_guard().committed.clone()
    }

    /// Generates the deterministic fake embedding for a prompt.
    ///
    /// Eight dimensions seeded from a simple hash of the text, so equal
    /// prompts always embed identically.
    #[must_use]
    pub fn fake_embedding(text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash as _, Hasher as _};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        (0..8)
            .map(|dimension| ((hash.wrapping_add(dimension)) % 1000) as f32 / 1000.0)
            .collect()
    }

    /// Locks the state, recovering from poisoning.
    fn state_guard(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Records a call in the history.
    fn record(&self, method: &str, argument: &str) {
        self.state_guard()
            .call_history
            .push(format!("{method}:{argument}"));
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn get_metadata_list(
        &self,
        collection_id: &str,
    ) -> Result<Option<Vec<DocumentMetadata>>> {
        self.record("get_metadata_list", collection_id);
        Ok(self.state_guard().metadata.get(collection_id).cloned())
    }

    async fn title_to_document_id(
        &self,
        collection_id: &str,
        title: &str,
    ) -> Result<Option<String>> {
        self.record("title_to_document_id", title);
        let state = self.state_guard();
        if state.fail_lookups {
            return Err(Error::Other("lookup transport failure".to_owned()));
        }
        Ok(state
            .title_to_id
            .get(&(collection_id.to_owned(), title.to_owned()))
            .cloned())
    }

    async fn document_id_to_title(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Option<String>> {
        self.record("document_id_to_title", document_id);
        let state = self.state_guard();
        if state.fail_lookups {
            return Err(Error::Other("lookup transport failure".to_owned()));
        }
        Ok(state
            .id_to_title
            .get(&(collection_id.to_owned(), document_id.to_owned()))
            .cloned())
    }

    async fn add_document(
        &self,
        collection_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Option<AddDocumentResponse>> {
        self.record("add_document", title);
        let mut state = self.state_guard();
        match state.add_document_mode {
            AddDocumentMode::Absent => Ok(None),
            AddDocumentMode::MissingIdentifiers => Ok(Some(AddDocumentResponse::default())),
            AddDocumentMode::Assign => {
                state.next_document += 1;
                let document_id = format!("d{}", state.next_document);
                state
                    .metadata
                    .entry(collection_id.to_owned())
                    .or_default()
                    .push(DocumentMetadata {
                        id: document_id.clone(),
                        title: title.to_owned(),
                        chunk_count: content.len().div_ceil(2008).max(1),
                    });
                state.title_to_id.insert(
                    (collection_id.to_owned(), title.to_owned()),
                    document_id.clone(),
                );
                state.id_to_title.insert(
                    (collection_id.to_owned(), document_id.clone()),
                    title.to_owned(),
                );
                Ok(Some(AddDocumentResponse {
                    collection: Some(self.bucket_principal.clone()),
                    document_id: Some(document_id),
                }))
            }
        }
    }

    async fn end_update(&self, collection_id: &str, vector_id: &str) -> Result<()> {
        self.record("end_update", vector_id);
        self.state_guard()
            .committed
            .push((collection_id.to_owned(), vector_id.to_owned()));
        Ok(())
    }

    async fn get_index(&self, collection_id: &str) -> Result<Option<String>> {
        self.record("get_index", collection_id);
        Ok(self.state_guard().snapshots.get(collection_id).cloned())
    }

    async fn generate_embeddings(
        &self,
        prompts: &[String],
        _credential: &str,
    ) -> Result<EmbeddingsReply> {
        self.record("generate_embeddings", &prompts.len().to_string());
        if let Some(reply) = self.state_guard().embedding_replies.pop_front() {
            return Ok(reply);
        }

        let payload = EmbeddingPayload {
            data: prompts
                .iter()
                .map(|prompt| EmbeddingData {
                    embedding: Self::fake_embedding(prompt),
                })
                .collect(),
        };
        Ok(EmbeddingsReply::Success(serde_json::to_string(&payload)?))
    }
}

#[async_trait]
impl SecretProvider for MockRemoteStore {
    async fn openai_secret(&self) -> Result<String> {
        self.record("openai_secret", "");
        Ok(self.secret.clone())
    }
}
