//! End-to-end similarity-query protocol tests against the mock remote store.

use std::sync::Arc;

use quill_core::{
    CollectionSnapshot, EmbeddingData, EmbeddingPayload, EmbeddingsReply, Error, SectionView,
};
use quill_engine::DocumentSession;
use quill_index::LocalDocumentIndex;
use quill_remote::MockRemoteStore;

fn session(store: &MockRemoteStore, collection: &str) -> DocumentSession {
    DocumentSession::new(Arc::new(store.clone()), Arc::new(store.clone()), collection)
}

async fn fresh_index(session: &DocumentSession) -> LocalDocumentIndex {
    session.initialize().await.unwrap()
}

/// Builds a successful embedding reply carrying the given vectors.
fn success(vectors: &[Vec<f32>]) -> EmbeddingsReply {
    let payload = EmbeddingPayload {
        data: vectors
            .iter()
            .map(|embedding| EmbeddingData {
                embedding: embedding.clone(),
            })
            .collect(),
    };
    EmbeddingsReply::Success(serde_json::to_string(&payload).unwrap())
}

#[tokio::test]
async fn test_query_returns_ranked_sanitized_hit() {
    // First reply embeds the ingested chunk, second embeds the prompt.
    // cos([0.92, 0.39191836], [1, 0]) = 0.92.
    let store = MockRemoteStore::new()
        .with_embedding_reply(success(&[vec![1.0, 0.0]]))
        .with_embedding_reply(success(&[vec![0.92, 0.391_918_36]]));
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap();

    let hits = session.similarity_query(&mut index, "results").await.unwrap();

    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.title, "Report");
    assert_eq!(hit.id, "d1");
    assert!((hit.score - 0.92).abs() < 1e-3);
    assert_eq!(hit.chunks, 1);
    assert_eq!(
        hit.sections,
        vec![SectionView {
            text: "Q1 results".to_owned(),
            tokens: 2,
        }]
    );
}

#[tokio::test]
async fn test_query_scores_are_non_increasing() {
    let store = MockRemoteStore::new()
        .with_embedding_reply(success(&[vec![1.0, 0.0]]))
        .with_embedding_reply(success(&[vec![0.6, 0.8]]))
        .with_embedding_reply(success(&[vec![0.0, 1.0]]))
        .with_embedding_reply(success(&[vec![1.0, 0.0]]));
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    session
        .add_document(&mut index, "Alpha", "Topic one.")
        .await
        .unwrap();
    session
        .add_document(&mut index, "Beta", "Topic two.")
        .await
        .unwrap();
    session
        .add_document(&mut index, "Gamma", "Topic three.")
        .await
        .unwrap();

    let hits = session.similarity_query(&mut index, "topic").await.unwrap();

    let titles: Vec<&str> = hits.iter().map(|hit| hit.title.as_str()).collect();
    assert_eq!(titles, ["Alpha", "Beta", "Gamma"]);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!((hits[0].score - 1.0).abs() < 1e-3);
    assert!((hits[1].score - 0.6).abs() < 1e-3);
    assert!(hits[2].score.abs() < 1e-3);
}

#[tokio::test]
async fn test_embedding_failure_aborts_before_resolution() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;
    session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap();

    let store = store.with_embedding_reply(EmbeddingsReply::Failure("no credit".to_owned()));
    let lookups_before = store.call_count("title_to_document_id");

    let error = session
        .similarity_query(&mut index, "results")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Embedding(_)));
    assert_eq!(store.call_count("title_to_document_id"), lookups_before);
    assert_eq!(index.len(), 1);
}

#[tokio::test]
async fn test_empty_prompt_is_rejected_without_remote_calls() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;
    let calls_before = store.call_history().len();

    let error = session.similarity_query(&mut index, "   ").await.unwrap_err();

    assert!(matches!(error, Error::InvalidInput(_)));
    assert_eq!(store.call_history().len(), calls_before);
}

#[tokio::test]
async fn test_query_sections_are_sanitized() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    session
        .add_document(&mut index, "Memo", "line1\n\n\"quoted\"")
        .await
        .unwrap();

    let hits = session.similarity_query(&mut index, "memo").await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].sections.len(), 1);
    assert_eq!(hits[0].sections[0].text, "line1\\n\\\"quoted\\\"");
}

#[tokio::test]
async fn test_query_refreshes_from_remote_snapshot() {
    // Build a snapshot in one session, then surface it to another whose
    // local index started empty.
    let origin_store = MockRemoteStore::new();
    let origin = session(&origin_store, "abc");
    let mut origin_index = fresh_index(&origin).await;
    origin
        .add_document(&mut origin_index, "Report", "Q1 results")
        .await
        .unwrap();
    let snapshot = origin_index.snapshot().unwrap();

    let store = MockRemoteStore::new().with_document("abc", "d1", "Report", 1);
    let reader = session(&store, "abc");
    let mut index = fresh_index(&reader).await;
    assert!(index.is_empty());

    let _store = store.with_index_snapshot("abc", &snapshot);
    let hits = reader.similarity_query(&mut index, "results").await.unwrap();

    assert!(!index.is_empty());
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Report");
    assert_eq!(hits[0].id, "d1");
}

#[tokio::test]
async fn test_empty_collection_reports_empty_snapshot() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");

    assert!(!session.is_catalog().await.unwrap());
    assert_eq!(
        session.get_documents().await.unwrap(),
        CollectionSnapshot::default()
    );
    // Metadata was empty, so the index snapshot is never fetched.
    assert_eq!(store.call_count("get_index"), 0);
}

#[tokio::test]
async fn test_get_documents_after_ingest_lists_metadata() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;
    session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap();

    let snapshot = session.get_documents().await.unwrap();
    assert_eq!(snapshot.documents.len(), 1);
    assert_eq!(snapshot.documents[0].id, "d1");
    assert_eq!(snapshot.documents[0].title, "Report");
}
