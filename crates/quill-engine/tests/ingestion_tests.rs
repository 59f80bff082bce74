//! End-to-end ingestion protocol tests against the mock remote store.

use std::sync::{Arc, Mutex};

use quill_core::{DocumentResolver as _, Error, LogSink};
use quill_engine::DocumentSession;
use quill_index::LocalDocumentIndex;
use quill_remote::MockRemoteStore;

fn session(store: &MockRemoteStore, collection: &str) -> DocumentSession {
    DocumentSession::new(Arc::new(store.clone()), Arc::new(store.clone()), collection)
}

async fn fresh_index(session: &DocumentSession) -> LocalDocumentIndex {
    session.initialize().await.unwrap()
}

#[tokio::test]
async fn test_ingest_assigns_identifiers_and_commits_once() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    let outcome = session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap();

    assert_eq!(outcome.document_id, "d1");
    assert_eq!(outcome.bucket_principal, "bucket-main");
    assert!(!outcome.vector_id.is_empty());
    assert_eq!(index.len(), 1);

    assert_eq!(store.call_count("end_update"), 1);
    assert_eq!(
        store.end_update_calls(),
        vec![("abc".to_owned(), outcome.vector_id)]
    );
}

#[tokio::test]
async fn test_ingested_title_resolves_round_trip() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    let outcome = session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap();

    let resolved = session.resolve_document_id("Report").await.unwrap();
    assert_eq!(resolved, outcome.document_id);

    let title = session.resolve_document_title(&resolved).await.unwrap();
    assert_eq!(title, "Report");
}

#[tokio::test]
async fn test_missing_identifiers_abort_without_side_effects() {
    let store = MockRemoteStore::new().with_missing_add_document_identifiers();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    let error = session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::RemoteWrite(_)));
    assert!(index.is_empty());
    assert_eq!(store.call_count("generate_embeddings"), 0);
    assert!(store.end_update_calls().is_empty());
}

#[tokio::test]
async fn test_absent_record_aborts_ingestion() {
    let store = MockRemoteStore::new().with_absent_add_document();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    let error = session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::RemoteWrite(_)));
    assert!(index.is_empty());
    assert!(store.end_update_calls().is_empty());
}

#[tokio::test]
async fn test_empty_title_is_rejected_before_any_write() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    let error = session
        .add_document(&mut index, "   ", "Q1 results")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::InvalidInput(_)));
    assert_eq!(store.call_count("add_document"), 0);
}

#[tokio::test]
async fn test_duplicate_title_is_rejected() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap();
    let error = session
        .add_document(&mut index, "Report", "Q2 results")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::InvalidInput(_)));
    assert_eq!(store.call_count("add_document"), 1);
    assert_eq!(store.call_count("end_update"), 1);
}

#[tokio::test]
async fn test_empty_content_ingests_with_zero_chunks() {
    let store = MockRemoteStore::new();
    let session = session(&store, "abc");
    let mut index = fresh_index(&session).await;

    let outcome = session.add_document(&mut index, "Empty", "").await.unwrap();

    assert_eq!(outcome.document_id, "d1");
    assert!(index.is_empty());
    assert_eq!(store.call_count("generate_embeddings"), 0);
    assert_eq!(store.call_count("end_update"), 1);
}

#[tokio::test]
async fn test_milestones_reach_the_log_sink() {
    let store = MockRemoteStore::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let sink: LogSink = Arc::new(move |message| {
        seen_clone.lock().unwrap().push(message.to_owned());
    });

    let session = session(&store, "abc").with_log_sink(sink);
    let mut index = fresh_index(&session).await;
    session
        .add_document(&mut index, "Report", "Q1 results")
        .await
        .unwrap();

    let messages = seen.lock().unwrap();
    assert!(messages.iter().any(|entry| entry == "Adding document: Report"));
    assert!(
        messages
            .iter()
            .any(|entry| entry.starts_with("Document added. ID: d1"))
    );
    assert!(
        messages
            .iter()
            .any(|entry| entry.starts_with("Vector added for document."))
    );
}
