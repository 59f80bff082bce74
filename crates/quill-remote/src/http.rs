//! HTTP client for the remote document store RPC facade.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use quill_core::{
    AddDocumentResponse, DocumentMetadata, EmbeddingsReply, Error, RemoteStore, Result,
    SecretProvider,
};

/// Identifies a collection in a request body.
#[derive(Debug, Serialize)]
struct CollectionRequest<'req> {
    /// Target collection.
    collection_id: &'req str,
}

/// Body of a title lookup.
#[derive(Debug, Serialize)]
struct TitleRequest<'req> {
    /// Target collection.
    collection_id: &'req str,
    /// Title to resolve.
    title: &'req str,
}

/// Body of a document id lookup.
#[derive(Debug, Serialize)]
struct DocumentIdRequest<'req> {
    /// Target collection.
    collection_id: &'req str,
    /// Document id to resolve.
    document_id: &'req str,
}

/// Body of a document creation request.
#[derive(Debug, Serialize)]
struct AddDocumentRequest<'req> {
    /// Target collection.
    collection_id: &'req str,
    /// Caller-supplied title.
    title: &'req str,
    /// Parsed document text.
    content: &'req str,
}

/// Body of an update-commit request.
#[derive(Debug, Serialize)]
struct EndUpdateRequest<'req> {
    /// Target collection.
    collection_id: &'req str,
    /// Vector record being committed.
    vector_id: &'req str,
}

/// Body of an embedding request.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'req> {
    /// Prompts to embed, in order.
    prompts: &'req [String],
    /// Embedding service credential.
    credential: &'req str,
}

/// Reply carrying a collection's metadata list.
#[derive(Debug, Deserialize)]
struct MetadataReply {
    /// Metadata entries; absent when the collection does not exist.
    documents: Option<Vec<DocumentMetadata>>,
}

/// Reply to a title lookup.
#[derive(Debug, Deserialize)]
struct TitleLookupReply {
    /// Resolved document id, if any.
    document_id: Option<String>,
}

/// Reply to a document id lookup.
#[derive(Debug, Deserialize)]
struct IdLookupReply {
    /// Resolved title, if any.
    title: Option<String>,
}

/// Reply carrying the serialized index snapshot.
#[derive(Debug, Deserialize)]
struct IndexReply {
    /// Opaque snapshot, if one was stored.
    index: Option<String>,
}

/// Reply carrying the embedding credential.
#[derive(Debug, Deserialize)]
struct SecretReply {
    /// The credential.
    secret: String,
}

/// Remote store client speaking JSON-over-HTTP to the RPC facade.
pub struct HttpRemoteStore {
    /// HTTP client for store requests.
    client: Client,
    /// Base URL of the store, without a trailing slash.
    base_url: String,
}

impl HttpRemoteStore {
    /// Creates a client for the store at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::default(), base_url)
    }

    /// Creates a client reusing an existing `reqwest` client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Posts `body` to the named RPC method and parses the JSON reply.
    async fn call<Req, Reply>(&self, method: &str, body: &Req) -> Result<Reply>
    where
        Req: Serialize + Sync,
        Reply: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::Other(format!(
                "remote store error {status} on {method}: {error_text}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get_metadata_list(
        &self,
        collection_id: &str,
    ) -> Result<Option<Vec<DocumentMetadata>>> {
        let reply: MetadataReply = self
            .call("get_metadata_list", &CollectionRequest { collection_id })
            .await?;
        Ok(reply.documents)
    }

    async fn title_to_document_id(
        &self,
        collection_id: &str,
        title: &str,
    ) -> Result<Option<String>> {
        let reply: TitleLookupReply = self
            .call(
                "title_to_document_id",
                &TitleRequest {
                    collection_id,
                    title,
                },
            )
            .await?;
        Ok(reply.document_id)
    }

    async fn document_id_to_title(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<Option<String>> {
        let reply: IdLookupReply = self
            .call(
                "document_id_to_title",
                &DocumentIdRequest {
                    collection_id,
                    document_id,
                },
            )
            .await?;
        Ok(reply.title)
    }

    async fn add_document(
        &self,
        collection_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Option<AddDocumentResponse>> {
        let reply: Option<AddDocumentResponse> = self
            .call(
                "add_document",
                &AddDocumentRequest {
                    collection_id,
                    title,
                    content,
                },
            )
            .await?;
        Ok(reply)
    }

    async fn end_update(&self, collection_id: &str, vector_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/end_update", self.base_url))
            .json(&EndUpdateRequest {
                collection_id,
                vector_id,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::Other(format!(
                "remote store error {status} on end_update: {error_text}"
            )));
        }

        Ok(())
    }

    async fn get_index(&self, collection_id: &str) -> Result<Option<String>> {
        let reply: IndexReply = self
            .call("get_index", &CollectionRequest { collection_id })
            .await?;
        Ok(reply.index)
    }

    async fn generate_embeddings(
        &self,
        prompts: &[String],
        credential: &str,
    ) -> Result<EmbeddingsReply> {
        self.call(
            "generate_embeddings",
            &EmbeddingsRequest {
                prompts,
                credential,
            },
        )
        .await
    }
}

#[async_trait]
impl SecretProvider for HttpRemoteStore {
    async fn openai_secret(&self) -> Result<String> {
        let reply: SecretReply = self
            .call("openai_secret", &serde_json::json!({}))
            .await?;
        Ok(reply.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let store = HttpRemoteStore::new("http://localhost:8000///");
        assert_eq!(store.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_request_wire_shapes() {
        let body = serde_json::to_string(&TitleRequest {
            collection_id: "abc",
            title: "Report",
        })
        .unwrap();
        assert_eq!(body, r#"{"collection_id":"abc","title":"Report"}"#);

        let body = serde_json::to_string(&EmbeddingsRequest {
            prompts: &["results".to_owned()],
            credential: "sk-test",
        })
        .unwrap();
        assert_eq!(body, r#"{"prompts":["results"],"credential":"sk-test"}"#);
    }

    #[test]
    fn test_optional_reply_fields_deserialize() {
        let reply: MetadataReply = serde_json::from_str("{}").unwrap();
        assert!(reply.documents.is_none());

        let reply: TitleLookupReply = serde_json::from_str(r#"{"document_id":"d1"}"#).unwrap();
        assert_eq!(reply.document_id.as_deref(), Some("d1"));

        let reply: Option<AddDocumentResponse> = serde_json::from_str("null").unwrap();
        assert!(reply.is_none());
    }
}
