use core::result::Result as CoreResult;
use std::io::Error as IoError;

use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur while coordinating the document catalog.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// An HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// The collection or index context is missing.
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// The remote store did not return the identifiers a write requires.
    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    /// The embedding service returned a failure or a malformed payload.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A title or document id lookup failed or returned nothing.
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Caller-supplied input was rejected before any remote call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Determines whether this error may succeed if retried.
    ///
    /// Only transport failures qualify; protocol errors are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value as JsonValue, from_str};
    use std::io;

    #[test]
    fn test_error_display() {
        let error1 = Error::RemoteWrite("missing document id".to_owned());
        assert_eq!(
            error1.to_string(),
            "Remote write failed: missing document id"
        );

        let error2 = Error::Embedding("non-success variant".to_owned());
        assert_eq!(error2.to_string(), "Embedding error: non-success variant");

        let error3 = Error::NotInitialized("no collection".to_owned());
        assert_eq!(error3.to_string(), "Not initialized: no collection");

        let error4 = Error::Resolution("unknown title".to_owned());
        assert_eq!(error4.to_string(), "Resolution error: unknown title");
    }

    #[test]
    fn test_error_is_retryable() {
        let error1 = Error::RemoteWrite("missing ids".to_owned());
        assert!(!error1.is_retryable());

        let error2 = Error::Embedding("bad payload".to_owned());
        assert!(!error2.is_retryable());

        let error3 = Error::InvalidInput("empty title".to_owned());
        assert!(!error3.is_retryable());
    }

    #[test]
    fn test_error_from_io() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = from_str::<JsonValue>("invalid json").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
