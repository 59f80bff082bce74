//! Clients for the remote authoritative document store.
//!
//! [`HttpRemoteStore`] speaks JSON-over-HTTP to the store's RPC facade;
//! [`MockRemoteStore`] is an in-memory double for protocol tests.

/// HTTP client for the store's RPC facade.
pub mod http;
/// In-memory mock store with call recording.
pub mod mock;

pub use http::HttpRemoteStore;
pub use mock::MockRemoteStore;
