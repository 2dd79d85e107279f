// src/domain/http.rs

//! HTTP domain abstraction.
//!
//! The peer is reached by POSTing a JSON document to a single, statically
//! configured endpoint. The client needs nothing beyond the status code and
//! the response body, so that is all this interface exposes.

use crate::Result;
use bytes::Bytes;
use std::sync::Arc;

/// Status and body returned by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }
}

/// POST transport to the peer endpoint.
///
/// A returned `Ok` means the request was received and a response read,
/// whatever its status. Connection and I/O failures are
/// `RpcError::Transport`.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    // ---
    /// POST a JSON body to the configured endpoint.
    async fn post(&self, body: Bytes) -> Result<HttpResponse>;
}

/// Shared HTTP transport pointer.
pub type HttpTransportPtr = Arc<dyn HttpTransport>;
