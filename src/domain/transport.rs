// src/domain/transport.rs

//! Pub/sub domain abstractions.
//!
//! This module defines the domain-level answer channel used by the client to
//! wait for asynchronously delivered answers and to publish answers of its
//! own. It intentionally avoids any reference to concrete brokers or client
//! libraries.
//!
//! The pub/sub layer is responsible only for delivering opaque payloads to
//! subscribers of a correlation key. Higher-level semantics such as the
//! subscribe-before-send ordering or timeouts are handled by the client.
//!
//! Concrete implementations of this interface live under `src/transport/`.
use crate::{CorrelationKey, Result};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

/// Handle returned from a successful subscription.
///
/// The subscription remains active until either:
/// - The handle is dropped
/// - The pub/sub transport is closed
///
/// Dropping the handle releases the listener. Implementations attach a
/// release hook so that the underlying registration (local fan-out entry,
/// broker `SUBSCRIBE`) is torn down synchronously on drop, on every exit
/// path of the waiting request.
pub struct SubscriptionHandle {
    // ---
    /// Receiver channel for payloads published on the subscribed key.
    pub inbox: mpsc::Receiver<Bytes>,

    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SubscriptionHandle {
    /// Handle with no release hook beyond closing the inbox.
    pub fn new(inbox: mpsc::Receiver<Bytes>) -> Self {
        Self {
            inbox,
            release: None,
        }
    }

    /// Handle that runs `release` exactly once when dropped.
    pub fn with_release<F>(inbox: mpsc::Receiver<Bytes>, release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            inbox,
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        // ---
        self.inbox.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Pub/sub abstraction keyed by correlation key.
///
/// Implementations must ensure that:
/// - Once `subscribe()` returns successfully, payloads published on that key
///   *after* that point are deliverable to the returned handle.
/// - `publish()` does not wait for subscribers to consume the payload.
/// - The implementation is safe for concurrent use by many in-flight
///   requests.
///
/// The in-memory hub serves as the reference implementation of these
/// semantics.
///
/// # Notes
///
/// This trait uses `async_trait`; consumers should treat methods as normal
/// `async fn`s.
#[async_trait::async_trait]
pub trait PubSub: Send + Sync {
    // ---
    /// Publish a payload on the given key.
    async fn publish(&self, key: &CorrelationKey, payload: Bytes) -> Result<()>;

    /// Register a listener on the given key.
    ///
    /// Returns only after the registration is effective.
    async fn subscribe(&self, key: &CorrelationKey) -> Result<SubscriptionHandle>;

    /// Close the transport and release any associated resources.
    async fn close(&self) -> Result<()>;
}

/// Shared pub/sub pointer.
///
/// `.clone()` is cheap and all clones share the same broker connection.
pub type PubSubPtr = Arc<dyn PubSub>;
