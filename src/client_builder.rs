//! Backend client builder.
//!
//! Provides a fluent builder API that validates a [`ClientConfig`] together
//! with the transports it is used with, and fixes the correlation mode.

use std::time::Duration;

use crate::client::{AnswerPublisher, ResponseCorrelator};
use crate::{
    // ---
    create_http_transport,
    log_info,
    BackendClient,
    ClientConfig,
    HttpConfig,
    HttpTransportPtr,
    PubSubPtr,
    Result,
    RpcError,
};

/// Builder for creating backend clients.
///
/// The correlation mode follows from the transports supplied: with a pub/sub
/// transport the client runs in async mode, otherwise in sync mode.
///
/// # Examples
///
/// ## Sync client
/// ```no_run
/// use roam_rpc::{ClientBuilder, ClientConfig};
///
/// # fn example() -> roam_rpc::Result<()> {
/// let config = ClientConfig::new("000001", "000002", "https://peer.example:8443")
///     .with_ca_cert("ca.pem")
///     .with_client_cert("client.pem", "client-key.pem");
///
/// let client = ClientBuilder::new(config).build()?;
/// # Ok(())
/// # }
/// ```
///
/// ## Async client
/// ```no_run
/// use roam_rpc::{create_pubsub, ClientBuilder, ClientConfig};
/// use std::time::Duration;
///
/// # async fn example() -> roam_rpc::Result<()> {
/// let pubsub = create_pubsub("redis://127.0.0.1:6379").await?;
///
/// let config = ClientConfig::new("000001", "000002", "https://peer.example:8443")
///     .with_async_timeout(Duration::from_secs(2));
///
/// let client = ClientBuilder::new(config).pubsub(pubsub).build()?;
/// assert!(client.is_async());
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    // ---
    config: ClientConfig,

    // Transport overrides (optional)
    http: Option<HttpTransportPtr>,
    pubsub: Option<PubSubPtr>,
}

impl ClientBuilder {
    /// Create a new client builder from `config`.
    pub fn new(config: ClientConfig) -> Self {
        // ---
        Self {
            config,
            http: None,
            pubsub: None,
        }
    }

    /// Use `http` instead of building a `reqwest` transport from the config.
    ///
    /// The config's server URL and TLS paths must then be left empty.
    pub fn http_transport(mut self, http: HttpTransportPtr) -> Self {
        self.http = Some(http);
        self
    }

    /// Receive answers via `pubsub` (async mode).
    ///
    /// Requires an async timeout, set here or on the config.
    pub fn pubsub(mut self, pubsub: PubSubPtr) -> Self {
        self.pubsub = Some(pubsub);
        self
    }

    /// Set the async answer timeout.
    pub fn async_timeout(mut self, timeout: Duration) -> Self {
        self.config.async_timeout = Some(timeout);
        self
    }

    /// Build the client (consumes self).
    ///
    /// # Errors
    ///
    /// - `RpcError::MissingConfig` - no sender/receiver id, no server without
    ///   an injected HTTP transport, or async mode without a timeout
    /// - `RpcError::ConfigConflict` - contradicting transport settings
    /// - `RpcError::Tls` - certificate material could not be loaded
    pub fn build(self) -> Result<BackendClient> {
        // ---
        let config = self.config;

        if config.sender_id.is_empty() {
            return Err(RpcError::MissingConfig("sender_id".into()));
        }
        if config.receiver_id.is_empty() {
            return Err(RpcError::MissingConfig("receiver_id".into()));
        }

        let http = match self.http {
            Some(http) => {
                if !config.server.is_empty()
                    || config.ca_cert.is_some()
                    || config.tls_cert.is_some()
                    || config.tls_key.is_some()
                {
                    return Err(RpcError::ConfigConflict(
                        "server and TLS settings cannot be combined with an injected http transport"
                            .into(),
                    ));
                }
                http
            }
            None => create_http_transport(&HttpConfig {
                server: config.server.clone(),
                ca_cert: config.ca_cert.clone(),
                tls_cert: config.tls_cert.clone(),
                tls_key: config.tls_key.clone(),
            })?,
        };

        let (correlator, publisher) = match (self.pubsub, config.async_timeout) {
            (Some(pubsub), Some(timeout)) => {
                if timeout.is_zero() {
                    return Err(RpcError::ConfigConflict(
                        "async_timeout must be greater than zero".into(),
                    ));
                }
                let correlator = ResponseCorrelator::with_pubsub(
                    http.clone(),
                    pubsub.clone(),
                    timeout,
                    config.send_failure_policy,
                );
                let publisher = AnswerPublisher::new(pubsub, config.key_space.clone());
                (correlator, Some(publisher))
            }
            (Some(_), None) => {
                return Err(RpcError::MissingConfig("async_timeout".into()));
            }
            (None, Some(_)) => {
                return Err(RpcError::ConfigConflict(
                    "async_timeout set without a pub/sub transport".into(),
                ));
            }
            (None, None) => (ResponseCorrelator::sync(http.clone()), None),
        };

        log_info!(
            "backend client {} -> {} ({:?} mode, keys under {}:{})",
            config.sender_id,
            config.receiver_id,
            correlator.mode(),
            config.key_space.namespace(),
            config.key_space.component()
        );

        Ok(BackendClient::from_parts(config, http, correlator, publisher))
    }
}

impl BackendClient {
    /// Build a client from `config` alone.
    ///
    /// Shorthand for `ClientBuilder::new(config).build()`; the result is a
    /// sync client talking to `config.server`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ClientBuilder::new(config).build()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::{create_memory_pubsub_with_hub, CorrelationMode, HttpResponse, HttpTransport, MemoryHub};
    use bytes::Bytes;
    use std::sync::Arc;

    struct NoopHttp;

    #[async_trait::async_trait]
    impl HttpTransport for NoopHttp {
        async fn post(&self, _body: Bytes) -> Result<HttpResponse> {
            Ok(HttpResponse::ok(Bytes::new()))
        }
    }

    fn injected_config() -> ClientConfig {
        ClientConfig::new("000001", "000002", "")
    }

    #[test]
    fn test_sync_mode_without_pubsub() {
        // ---
        let client = ClientBuilder::new(injected_config())
            .http_transport(Arc::new(NoopHttp))
            .build()
            .unwrap();
        assert_eq!(client.mode(), CorrelationMode::Sync);
        assert_eq!(client.sender_id(), "000001");
        assert_eq!(client.protocol_version(), "1.0");
    }

    #[test]
    fn test_async_mode_with_pubsub() {
        // ---
        let client = ClientBuilder::new(injected_config())
            .http_transport(Arc::new(NoopHttp))
            .pubsub(create_memory_pubsub_with_hub(MemoryHub::new()))
            .async_timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        assert!(client.is_async());
    }

    #[test]
    fn test_pubsub_requires_timeout() {
        // ---
        let err = ClientBuilder::new(injected_config())
            .http_transport(Arc::new(NoopHttp))
            .pubsub(create_memory_pubsub_with_hub(MemoryHub::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RpcError::MissingConfig(ref field) if field == "async_timeout"));
    }

    #[test]
    fn test_timeout_without_pubsub() {
        // ---
        let err = ClientBuilder::new(injected_config())
            .http_transport(Arc::new(NoopHttp))
            .async_timeout(Duration::from_secs(1))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RpcError::ConfigConflict(_)));
    }

    #[test]
    fn test_missing_ids() {
        // ---
        let err = ClientBuilder::new(ClientConfig::new("", "000002", ""))
            .http_transport(Arc::new(NoopHttp))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RpcError::MissingConfig(ref field) if field == "sender_id"));
    }

    #[test]
    fn test_injected_transport_conflicts_with_server() {
        // ---
        let err = ClientBuilder::new(ClientConfig::new("a", "b", "http://peer"))
            .http_transport(Arc::new(NoopHttp))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RpcError::ConfigConflict(_)));
    }

    #[test]
    fn test_missing_server() {
        // ---
        let err = ClientBuilder::new(injected_config()).build().err().unwrap();
        assert!(matches!(err, RpcError::MissingConfig(_)));
    }
}
