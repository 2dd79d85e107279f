// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use roam_rpc::{
    // ---
    HttpResponse,
    HttpTransport,
    Result,
    RpcError,
};

type Responder = dyn Fn(&Value) -> Result<HttpResponse> + Send + Sync;

/// Scriptable peer endpoint.
///
/// Every POST body is decoded and recorded; the responder computes the HTTP
/// response from the decoded request after an optional delay.
pub struct MockPeer {
    // ---
    responder: Box<Responder>,
    delay: Duration,
    requests: Mutex<Vec<Value>>,
}

impl MockPeer {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&Value) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self::with_delay(Duration::ZERO, responder)
    }

    pub fn with_delay<F>(delay: Duration, responder: F) -> Arc<Self>
    where
        F: Fn(&Value) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            delay,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Peer acknowledging every request with an empty 200.
    pub fn ack() -> Arc<Self> {
        Self::new(|_| Ok(HttpResponse::ok(Bytes::new())))
    }

    /// Peer whose every POST fails at the transport level.
    pub fn unreachable() -> Arc<Self> {
        Self::new(|_| Err(RpcError::Transport("connection refused".into())))
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockPeer {
    async fn post(&self, body: Bytes) -> Result<HttpResponse> {
        // ---
        let request: Value = serde_json::from_slice(&body)?;
        self.requests.lock().unwrap().push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        (self.responder)(&request)
    }
}

/// JSON response body helper.
pub fn json_response(status: u16, value: Value) -> Result<HttpResponse> {
    Ok(HttpResponse::new(status, serde_json::to_vec(&value)?))
}

/// Transaction id of a recorded request.
pub fn transaction_id(request: &Value) -> u64 {
    request["TransactionID"].as_u64().unwrap_or_default()
}

pub fn init_logging() {
    // ---
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
