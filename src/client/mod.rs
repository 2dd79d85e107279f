// src/client/mod.rs
//! Backend client implementation.
//!
//! This module contains the [`BackendClient`] type which sends roaming
//! requests to a peer network server and obtains their answers.
//!
//! # Architecture
//!
//! Every operation goes through one generic dispatcher:
//!
//! 1. stamp the request with the configured protocol version, sender and
//!    receiver ids and the operation's message type,
//! 2. derive the correlation key from (message type, transaction id),
//! 3. hand the serialized request to the [`ResponseCorrelator`], which
//!    returns the serialized answer in sync or async mode,
//! 4. decode the answer, check its transaction id and its result code.
//!
//! The mirror path, [`AnswerPublisher`], publishes answers this side computed
//! for a peer that is waiting in async mode.
//!
//! # Concurrency
//!
//! Any number of requests may be in flight at once. No lock is taken on the
//! request path; correlation keys keep concurrent transactions apart as long
//! as callers do not reuse a transaction id for two in-flight requests of the
//! same operation.

mod correlator;
mod publisher;

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;

pub use correlator::ResponseCorrelator;
pub use publisher::AnswerPublisher;

use crate::{
    // ---
    log_debug,
    random_transaction_id,
    Answer,
    ClientConfig,
    CorrelationKey,
    CorrelationMode,
    HomeNs,
    HomeNsAnsPayload,
    HomeNsReqPayload,
    HttpTransportPtr,
    Message,
    Operation,
    PrStart,
    PrStartAnsPayload,
    PrStartReqPayload,
    PrStop,
    PrStopAnsPayload,
    PrStopReqPayload,
    Profile,
    ProfileAnsPayload,
    ProfileReqPayload,
    Result,
    RpcError,
    TransactionId,
    XmitData,
    XmitDataAnsPayload,
    XmitDataReqPayload,
};

/// Roaming backend client.
///
/// Cheap to clone (internally `Arc`-backed). Build with
/// [`ClientBuilder`](crate::ClientBuilder).
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<Inner>,
}

struct Inner {
    // ---
    config: ClientConfig,
    http: HttpTransportPtr,
    correlator: ResponseCorrelator,
    publisher: Option<AnswerPublisher>,
}

impl BackendClient {
    // ---
    pub(crate) fn from_parts(
        config: ClientConfig,
        http: HttpTransportPtr,
        correlator: ResponseCorrelator,
        publisher: Option<AnswerPublisher>,
    ) -> Self {
        // ---
        Self {
            inner: Arc::new(Inner {
                config,
                http,
                correlator,
                publisher,
            }),
        }
    }

    pub fn sender_id(&self) -> &str {
        &self.inner.config.sender_id
    }

    pub fn receiver_id(&self) -> &str {
        &self.inner.config.receiver_id
    }

    pub fn protocol_version(&self) -> &str {
        &self.inner.config.protocol_version
    }

    pub fn mode(&self) -> CorrelationMode {
        self.inner.correlator.mode()
    }

    /// True when answers are delivered via pub/sub.
    pub fn is_async(&self) -> bool {
        self.mode() == CorrelationMode::Async
    }

    /// Random transaction id for a new request.
    ///
    /// See [`random_transaction_id`](crate::random_transaction_id) for the
    /// uniqueness caveat.
    pub fn random_transaction_id(&self) -> TransactionId {
        random_transaction_id()
    }

    /// Correlation key of transaction `transaction_id` of operation `Op`.
    pub fn key_for<Op: Operation>(&self, transaction_id: TransactionId) -> CorrelationKey {
        // ---
        CorrelationKey::new(
            &self.inner.config.key_space,
            Op::REQUEST_TYPE,
            transaction_id,
        )
    }

    /// Send a request of operation `Op` and return its answer.
    ///
    /// The request's transaction id must be set by the caller; protocol
    /// version, sender/receiver ids and message type are overwritten.
    ///
    /// # Errors
    ///
    /// - `RpcError::Serialization` - request encoding or answer decoding fails
    /// - `RpcError::InvalidResponse` - answer transaction id differs from the request's
    /// - `RpcError::Transport` - the POST or the answer listener fails
    /// - `RpcError::AsyncTimeout` - async mode, no answer within the timeout
    /// - `RpcError::Application` - the answer's result code is not `Success`
    pub async fn request<Op: Operation>(&self, payload: Op::Request) -> Result<Op::Answer> {
        // ---
        self.request_until::<Op, _>(payload, std::future::pending())
            .await
    }

    /// As [`request`](Self::request), giving up with `RpcError::Cancelled`
    /// when `cancel` completes before the answer.
    ///
    /// Cancellation releases the answer listener at once; a POST already on
    /// the wire still runs to completion in the background.
    pub async fn request_until<Op, C>(&self, mut payload: Op::Request, cancel: C) -> Result<Op::Answer>
    where
        Op: Operation,
        C: Future<Output = ()> + Send,
    {
        // ---
        let config = &self.inner.config;

        {
            let base = payload.base_mut();
            base.protocol_version = config.protocol_version.clone();
            base.sender_id = config.sender_id.clone();
            base.receiver_id = config.receiver_id.clone();
            base.message_type = Some(Op::REQUEST_TYPE);
        }

        let transaction_id = payload.base().transaction_id;
        let key = self.key_for::<Op>(transaction_id);

        let body = Bytes::from(serde_json::to_vec(&payload)?);

        log_debug!(
            "{key}: {} to {} ({:?} mode)",
            Op::REQUEST_TYPE,
            config.receiver_id,
            self.mode()
        );

        let answer_bytes = self
            .inner
            .correlator
            .exchange_until(body, &key, cancel)
            .await?;

        let answer: Op::Answer = serde_json::from_slice(&answer_bytes)?;

        let answered_id = answer.base().transaction_id;
        if answered_id != transaction_id {
            return Err(RpcError::InvalidResponse(format!(
                "{key}: answer carries transaction id {answered_id}"
            )));
        }

        // Peers may omit the tag; a present one must name this operation's answer.
        if let Some(answered_type) = answer.base().message_type {
            if answered_type != Op::ANSWER_TYPE {
                return Err(RpcError::InvalidResponse(format!(
                    "{key}: expected {}, got {answered_type}",
                    Op::ANSWER_TYPE
                )));
            }
        }

        let result = answer.result();
        if !result.result_code.is_success() {
            return Err(RpcError::Application {
                code: result.result_code.clone(),
                description: result.description.clone(),
            });
        }

        Ok(answer)
    }

    pub async fn pr_start_req(&self, payload: PrStartReqPayload) -> Result<PrStartAnsPayload> {
        self.request::<PrStart>(payload).await
    }

    pub async fn pr_stop_req(&self, payload: PrStopReqPayload) -> Result<PrStopAnsPayload> {
        self.request::<PrStop>(payload).await
    }

    pub async fn xmit_data_req(&self, payload: XmitDataReqPayload) -> Result<XmitDataAnsPayload> {
        self.request::<XmitData>(payload).await
    }

    pub async fn profile_req(&self, payload: ProfileReqPayload) -> Result<ProfileAnsPayload> {
        self.request::<Profile>(payload).await
    }

    pub async fn home_ns_req(&self, payload: HomeNsReqPayload) -> Result<HomeNsAnsPayload> {
        self.request::<HomeNs>(payload).await
    }

    /// Publish `answer` for a peer awaiting operation `Op` in async mode.
    ///
    /// # Errors
    ///
    /// - `RpcError::InvalidMode` - no pub/sub transport configured
    /// - `RpcError::Serialization` - answer encoding fails
    /// - `RpcError::Publish` - the broker did not take the publish
    pub async fn publish_answer<Op: Operation>(&self, answer: &Op::Answer) -> Result<()> {
        // ---
        let publisher = self.inner.publisher.as_ref().ok_or_else(|| {
            RpcError::InvalidMode("answer publishing requires a pub/sub transport".into())
        })?;

        publisher.publish::<Op>(answer).await
    }

    pub async fn handle_async_pr_start_ans(&self, answer: &PrStartAnsPayload) -> Result<()> {
        self.publish_answer::<PrStart>(answer).await
    }

    pub async fn handle_async_pr_stop_ans(&self, answer: &PrStopAnsPayload) -> Result<()> {
        self.publish_answer::<PrStop>(answer).await
    }

    pub async fn handle_async_xmit_data_ans(&self, answer: &XmitDataAnsPayload) -> Result<()> {
        self.publish_answer::<XmitData>(answer).await
    }

    pub async fn handle_async_profile_ans(&self, answer: &ProfileAnsPayload) -> Result<()> {
        self.publish_answer::<Profile>(answer).await
    }

    pub async fn handle_async_home_ns_ans(&self, answer: &HomeNsAnsPayload) -> Result<()> {
        self.publish_answer::<HomeNs>(answer).await
    }

    /// Push an answer to the peer endpoint over HTTP.
    ///
    /// # Errors
    ///
    /// - `RpcError::Serialization` - answer encoding fails
    /// - `RpcError::Transport` - the POST fails
    /// - `RpcError::UnexpectedStatus` - the peer answered with a status other than 200
    pub async fn send_answer<A: Answer>(&self, answer: &A) -> Result<()> {
        // ---
        let body = Bytes::from(serde_json::to_vec(answer)?);
        let resp = self.inner.http.post(body).await?;

        if resp.status != 200 {
            return Err(RpcError::UnexpectedStatus {
                status: resp.status,
                body: String::from_utf8_lossy(&resp.body).into_owned(),
            });
        }

        log_debug!(
            "answer for transaction {} pushed to {}",
            answer.base().transaction_id,
            self.receiver_id()
        );
        Ok(())
    }
}
