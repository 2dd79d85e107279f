//! Dual-mode response correlation.
//!
//! # Sync mode
//!
//! The request is POSTed and the response body is the answer, whatever the
//! HTTP status.
//!
//! # Async mode
//!
//! The answer is published by the peer on the request's correlation key.
//! The order of operations is fixed:
//!
//! 1. the caller derives the key before anything is sent,
//! 2. the listener on that key is armed (`subscribe()` returns only once the
//!    registration is effective),
//! 3. the POST is spawned; its response is only an acknowledgement,
//! 4. the first of {published answer, timeout, cancellation} decides the
//!    outcome; a failed POST decides it only under
//!    [`SendFailurePolicy::FailFast`],
//! 5. the listener is released on return, whatever the outcome.
//!
//! A peer may publish within microseconds of receiving the request, so
//! step 2 strictly precedes step 3.
//!
//! # Cancellation
//!
//! The caller-supplied cancellation future aborts the wait. The POST runs in
//! its own task and is never dropped mid-flight; it completes (or fails) in
//! the background and its result is discarded.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use tokio::task::{JoinError, JoinHandle};
use tokio::time;

use crate::{
    // ---
    log_debug,
    log_warn,
    CorrelationKey,
    CorrelationMode,
    HttpResponse,
    HttpTransportPtr,
    PubSubPtr,
    Result,
    RpcError,
    SendFailurePolicy,
};

struct AsyncAnswers {
    // ---
    pubsub: PubSubPtr,
    timeout: Duration,
    on_send_failure: SendFailurePolicy,
}

/// Obtains the serialized answer to a serialized request.
///
/// Stateless between calls and safe to share across concurrent requests;
/// correlation keys partition everything a request touches.
pub struct ResponseCorrelator {
    // ---
    http: HttpTransportPtr,
    answers: Option<AsyncAnswers>,
}

impl ResponseCorrelator {
    // ---
    /// Correlator whose answers are HTTP response bodies.
    pub fn sync(http: HttpTransportPtr) -> Self {
        // ---
        Self {
            http,
            answers: None,
        }
    }

    /// Correlator whose answers are published on `pubsub`.
    pub fn with_pubsub(
        http: HttpTransportPtr,
        pubsub: PubSubPtr,
        timeout: Duration,
        on_send_failure: SendFailurePolicy,
    ) -> Self {
        // ---
        Self {
            http,
            answers: Some(AsyncAnswers {
                pubsub,
                timeout,
                on_send_failure,
            }),
        }
    }

    pub fn mode(&self) -> CorrelationMode {
        // ---
        match self.answers {
            Some(_) => CorrelationMode::Async,
            None => CorrelationMode::Sync,
        }
    }

    /// Send `body` and return the serialized answer.
    ///
    /// `key` must have been derived from the request's message type and
    /// transaction id; it is ignored in sync mode.
    ///
    /// # Errors
    ///
    /// - `RpcError::Transport` if the POST fails (async: subject to the
    ///   send failure policy) or the listener cannot be armed
    /// - `RpcError::AsyncTimeout` if no answer is published in time
    pub async fn exchange(&self, body: Bytes, key: &CorrelationKey) -> Result<Bytes> {
        // ---
        self.exchange_until(body, key, std::future::pending()).await
    }

    /// As [`exchange`](Self::exchange), aborting the wait with
    /// `RpcError::Cancelled` when `cancel` completes first.
    pub async fn exchange_until<C>(
        &self,
        body: Bytes,
        key: &CorrelationKey,
        cancel: C,
    ) -> Result<Bytes>
    where
        C: Future<Output = ()> + Send,
    {
        // ---
        match &self.answers {
            None => self.exchange_sync(body, key, cancel).await,
            Some(answers) => self.exchange_async(answers, body, key, cancel).await,
        }
    }

    async fn exchange_sync<C>(&self, body: Bytes, key: &CorrelationKey, cancel: C) -> Result<Bytes>
    where
        C: Future<Output = ()> + Send,
    {
        // ---
        let send = self.spawn_send(body);
        tokio::pin!(cancel);

        tokio::select! {
            biased;

            sent = send => {
                let resp = flatten_join(sent)?;
                log_debug!("{key}: sync answer with status {} ({} bytes)", resp.status, resp.body.len());
                Ok(resp.body)
            }

            _ = &mut cancel => {
                log_debug!("{key}: cancelled, request left to complete in background");
                Err(RpcError::Cancelled)
            }
        }
    }

    async fn exchange_async<C>(
        &self,
        answers: &AsyncAnswers,
        body: Bytes,
        key: &CorrelationKey,
        cancel: C,
    ) -> Result<Bytes>
    where
        C: Future<Output = ()> + Send,
    {
        // ---
        // Dropping `subscription` on any return below releases the listener.
        let mut subscription = answers.pubsub.subscribe(key).await?;
        log_debug!("{key}: listener armed");

        let mut send = self.spawn_send(body);
        let mut send_pending = true;

        let deadline = time::sleep(answers.timeout);
        tokio::pin!(deadline);
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                // An answer that is already there wins over a timeout or
                // cancellation observed in the same poll.
                biased;

                delivered = subscription.inbox.recv() => {
                    return match delivered {
                        Some(answer) => {
                            log_debug!("{key}: answer delivered ({} bytes)", answer.len());
                            Ok(answer)
                        }
                        None => Err(RpcError::Transport(format!(
                            "{key}: answer channel closed before delivery"
                        ))),
                    };
                }

                sent = &mut send, if send_pending => {
                    send_pending = false;

                    match flatten_join(sent) {
                        Ok(ack) => {
                            log_debug!("{key}: request acknowledged with status {}", ack.status);
                        }
                        Err(err) => match answers.on_send_failure {
                            SendFailurePolicy::FailFast => return Err(err),
                            SendFailurePolicy::AwaitAnswer => {
                                log_warn!("{key}: send failed, still awaiting answer: {err}");
                            }
                        },
                    }
                }

                _ = &mut deadline => {
                    log_debug!("{key}: no answer within {:?}", answers.timeout);
                    return Err(RpcError::AsyncTimeout);
                }

                _ = &mut cancel => {
                    log_debug!("{key}: cancelled while awaiting answer");
                    return Err(RpcError::Cancelled);
                }
            }
        }
    }

    /// POST in a task of its own so that an abandoned wait never cancels a
    /// request already on the wire.
    fn spawn_send(&self, body: Bytes) -> JoinHandle<Result<HttpResponse>> {
        // ---
        let http = self.http.clone();
        tokio::spawn(async move { http.post(body).await })
    }
}

fn flatten_join(
    joined: std::result::Result<Result<HttpResponse>, JoinError>,
) -> Result<HttpResponse> {
    // ---
    joined.map_err(|err| RpcError::Transport(format!("send task failed: {err}")))?
}
