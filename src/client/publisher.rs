use bytes::Bytes;

use crate::{
    // ---
    log_debug,
    log_error,
    CorrelationKey,
    KeySpace,
    Message,
    Operation,
    PubSubPtr,
    Result,
    RpcError,
};

/// Delivers locally computed answers to a peer waiting in async mode.
///
/// The answer is published on the key derived from the operation's request
/// type and the answer's transaction id, which must equal the transaction id
/// of the request being answered.
#[derive(Clone)]
pub struct AnswerPublisher {
    // ---
    pubsub: PubSubPtr,
    key_space: KeySpace,
}

impl AnswerPublisher {
    pub fn new(pubsub: PubSubPtr, key_space: KeySpace) -> Self {
        Self { pubsub, key_space }
    }

    /// Serialize `answer` and publish it on its correlation key.
    ///
    /// # Errors
    ///
    /// - `RpcError::Serialization` if the answer cannot be encoded
    /// - `RpcError::Publish` if the broker rejects or cannot take the publish
    pub async fn publish<Op: Operation>(&self, answer: &Op::Answer) -> Result<()> {
        // ---
        let key = CorrelationKey::new(
            &self.key_space,
            Op::REQUEST_TYPE,
            answer.base().transaction_id,
        );

        let payload = Bytes::from(serde_json::to_vec(answer)?);

        self.pubsub.publish(&key, payload).await.map_err(|err| {
            log_error!("{key}: publish answer failed: {err}");
            match err {
                RpcError::Publish(msg) | RpcError::Transport(msg) => RpcError::Publish(msg),
                other => RpcError::Publish(other.to_string()),
            }
        })?;

        log_debug!("{key}: answer published");
        Ok(())
    }
}
