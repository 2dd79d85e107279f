use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;

use super::MessageType;
use crate::{Result, RpcError};

/// 32-bit identifier of one logical request/answer pair.
pub type TransactionId = u32;

/// Draw a transaction id from the operating system CSPRNG.
///
/// Values are uniformly distributed over the full `u32` range. Nothing is
/// retained between calls, so uniqueness is not enforced: callers must not
/// reuse a value for two concurrently in-flight requests of the same message
/// type, or their answers may cross-deliver.
pub fn random_transaction_id() -> TransactionId {
    // ---
    OsRng.next_u32()
}

/// Namespace and component prefix of every correlation key.
///
/// Both sides of a transaction must agree on the key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySpace {
    namespace: String,
    component: String,
}

impl KeySpace {
    /// Create a key space.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::ConfigConflict` if either part is empty or contains
    /// the `:` delimiter, since that would make key encoding ambiguous.
    pub fn new(namespace: impl Into<String>, component: impl Into<String>) -> Result<Self> {
        // ---
        let namespace = namespace.into();
        let component = component.into();

        for (label, part) in [("namespace", &namespace), ("component", &component)] {
            if part.is_empty() || part.contains(':') {
                return Err(RpcError::ConfigConflict(format!(
                    "key {label} must be non-empty and must not contain ':' (got {part:?})"
                )));
            }
        }

        Ok(Self {
            namespace,
            component,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Default for KeySpace {
    /// `lora:backend`
    fn default() -> Self {
        Self {
            namespace: "lora".into(),
            component: "backend".into(),
        }
    }
}

/// Pub/sub channel name matching a published answer to its waiting request.
///
/// Format: `<namespace>:<component>:async:<message-type>:<transaction-id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey(Arc<str>);

impl CorrelationKey {
    /// Derive the key for a transaction.
    ///
    /// Total and deterministic; distinct `(message_type, transaction_id)`
    /// pairs within one key space always yield distinct keys.
    pub fn new(
        space: &KeySpace,
        message_type: MessageType,
        transaction_id: TransactionId,
    ) -> Self {
        // ---
        Self(Arc::from(format!(
            "{}:{}:async:{}:{}",
            space.namespace(),
            space.component(),
            message_type,
            transaction_id
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationKey {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for CorrelationKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}
