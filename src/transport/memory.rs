//! In-memory pub/sub implementation.
//!
//! This module provides a pure in-process implementation of the domain-level
//! `PubSub` trait. It is intended for tests, local execution, and as the
//! reference for answer-channel semantics.
//!
//! ## Reference Semantics
//!
//! - Once `subscribe()` returns successfully, payloads published *after* that
//!   point on the same key are deliverable.
//! - Keys match by exact string equality.
//! - Delivery is deterministic within a single process.
//! - Dropping a `SubscriptionHandle` removes its registration immediately.
//!
//! ## Non-Goals
//!
//! This transport does not emulate the failure modes, persistence, or
//! delivery guarantees of any specific broker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::{
    // ---
    log_debug,
    CorrelationKey,
    PubSub,
    PubSubPtr,
    Result,
    SubscriptionHandle,
};

/// Inbox depth per subscription. A correlation key carries one answer.
const INBOX_CAPACITY: usize = 4;

type SubscriberMap = HashMap<CorrelationKey, Vec<(u64, mpsc::Sender<Bytes>)>>;

/// Acquire a mutex guard, ignoring poisoning.
///
/// The map holds no cross-entry invariants; the worst outcome of a poisoned
/// lock is a stale sender that fails on the next publish.
fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Shared in-process message bus.
///
/// All pub/sub handles created over the same hub see each other's
/// publishes, exactly as clients connected to one broker would. Construct a
/// hub per test for isolation.
pub struct MemoryHub {
    // ---
    subscriptions: Mutex<SubscriberMap>,
    next_id: AtomicU64,
}

impl MemoryHub {
    /// Create a new, empty hub.
    pub fn new() -> Arc<Self> {
        // ---
        Arc::new(Self::default())
    }

    /// Number of live listeners on `key`.
    pub fn subscriber_count(&self, key: &CorrelationKey) -> usize {
        // ---
        lock_ignore_poison(&self.subscriptions)
            .get(key)
            .map_or(0, Vec::len)
    }

    /// Total number of live listeners across all keys.
    pub fn total_subscribers(&self) -> usize {
        // ---
        lock_ignore_poison(&self.subscriptions)
            .values()
            .map(Vec::len)
            .sum()
    }

    fn publish(&self, key: &CorrelationKey, payload: Bytes) {
        // ---
        let senders: Vec<mpsc::Sender<Bytes>> = {
            let subs = lock_ignore_poison(&self.subscriptions);
            match subs.get(key) {
                Some(entries) => entries.iter().map(|(_, tx)| tx.clone()).collect(),
                None => Vec::new(),
            }
        };

        log_debug!("memory: publish to {key} ({} listeners)", senders.len());

        for sender in senders {
            // A full or closed inbox belongs to a listener that is going away.
            if let Err(err) = sender.try_send(payload.clone()) {
                log_debug!("memory: drop delivery on {key}: {err}");
            }
        }
    }

    fn subscribe(self: &Arc<Self>, key: &CorrelationKey) -> SubscriptionHandle {
        // ---
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        lock_ignore_poison(&self.subscriptions)
            .entry(key.clone())
            .or_default()
            .push((id, tx));

        log_debug!("memory: subscribe to {key} (id {id})");

        let hub: Weak<Self> = Arc::downgrade(self);
        let key = key.clone();

        SubscriptionHandle::with_release(rx, move || {
            if let Some(hub) = hub.upgrade() {
                hub.unsubscribe(&key, id);
            }
        })
    }

    fn unsubscribe(&self, key: &CorrelationKey, id: u64) {
        // ---
        let mut subs = lock_ignore_poison(&self.subscriptions);
        if let Some(entries) = subs.get_mut(key) {
            entries.retain(|(entry_id, _)| *entry_id != id);
            if entries.is_empty() {
                subs.remove(key);
            }
        }
        log_debug!("memory: release {key} (id {id})");
    }

    fn clear(&self) {
        lock_ignore_poison(&self.subscriptions).clear();
    }
}

impl Default for MemoryHub {
    fn default() -> Self {
        // ---
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

/// Process-global hub used by [`create_memory_pubsub`].
static GLOBAL_HUB: OnceLock<Arc<MemoryHub>> = OnceLock::new();

fn global_hub() -> Arc<MemoryHub> {
    GLOBAL_HUB.get_or_init(MemoryHub::new).clone()
}

/// In-memory pub/sub bound to a [`MemoryHub`].
struct MemoryPubSub {
    // ---
    hub: Arc<MemoryHub>,
}

#[async_trait::async_trait]
impl PubSub for MemoryPubSub {
    // ---
    async fn publish(&self, key: &CorrelationKey, payload: Bytes) -> Result<()> {
        self.hub.publish(key, payload);
        Ok(())
    }

    /// Registration is synchronous, so the listener is armed on return.
    async fn subscribe(&self, key: &CorrelationKey) -> Result<SubscriptionHandle> {
        Ok(self.hub.subscribe(key))
    }

    /// Clears every subscription on the shared hub, including those of other
    /// handles over the same hub.
    async fn close(&self) -> Result<()> {
        log_debug!("memory: closing pub/sub");
        self.hub.clear();
        Ok(())
    }
}

/// Create an in-memory pub/sub over the process-global hub.
pub fn create_memory_pubsub() -> PubSubPtr {
    // ---
    create_memory_pubsub_with_hub(global_hub())
}

/// Create an in-memory pub/sub over an explicitly constructed hub.
pub fn create_memory_pubsub_with_hub(hub: Arc<MemoryHub>) -> PubSubPtr {
    // ---
    Arc::new(MemoryPubSub { hub })
}
