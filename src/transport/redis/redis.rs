//! Redis Pub/Sub implementation of the answer channel using `redis`.
//!
//! ## Concurrency model
//!
//! - A single background **actor task** owns both Redis connections.
//! - The actor is responsible for:
//!   - publishing answers via `publish_conn`,
//!   - registering and dropping broker subscriptions via `pubsub_sink`,
//!   - polling `pubsub_stream` for published answers,
//!   - clean shutdown of both connections.
//! - All interaction with the Redis client is serialized through this actor;
//!   no other task ever touches the connections directly.
//!
//! ## Two connections required
//!
//! A connection in Pub/Sub mode cannot issue `PUBLISH`, so two async
//! connections are maintained:
//!
//! - `publish_conn`: `MultiplexedConnection`, used only for `PUBLISH`
//! - `pubsub_sink` / `pubsub_stream`: split from `aio::PubSub`, used for
//!   `SUBSCRIBE`/`UNSUBSCRIBE` and for receiving messages respectively
//!
//! ## Subscription confirmation
//!
//! `PubSubSink::subscribe()` resolves only after the broker confirms the
//! subscription, so `subscribe()` on this transport returns with the
//! listener armed. That is what makes subscribe-before-send safe.
//!
//! ## Release
//!
//! Each local listener is counted per channel. Dropping the last
//! `SubscriptionHandle` of a channel queues an `UNSUBSCRIBE` on the actor.
//!
//! ## Payloads
//!
//! Payloads are published as-is (the raw answer JSON), so answers published
//! by other implementations of the protocol on the same key space are
//! understood.

use futures_util::StreamExt;

use redis::aio::{MultiplexedConnection, PubSubSink, PubSubStream};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;

use crate::{
    //
    log_debug,
    log_error,
    log_info,
    CorrelationKey,
    PubSub,
    PubSubPtr,
    Result,
    RpcError,
    SubscriptionHandle,
};

/// Inbox depth per listener.
const INBOX_CAPACITY: usize = 4;

type SubscriberMap = Arc<Mutex<HashMap<String, Vec<(u64, mpsc::Sender<Bytes>)>>>>;

fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // ---
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

//
// Actor commands
//

enum Cmd {
    //
    Publish {
        channel: String,
        payload: Bytes,
        resp: oneshot::Sender<Result<()>>,
    },
    Subscribe {
        channel: String,
        resp: oneshot::Sender<Result<()>>,
    },
    Unsubscribe {
        channel: String,
    },
    Close {
        resp: oneshot::Sender<Result<()>>,
    },
}

enum ActorStep {
    //
    Continue,
    Stop,
}

impl Cmd {
    // ---

    /// Dispatches an actor command to the correct handler on the actor.
    async fn handle(self, actor: &mut RedisActor) -> ActorStep {
        // ---

        match self {
            Cmd::Publish {
                channel,
                payload,
                resp,
            } => {
                let result = actor.handle_publish(channel, payload).await;
                let _ = resp.send(result);
                ActorStep::Continue
            }
            Cmd::Subscribe { channel, resp } => {
                let result = actor.handle_subscribe(channel).await;
                let _ = resp.send(result);
                ActorStep::Continue
            }
            Cmd::Unsubscribe { channel } => {
                actor.handle_unsubscribe(channel).await;
                ActorStep::Continue
            }
            Cmd::Close { resp } => {
                actor.handle_close();
                let _ = resp.send(Ok(()));
                ActorStep::Stop
            }
        }
    }
}

/// Redis Pub/Sub implementation of the `PubSub` trait.
struct RedisPubSub {
    // ---
    cmd_tx: mpsc::Sender<Cmd>,
    subscribers: SubscriberMap,
    next_id: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct RedisActor {
    // ---
    publish_conn: MultiplexedConnection,
    pubsub_sink: PubSubSink,
    pubsub_stream: PubSubStream,
    cmd_rx: mpsc::Receiver<Cmd>,
    subscribers: SubscriberMap,
    shutdown: Arc<Notify>,
}

impl RedisActor {
    // ---

    async fn run(mut self) {
        // ---

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if matches!(cmd.handle(&mut self).await, ActorStep::Stop) {
                                break;
                            }
                        }
                        None => break,
                    }
                }

                maybe_msg = self.pubsub_stream.next() => {
                    match maybe_msg {
                        Some(msg) => self.handle_incoming(msg),
                        None => {
                            log_error!("redis: pubsub stream ended");
                            break;
                        }
                    }
                }

                _ = self.shutdown.notified() => {
                    break;
                }
            }
        }

        // Wake any waiter still parked on a listener.
        lock_ignore_poison(&self.subscribers).clear();
        log_debug!("redis: actor stopped");
    }

    /// Issues `PUBLISH` on the dedicated multiplexed connection.
    async fn handle_publish(&mut self, channel: String, payload: Bytes) -> Result<()> {
        // ---

        redis::cmd("PUBLISH")
            .arg(&channel)
            .arg(payload.as_ref())
            .query_async::<i64>(&mut self.publish_conn)
            .await
            .map(|receivers| {
                log_debug!("redis: published on {channel} to {receivers} receivers");
            })
            .map_err(|err| {
                let msg = format!("publish failed for channel {channel}: {err}");
                log_error!("redis: {msg}");
                RpcError::Publish(msg)
            })
    }

    /// Registers a broker subscription and awaits its confirmation.
    async fn handle_subscribe(&mut self, channel: String) -> Result<()> {
        // ---

        match self.pubsub_sink.subscribe(&channel).await {
            Ok(()) => {
                log_debug!("redis: subscribed to {channel}");
                Ok(())
            }
            Err(err) => {
                let msg = format!("failed to subscribe to channel {channel}: {err}");
                log_error!("redis: {msg}");
                Err(RpcError::Transport(msg))
            }
        }
    }

    /// Drops the broker subscription unless a listener re-registered meanwhile.
    async fn handle_unsubscribe(&mut self, channel: String) {
        // ---

        let still_wanted = lock_ignore_poison(&self.subscribers).contains_key(&channel);
        if still_wanted {
            return;
        }

        if let Err(err) = self.pubsub_sink.unsubscribe(&channel).await {
            log_debug!("redis: unsubscribe {channel} failed: {err}");
        }
    }

    fn handle_close(&mut self) {
        // ---

        log_debug!("redis: disconnecting");
        self.shutdown.notify_waiters();
    }

    /// Fans a published message out to the local listeners of its channel.
    fn handle_incoming(&self, msg: redis::Msg) {
        // ---

        let channel = msg.get_channel_name().to_string();

        let payload: Vec<u8> = match msg.get_payload() {
            Ok(p) => p,
            Err(err) => {
                log_debug!("redis: failed to get payload on channel {channel}: {err}");
                return;
            }
        };
        let payload = Bytes::from(payload);

        let senders: Vec<mpsc::Sender<Bytes>> = {
            let map = lock_ignore_poison(&self.subscribers);
            match map.get(&channel) {
                Some(entries) => entries.iter().map(|(_, tx)| tx.clone()).collect(),
                None => return,
            }
        };

        for tx in senders {
            if let Err(err) = tx.try_send(payload.clone()) {
                log_debug!("redis: drop delivery on {channel}: {err}");
            }
        }
    }
} // RedisActor

impl RedisPubSub {
    // ---

    async fn call<T>(&self, cmd: Cmd, rx: oneshot::Receiver<Result<T>>) -> Result<T> {
        // ---
        self.cmd_tx.send(cmd).await.map_err(|e| {
            let msg = format!("actor command channel closed: {e}");
            RpcError::Transport(msg)
        })?;

        rx.await.map_err(|e| {
            let msg = format!("actor responder channel read failed: {e}");
            RpcError::Transport(msg)
        })?
    }

    fn release(subscribers: &SubscriberMap, cmd_tx: &mpsc::Sender<Cmd>, channel: String, id: u64) {
        // ---
        let now_empty = {
            let mut map = lock_ignore_poison(subscribers);
            match map.get_mut(&channel) {
                Some(entries) => {
                    entries.retain(|(entry_id, _)| *entry_id != id);
                    if entries.is_empty() {
                        map.remove(&channel);
                        true
                    } else {
                        false
                    }
                }
                None => false,
            }
        };

        if now_empty {
            // Runs from Drop, so this cannot await. A full queue only leaves
            // an idle broker subscription behind.
            if let Err(err) = cmd_tx.try_send(Cmd::Unsubscribe {
                channel: channel.clone(),
            }) {
                log_debug!("redis: could not queue unsubscribe for {channel}: {err}");
            }
        }
    }
}

#[async_trait::async_trait]
impl PubSub for RedisPubSub {
    // ---

    async fn publish(&self, key: &CorrelationKey, payload: Bytes) -> Result<()> {
        // ---

        let (tx, rx) = oneshot::channel();
        let cmd = Cmd::Publish {
            channel: key.as_str().to_string(),
            payload,
            resp: tx,
        };

        self.call(cmd, rx).await.map_err(|err| match err {
            RpcError::Transport(msg) => RpcError::Publish(msg),
            other => other,
        })
    }

    async fn subscribe(&self, key: &CorrelationKey) -> Result<SubscriptionHandle> {
        // ---

        let channel = key.as_str().to_string();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Register locally first so nothing the broker delivers after
        // confirming the subscription can miss this inbox.
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        lock_ignore_poison(&self.subscribers)
            .entry(channel.clone())
            .or_default()
            .push((id, tx));

        let subscribers = Arc::clone(&self.subscribers);
        let cmd_tx = self.cmd_tx.clone();
        let release_channel = channel.clone();
        let handle = SubscriptionHandle::with_release(rx, move || {
            Self::release(&subscribers, &cmd_tx, release_channel, id);
        });

        let (resp_tx, resp_rx) = oneshot::channel();
        let cmd = Cmd::Subscribe {
            channel,
            resp: resp_tx,
        };

        // On failure `handle` drops here and the local entry is released.
        self.call(cmd, resp_rx).await?;

        Ok(handle)
    }

    async fn close(&self) -> Result<()> {
        // ---

        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Cmd::Close { resp: tx }).await;
        let _ = rx.await;

        let task = lock_ignore_poison(&self.task).take();
        if let Some(task) = task {
            let _ = task.await;
        }

        Ok(())
    }
}

/// Creates a Redis Pub/Sub answer channel for the given broker URI.
///
/// # Errors
///
/// Returns `RpcError::Transport` if the client cannot be opened or either
/// connection cannot be established (both connections are eager).
pub async fn create_pubsub(uri: &str) -> Result<PubSubPtr> {
    // ---

    let client = redis::Client::open(uri).map_err(|err| {
        let msg = format!("redis: failed to open client for URI {uri}: {err}");
        log_error!("{msg}");
        RpcError::Transport(msg)
    })?;

    let publish_conn = client
        .get_multiplexed_async_connection()
        .await
        .map_err(|err| {
            let msg = format!("redis: failed to connect publish connection to {uri}: {err}");
            log_error!("{msg}");
            RpcError::Transport(msg)
        })?;

    let (pubsub_sink, pubsub_stream) = client
        .get_async_pubsub()
        .await
        .map_err(|err| {
            let msg = format!("redis: failed to connect pubsub connection to {uri}: {err}");
            log_error!("{msg}");
            RpcError::Transport(msg)
        })?
        .split();

    log_info!("redis: connected to broker at {uri}");

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let subscribers: SubscriberMap = Arc::new(Mutex::new(HashMap::new()));

    let actor = RedisActor {
        publish_conn,
        pubsub_sink,
        pubsub_stream,
        cmd_rx,
        subscribers: Arc::clone(&subscribers),
        shutdown: Arc::new(Notify::new()),
    };

    let task = tokio::spawn(actor.run());

    Ok(Arc::new(RedisPubSub {
        cmd_tx,
        subscribers,
        next_id: Arc::new(AtomicU64::new(0)),
        task: Mutex::new(Some(task)),
    }))
}
