//! Topic publishers.
//!
//! [`StreamPublisher`] appends messages onto a Redis stream with `XADD
//! MAXLEN ~` trimming. Synchronous publishes surface broker errors to the
//! caller; asynchronous publishes go through a bounded per-publisher queue
//! drained by a worker task, which preserves per-request emission order and
//! never blocks the caller beyond the enqueue.

use crate::{error::MessagingError, topics::Topic};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Capacity of the fire-and-forget queue per publisher.
const ASYNC_QUEUE_CAPACITY: usize = 1024;

/// A live producer handle bound to one topic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    fn topic(&self) -> Topic;

    /// Publish synchronously; the caller observes broker errors.
    async fn publish_value(&self, value: Value) -> Result<(), MessagingError>;

    /// Publish fire-and-forget: enqueue, log failures, never panic.
    fn publish_async_value(&self, value: Value);

    /// Stop the publisher. Idempotent; queued messages drain, further
    /// publishes are rejected.
    fn stop(&self);
}

/// Serialization front over [`Publisher`] for typed messages.
#[async_trait]
pub trait PublisherExt: Publisher {
    async fn publish<T: Serialize + Sync>(&self, message: &T) -> Result<(), MessagingError> {
        let value = serde_json::to_value(message)?;
        self.publish_value(value).await
    }

    fn publish_async<T: Serialize>(&self, message: &T) {
        match serde_json::to_value(message) {
            Ok(value) => self.publish_async_value(value),
            Err(error) => {
                error!(%error, topic = %self.topic(), "Failed to serialize message, dropping");
            }
        }
    }
}

impl<P: Publisher + ?Sized> PublisherExt for P {}

async fn xadd(
    conn: &mut ConnectionManager,
    stream: &str,
    max_length: i64,
    value: &Value,
) -> Result<String, MessagingError> {
    let body = serde_json::to_string(value)?;

    // XADD with MAXLEN ~ for approximate trimming (more efficient)
    let stream_id: String = redis::cmd("XADD")
        .arg(stream)
        .arg("MAXLEN")
        .arg("~")
        .arg(max_length)
        .arg("*")
        .arg("message")
        .arg(&body)
        .query_async(conn)
        .await?;

    Ok(stream_id)
}

/// Publisher backed by a Redis stream.
pub struct StreamPublisher {
    topic: Topic,
    redis: ConnectionManager,
    max_stream_length: i64,
    stopped: AtomicBool,
    queue: Mutex<Option<mpsc::Sender<Value>>>,
}

impl StreamPublisher {
    /// Bind a publisher to `topic` and spawn its queue worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(topic: Topic, redis: ConnectionManager, max_stream_length: i64) -> Self {
        let (tx, mut rx) = mpsc::channel::<Value>(ASYNC_QUEUE_CAPACITY);

        let mut worker_conn = redis.clone();
        let stream = topic.stream_name();
        tokio::spawn(async move {
            while let Some(value) = rx.recv().await {
                match xadd(&mut worker_conn, &stream, max_stream_length, &value).await {
                    Ok(stream_id) => {
                        debug!(stream = %stream, stream_id = %stream_id, "Published queued message");
                    }
                    Err(error) => {
                        error!(%error, stream = %stream, "Failed to publish queued message, dropping");
                    }
                }
            }
            debug!(stream = %stream, "Publisher queue drained");
        });

        Self {
            topic,
            redis,
            max_stream_length,
            stopped: AtomicBool::new(false),
            queue: Mutex::new(Some(tx)),
        }
    }
}

#[async_trait]
impl Publisher for StreamPublisher {
    fn topic(&self) -> Topic {
        self.topic
    }

    async fn publish_value(&self, value: Value) -> Result<(), MessagingError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(MessagingError::Stopped(self.topic.to_string()));
        }

        let mut conn = self.redis.clone();
        let stream_id = xadd(&mut conn, &self.topic.stream_name(), self.max_stream_length, &value).await?;
        debug!(stream = %self.topic, stream_id = %stream_id, "Published message");
        Ok(())
    }

    fn publish_async_value(&self, value: Value) {
        if self.stopped.load(Ordering::SeqCst) {
            warn!(topic = %self.topic, "Publish after stop, dropping message");
            return;
        }

        let queue = self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match queue.as_ref() {
            Some(tx) => {
                if let Err(error) = tx.try_send(value) {
                    error!(%error, topic = %self.topic, "Publish queue rejected message, dropping");
                }
            }
            None => {
                warn!(topic = %self.topic, "Publish after stop, dropping message");
            }
        }
    }

    fn stop(&self) {
        if self
            .stopped
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!(topic = %self.topic, "Stopping publisher");
            // Dropping the sender lets the worker drain what is queued.
            let mut queue = self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            queue.take();
        }
    }
}

/// In-process publisher that records every message, for tests.
#[derive(Default)]
pub struct MemoryPublisher {
    topic: Option<Topic>,
    stopped: AtomicBool,
    published: Mutex<Vec<Value>>,
}

impl MemoryPublisher {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic: Some(topic),
            stopped: AtomicBool::new(false),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Messages published so far, in publish order.
    pub fn published(&self) -> Vec<Value> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, value: Value) -> Result<(), MessagingError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(MessagingError::Stopped(self.topic().to_string()));
        }
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(value);
        Ok(())
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    fn topic(&self) -> Topic {
        self.topic.unwrap_or(Topic::DataChanges)
    }

    async fn publish_value(&self, value: Value) -> Result<(), MessagingError> {
        self.record(value)
    }

    fn publish_async_value(&self, value: Value) {
        if let Err(error) = self.record(value) {
            warn!(%error, "Dropped message");
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
