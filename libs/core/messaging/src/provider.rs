//! Publisher caching and lifecycle.
//!
//! A provider is a process-wide resource created at boot and closed at
//! shutdown. Publishers are created lazily on first request for a topic and
//! cached; at most one producer exists per (process, topic).

use crate::{
    error::MessagingError,
    publisher::{MemoryPublisher, Publisher, StreamPublisher},
    topics::Topic,
};
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

pub trait PublisherProvider: Send + Sync {
    /// Return the cached publisher for `topic`, creating it on first call.
    ///
    /// Concurrent callers for the same topic observe exactly one creation.
    fn provide_publisher(&self, topic: Topic) -> Result<Arc<dyn Publisher>, MessagingError>;

    /// Stop every cached publisher. Idempotent; afterwards
    /// `provide_publisher` is an error.
    fn close(&self);
}

/// Provider backed by Redis streams.
pub struct StreamPublisherProvider {
    redis: ConnectionManager,
    max_stream_length: i64,
    cache: Mutex<HashMap<Topic, Arc<StreamPublisher>>>,
    closed: AtomicBool,
}

impl StreamPublisherProvider {
    pub fn new(redis: ConnectionManager, max_stream_length: i64) -> Self {
        Self {
            redis,
            max_stream_length,
            cache: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }
}

impl PublisherProvider for StreamPublisherProvider {
    fn provide_publisher(&self, topic: Topic) -> Result<Arc<dyn Publisher>, MessagingError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MessagingError::Stopped(topic.to_string()));
        }

        // Creation happens under the cache lock: concurrent callers for the
        // same topic see exactly one producer.
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let publisher = cache.entry(topic).or_insert_with(|| {
            info!(topic = %topic, "Creating publisher");
            Arc::new(StreamPublisher::new(
                topic,
                self.redis.clone(),
                self.max_stream_length,
            ))
        });

        Ok(Arc::clone(publisher) as Arc<dyn Publisher>)
    }

    fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            for publisher in cache.values() {
                publisher.stop();
            }
            info!(count = cache.len(), "Closed publisher provider");
        }
    }
}

/// In-process provider for tests; exposes the concrete publishers so
/// assertions can inspect what was published.
#[derive(Default)]
pub struct MemoryPublisherProvider {
    cache: Mutex<HashMap<Topic, Arc<MemoryPublisher>>>,
    closed: AtomicBool,
}

impl MemoryPublisherProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached publisher for `topic`, if one was ever provided.
    pub fn publisher(&self, topic: Topic) -> Option<Arc<MemoryPublisher>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&topic)
            .cloned()
    }
}

impl PublisherProvider for MemoryPublisherProvider {
    fn provide_publisher(&self, topic: Topic) -> Result<Arc<dyn Publisher>, MessagingError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MessagingError::Stopped(topic.to_string()));
        }

        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let publisher = cache
            .entry(topic)
            .or_insert_with(|| Arc::new(MemoryPublisher::new(topic)));

        Ok(Arc::clone(publisher) as Arc<dyn Publisher>)
    }

    fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            for publisher in cache.values() {
                publisher.stop();
            }
        }
    }
}
