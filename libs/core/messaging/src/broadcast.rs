//! Per-user fan-out of data-change events.
//!
//! The broadcaster keeps a read-biased map of `user ID → subscriber
//! senders`. Streams are lazy: a user's entry exists only while they hold at
//! least one live subscription, and events for users without one are
//! discarded.

use crate::event::DataChangeMessage;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, RwLock};
use tokio_stream::Stream;
use tracing::{debug, warn};
use uuid::Uuid;

/// Buffered events per subscriber before backpressure drops kick in.
const SUBSCRIBER_BUFFER: usize = 64;

/// Lifecycle of one SSE subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Not yet registered with the broadcaster.
    Idle,
    /// Registered; no event delivered yet.
    Subscribed,
    /// At least one event delivered.
    Active,
    /// Client disconnected, server shut down, or stream errored.
    Closed,
}

/// A live per-user event stream.
///
/// Yields [`DataChangeMessage`]s as they arrive; ends when the broadcaster
/// closes or the subscription is dropped.
pub struct Subscription {
    user_id: Uuid,
    rx: mpsc::Receiver<DataChangeMessage>,
    state: SubscriptionState,
}

impl Subscription {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }
}

impl Stream for Subscription {
    type Item = DataChangeMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(message)) => {
                if self.state == SubscriptionState::Subscribed {
                    self.state = SubscriptionState::Active;
                }
                Poll::Ready(Some(message))
            }
            Poll::Ready(None) => {
                self.state = SubscriptionState::Closed;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Routes data-change events to the users they concern.
#[derive(Default)]
pub struct EventBroadcaster {
    subscribers: RwLock<HashMap<Uuid, Vec<mpsc::Sender<DataChangeMessage>>>>,
}

impl EventBroadcaster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a subscription for `user_id`.
    pub async fn subscribe(&self, user_id: Uuid) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);

        let mut subscribers = self.subscribers.write().await;
        subscribers.entry(user_id).or_default().push(tx);
        debug!(user_id = %user_id, "Subscribed to data changes");

        Subscription {
            user_id,
            rx,
            state: SubscriptionState::Subscribed,
        }
    }

    /// Deliver `message` to the subscribers of its user, if any.
    ///
    /// Events for users without an active stream are discarded. Slow or gone
    /// subscribers are dropped rather than blocking delivery.
    pub async fn broadcast(&self, message: DataChangeMessage) {
        let mut delivered = 0usize;
        let mut needs_prune = false;

        {
            let subscribers = self.subscribers.read().await;
            let Some(senders) = subscribers.get(&message.user_id) else {
                return;
            };

            for sender in senders {
                match sender.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(user_id = %message.user_id, "Subscriber buffer full, dropping event");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        needs_prune = true;
                    }
                }
            }
        }

        if needs_prune {
            let mut subscribers = self.subscribers.write().await;
            if let Some(senders) = subscribers.get_mut(&message.user_id) {
                senders.retain(|sender| !sender.is_closed());
                if senders.is_empty() {
                    subscribers.remove(&message.user_id);
                }
            }
        }

        debug!(
            user_id = %message.user_id,
            event_type = ?message.event_type,
            delivered,
            "Broadcast data change"
        );
    }

    /// Number of users with at least one live subscription.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Close every subscription; their streams end.
    pub async fn close_all(&self) {
        let mut subscribers = self.subscribers.write().await;
        let users = subscribers.len();
        subscribers.clear();
        debug!(users, "Closed all subscriptions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ServiceEventType;
    use tokio_stream::StreamExt;

    fn message_for(user_id: Uuid) -> DataChangeMessage {
        DataChangeMessage::new(ServiceEventType::RecipeCreated, user_id, None, "t")
    }

    #[tokio::test]
    async fn routes_events_to_the_matching_user_only() {
        let broadcaster = EventBroadcaster::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let mut alice_sub = broadcaster.subscribe(alice).await;
        let mut bob_sub = broadcaster.subscribe(bob).await;

        broadcaster.broadcast(message_for(alice)).await;

        let received = alice_sub.next().await.unwrap();
        assert_eq!(received.user_id, alice);
        assert_eq!(alice_sub.state(), SubscriptionState::Active);

        // Bob got nothing; his stream is still open but empty.
        broadcaster.close_all().await;
        assert!(bob_sub.next().await.is_none());
        assert_eq!(bob_sub.state(), SubscriptionState::Closed);
    }

    #[tokio::test]
    async fn events_for_unsubscribed_users_are_discarded() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.broadcast(message_for(Uuid::new_v4())).await;
        assert_eq!(broadcaster.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn dropped_subscriptions_are_pruned() {
        let broadcaster = EventBroadcaster::new();
        let user = Uuid::new_v4();

        let subscription = broadcaster.subscribe(user).await;
        drop(subscription);

        broadcaster.broadcast(message_for(user)).await;
        assert_eq!(broadcaster.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn close_all_ends_streams() {
        let broadcaster = EventBroadcaster::new();
        let mut subscription = broadcaster.subscribe(Uuid::new_v4()).await;

        broadcaster.close_all().await;
        assert!(subscription.next().await.is_none());
    }
}
