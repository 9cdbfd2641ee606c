//! Data-change event fabric.
//!
//! Everything between a successful entity write and the consumers that care
//! about it: the typed event model, per-topic Redis stream publishers with a
//! cached provider, and the per-user SSE fan-out fed by a stream relay.

pub mod broadcast;
pub mod error;
pub mod event;
pub mod provider;
pub mod publisher;
pub mod relay;
pub mod topics;

pub use broadcast::{EventBroadcaster, Subscription, SubscriptionState};
pub use error::MessagingError;
pub use event::{DataChangeMessage, ServiceEventType};
pub use provider::{MemoryPublisherProvider, PublisherProvider, StreamPublisherProvider};
pub use publisher::{MemoryPublisher, Publisher, PublisherExt, StreamPublisher};
pub use relay::ChangeEventRelay;
pub use topics::Topic;

#[cfg(test)]
pub use publisher::MockPublisher;
