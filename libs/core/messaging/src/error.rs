//! Messaging error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    /// Redis connection or command error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The publisher was stopped; further publishes are rejected.
    #[error("Publisher for topic '{0}' is stopped")]
    Stopped(String),

    /// The publisher's enqueue buffer is full.
    #[error("Publish queue for topic '{0}' is full")]
    QueueFull(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        MessagingError::Serialization(err.to_string())
    }
}
