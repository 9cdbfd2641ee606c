//! Bridges the data-changes stream to the in-process broadcaster.
//!
//! The relay tails the Redis stream with `XREAD BLOCK`, decodes each entry
//! into a [`DataChangeMessage`], and hands it to the [`EventBroadcaster`].
//! A message that fails to decode is logged and skipped; one bad message
//! never closes anyone's stream.

use crate::{broadcast::EventBroadcaster, event::DataChangeMessage, topics::Topic};
use redis::aio::ConnectionManager;
use redis::RedisResult;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const BLOCK_TIMEOUT_MS: u64 = 5_000;
const READ_COUNT: usize = 128;

/// Long-running consumer that fans incoming data changes out to SSE
/// subscribers.
pub struct ChangeEventRelay {
    redis: ConnectionManager,
    broadcaster: Arc<EventBroadcaster>,
}

impl ChangeEventRelay {
    pub fn new(redis: ConnectionManager, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { redis, broadcaster }
    }

    /// Tail the stream until `shutdown` fires.
    ///
    /// New entries only: the relay starts at the stream tail, so events
    /// published before boot are not replayed.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let stream = Topic::DataChanges.stream_name();
        let mut last_id = "$".to_string();
        info!(stream = %stream, "Change-event relay started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!(stream = %stream, "Change-event relay shutting down");
                    break;
                }
                result = read_entries(&mut self.redis, &stream, &last_id) => {
                    match result {
                        Ok(entries) => {
                            for (stream_id, body) in entries {
                                last_id = stream_id.clone();
                                match serde_json::from_str::<DataChangeMessage>(&body) {
                                    Ok(message) => self.broadcaster.broadcast(message).await,
                                    Err(e) => {
                                        warn!(stream_id = %stream_id, error = %e, "Failed to decode data change, skipping");
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            error!(error = %e, stream = %stream, "Stream read failed, backing off");
                            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }
    }
}

/// One blocking XREAD; returns `(stream_id, message body)` pairs.
async fn read_entries(
    conn: &mut ConnectionManager,
    stream: &str,
    last_id: &str,
) -> RedisResult<Vec<(String, String)>> {
    type StreamReply = Vec<(String, Vec<(String, Vec<(String, String)>)>)>;

    let reply: Option<StreamReply> = redis::cmd("XREAD")
        .arg("COUNT")
        .arg(READ_COUNT)
        .arg("BLOCK")
        .arg(BLOCK_TIMEOUT_MS)
        .arg("STREAMS")
        .arg(stream)
        .arg(last_id)
        .query_async(conn)
        .await?;

    let mut entries = Vec::new();
    let Some(streams) = reply else {
        // Blocking timeout, nothing new.
        return Ok(entries);
    };

    for (_stream_name, stream_entries) in streams {
        for (stream_id, fields) in stream_entries {
            let body = fields
                .iter()
                .find(|(key, _)| key == "message")
                .map(|(_, value)| value.clone());

            match body {
                Some(body) => entries.push((stream_id, body)),
                None => {
                    debug!(stream_id = %stream_id, "Entry without 'message' field, skipping");
                    entries.push((stream_id, String::new()));
                }
            }
        }
    }

    Ok(entries)
}
