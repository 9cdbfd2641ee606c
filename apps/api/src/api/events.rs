//! Server-sent events: the caller's data-change feed.

use crate::state::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum_helpers::SessionContext;
use std::convert::Infallible;
use tokio_stream::{Stream, StreamExt};

/// Long-lived `text/event-stream` of the authenticated user's events.
///
/// Events published while nobody is subscribed are discarded, not
/// replayed; the stream starts at subscription time.
pub async fn data_changes(
    State(state): State<AppState>,
    session: SessionContext,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.broadcaster.subscribe(session.user_id).await;
    tracing::info!(user_id = %session.user_id, "SSE subscription opened");

    let stream = subscription.map(|message| {
        let event = Event::default().event("data_change");
        match event.json_data(&message) {
            Ok(event) => Ok(event),
            Err(error) => {
                tracing::error!(%error, "Failed to encode SSE event, sending comment instead");
                Ok(Event::default().comment("undeliverable event"))
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
