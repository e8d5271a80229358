//! Server-sent event stream of resource-changed notifications.

use crate::state::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

/// GET /ims/api/eventsource — long-lived SSE stream.
///
/// Open to unauthenticated clients: payloads carry only entity coordinates,
/// and reading the entities themselves still requires a token. Every
/// connection first receives an `InitialEvent` carrying the current event
/// id, so clients can tell whether they missed anything since their
/// `Last-Event-ID`.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let (initial, mut receiver) = state.bus.subscribe();
    let stream = async_stream::stream! {
        yield Ok(sse_event(&initial));
        loop {
            match receiver.recv().await {
                Ok(event) => yield Ok(sse_event(&event)),
                Err(RecvError::Lagged(missed)) => {
                    // The client reconnects and resyncs from Last-Event-ID.
                    debug!(missed, "subscriber lagged, closing stream");
                    break;
                }
                Err(RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn sse_event(event: &crate::bus::BusEvent) -> Event {
    Event::default()
        .id(event.id.to_string())
        .event(event.kind)
        .data(event.data.to_string())
}
