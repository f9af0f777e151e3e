//! Server-Sent Events (SSE) stream for real-time updates.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use scenehub_app::ports::{DeviceRepository, EventPublisher, HalClient, SceneRepository};

use crate::state::AppState;

/// `GET /api/events/stream` — SSE stream of real-time bus events.
///
/// Subscribes to the broadcast channel the composition root bridges bus
/// topics into and sends JSON-encoded events as SSE `data:` frames. The
/// stream continues until the client disconnects.
pub async fn stream<SR, DR, H, P>(
    State(state): State<AppState<SR, DR, H, P>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    SR: SceneRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    H: HalClient + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let event_rx = state.events.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event for SSE stream");
                None
            }
        },
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, events were dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
