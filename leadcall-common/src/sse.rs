//! Server-Sent Events (SSE) utilities
//!
//! Bridges the [`EventBus`] to dashboard clients.

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Heartbeat interval for idle SSE connections
pub const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Stream every bus event to one SSE client
///
/// Sends a `ConnectionStatus` event first, then each [`crate::events::LeadcallEvent`]
/// as JSON with the SSE event name set to its `type`. A client that falls
/// behind the bus capacity skips the lost events and keeps streaming.
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(state): State<AppState>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     leadcall_common::sse::create_event_sse_stream("leadcall-sync", &state.event_bus)
/// }
/// ```
pub fn create_event_sse_stream(
    service_name: &'static str,
    event_bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = event_bus.subscribe();
    info!(
        "New SSE client connected to {} events ({} listeners)",
        service_name,
        event_bus.subscriber_count()
    );

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let name = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            debug!(event = name, "SSE: forwarding event");
                            yield Ok(Event::default().event(name).data(json));
                        }
                        Err(e) => warn!("SSE: failed to serialize {} event: {}", name, e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: {} client lagged, skipped {} events", service_name, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE)
            .text("heartbeat"),
    )
}
