//! Server-Sent Events stream of reconciler events

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
///
/// Streams `ConnectionStatus` once, then every event on the bus
/// (`LeadStatusResolved`, `LeadMatchAmbiguous`, ...) as JSON.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    leadcall_common::sse::create_event_sse_stream("leadcall-sync", &state.event_bus)
}
