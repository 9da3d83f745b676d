//! leadcall-sync library interface
//!
//! Keeps lead call statuses in step with the voice-call provider. Exposes the
//! reconciliation poller, its collaborator seams and the HTTP surface for
//! integration testing.

pub mod api;
pub mod clients;
pub mod collaborators;
pub mod error;
pub mod reconciler;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use leadcall_common::events::EventBus;
use reconciler::Poller;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when the reconciler is disabled by configuration
    pub poller: Option<Arc<Poller>>,
    /// Event bus feeding the SSE stream
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(poller: Option<Arc<Poller>>, event_bus: EventBus) -> Self {
        Self {
            poller,
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::health_routes())
        .merge(api::reconciler_routes())
        .merge(api::phone_routes())
        .route("/events", get(api::event_stream))
        .with_state(state)
}
