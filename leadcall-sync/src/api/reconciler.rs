//! Reconciler status and manual trigger

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::reconciler::{Poller, ReconcilerStats, TickReport};
use crate::AppState;

fn poller(state: &AppState) -> ApiResult<&Arc<Poller>> {
    state
        .poller
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("reconciler is disabled".to_string()))
}

/// GET /api/reconciler/status
pub async fn reconciler_status(State(state): State<AppState>) -> ApiResult<Json<ReconcilerStats>> {
    Ok(Json(poller(&state)?.stats().await))
}

/// POST /api/reconciler/tick
///
/// Runs one pass immediately. Waits for a scheduled tick in progress.
pub async fn trigger_tick(State(state): State<AppState>) -> ApiResult<Json<TickReport>> {
    let poller = poller(&state)?;
    info!("Manual reconcile tick requested");
    Ok(Json(poller.tick().await))
}

pub fn reconciler_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reconciler/status", get(reconciler_status))
        .route("/api/reconciler/tick", post(trigger_tick))
}
