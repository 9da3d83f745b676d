//! Event types for the leadcall event system
//!
//! Provides the shared event definitions and the EventBus the reconciler
//! publishes to. Dashboards subscribe (directly or over SSE) to refresh lead
//! rows when a status is resolved.

use crate::models::LastCallData;
use crate::status::LeadStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Leadcall event types
///
/// Serialized with an internal `type` tag for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LeadcallEvent {
    /// A lead's call status was updated from a provider call
    ///
    /// Triggers:
    /// - Dashboard: refresh the lead row and last-call panel
    LeadStatusResolved {
        lead_id: String,
        status: LeadStatus,
        call: LastCallData,
        timestamp: DateTime<Utc>,
    },

    /// A call matched more than one lead after phone normalization and was
    /// not applied
    ///
    /// Triggers:
    /// - Operator alert: duplicate contact numbers need cleanup
    LeadMatchAmbiguous {
        call_id: String,
        phone_number: String,
        candidate_lead_ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Lead store rejected or timed out on a status update
    LeadUpdateFailed {
        lead_id: String,
        call_id: String,
        error: String,
        /// Whether the call will be offered again on the next tick
        will_retry: bool,
        timestamp: DateTime<Utc>,
    },

    /// Recent calls could not be fetched; the tick was skipped
    ReconcileFetchFailed {
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// One reconciliation tick finished
    ReconcileTickCompleted {
        fetched: usize,
        /// Records not seen before this tick
        processed: usize,
        updated: usize,
        timestamp: DateTime<Utc>,
    },
}

impl LeadcallEvent {
    /// Get event type as string for filtering and SSE event names
    pub fn event_type(&self) -> &'static str {
        match self {
            LeadcallEvent::LeadStatusResolved { .. } => "LeadStatusResolved",
            LeadcallEvent::LeadMatchAmbiguous { .. } => "LeadMatchAmbiguous",
            LeadcallEvent::LeadUpdateFailed { .. } => "LeadUpdateFailed",
            LeadcallEvent::ReconcileFetchFailed { .. } => "ReconcileFetchFailed",
            LeadcallEvent::ReconcileTickCompleted { .. } => "ReconcileTickCompleted",
        }
    }
}

/// Central event distribution bus
///
/// Wraps `tokio::broadcast`: every subscriber sees every event emitted after
/// it subscribed; slow subscribers lose the oldest events once the channel
/// capacity is exceeded. Cloning shares the same channel.
///
/// # Examples
///
/// ```
/// use leadcall_common::events::EventBus;
///
/// let bus = EventBus::new(100);
/// let rx = bus.subscribe();
/// assert_eq!(bus.subscriber_count(), 1);
/// # drop(rx);
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LeadcallEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer per subscriber before the
    ///   oldest are dropped
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<LeadcallEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// The reconciler runs headless most of the time; events without an
    /// audience are simply discarded.
    pub fn emit_lossy(&self, event: LeadcallEvent) {
        let _ = self.tx.send(event);
    }

    /// Live receivers, including SSE clients
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
