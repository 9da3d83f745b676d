//! Seams to the two external systems the reconciler talks to
//!
//! The call provider and the lead store are opaque collaborators. HTTP
//! implementations live in [`crate::clients`]; tests substitute in-memory
//! ones.

use crate::types::CallRecord;
use async_trait::async_trait;
use leadcall_common::models::{Lead, LeadPatch};
use thiserror::Error;

/// Failure talking to a collaborator
///
/// Every variant is recoverable from the reconciler's point of view: a failed
/// fetch skips the tick, a failed update skips the record.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Connection, DNS or TLS failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its time budget
    #[error("Request timed out")]
    Timeout,

    /// Non-success HTTP status
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// 2xx response whose envelope reported `success: false`
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CollaboratorError::Timeout
        } else if err.is_decode() {
            CollaboratorError::Parse(err.to_string())
        } else {
            CollaboratorError::Network(err.to_string())
        }
    }
}

/// Voice-call provider query interface
#[async_trait]
pub trait CallSource: Send + Sync {
    /// Collaborator name for logs
    fn name(&self) -> &'static str;

    /// The `limit` most recent calls, newest first as the provider orders them
    async fn recent_calls(&self, limit: usize) -> Result<Vec<CallRecord>, CollaboratorError>;
}

/// Lead store interface
#[async_trait]
pub trait LeadStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Current lead set used for phone matching
    async fn list_leads(&self) -> Result<Vec<Lead>, CollaboratorError>;

    async fn update_lead(&self, lead_id: &str, patch: &LeadPatch) -> Result<(), CollaboratorError>;
}
