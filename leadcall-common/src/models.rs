//! Lead store entities shared between the reconciler and its consumers
//!
//! Field names follow the lead store's JSON (a mix of snake_case and
//! camelCase inherited from the dashboard), hence the per-field renames.

use crate::status::LeadStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lead (contact) record as held by the lead store
///
/// The reconciler never creates or deletes leads; it only proposes
/// [`LeadPatch`] updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact_number: String,
    #[serde(
        rename = "callConnectionStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub call_connection_status: Option<LeadStatus>,
}

/// Summary of the call that produced a status change, stored on the lead for
/// display (recording player, transcript view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastCallData {
    pub call_id: String,
    /// Connected duration in seconds
    pub duration: f64,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub ended_reason: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Partial update sent to the lead store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    pub call_connection_status: LeadStatus,
    pub last_call_data: LastCallData,
}
