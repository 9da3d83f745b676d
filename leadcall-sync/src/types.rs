//! Call observations as the reconciler sees them

use chrono::{DateTime, Utc};
use leadcall_common::models::LastCallData;
use leadcall_common::{resolve_status, CallStatus, EndedReason, LeadStatus};
use serde::{Deserialize, Serialize};

/// One provider call, as returned by a [`crate::collaborators::CallSource`]
///
/// Ephemeral: fetched each tick and dropped after processing; only its
/// [`ProcessedEventKey`] is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    pub status: CallStatus,
    pub ended_reason: Option<EndedReason>,
    /// Connected duration; 0 if the call never connected
    pub duration_seconds: f64,
    /// Dialed number, loosely formatted
    pub phone_number: String,
    pub recording_url: Option<String>,
    pub transcript: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl CallRecord {
    /// Minimal record; display metadata left empty
    pub fn new(
        id: impl Into<String>,
        status: CallStatus,
        ended_reason: Option<EndedReason>,
        duration_seconds: f64,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            ended_reason,
            duration_seconds,
            phone_number: phone_number.into(),
            recording_url: None,
            transcript: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn lead_status(&self) -> LeadStatus {
        resolve_status(&self.status, self.ended_reason.as_ref(), self.duration_seconds)
    }

    pub fn event_key(&self) -> ProcessedEventKey {
        ProcessedEventKey::from_record(self)
    }

    /// Summary attached to the lead update
    pub fn last_call_data(&self) -> LastCallData {
        LastCallData {
            call_id: self.id.clone(),
            duration: self.duration_seconds.max(0.0),
            recording_url: self.recording_url.clone(),
            transcript: self.transcript.clone(),
            ended_reason: self.ended_reason.as_ref().map(|r| r.as_str().to_string()),
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

/// Identity of one observed call state
///
/// The same call is reported on many consecutive polls; a new key appears
/// only when its status or duration moves. Duration is kept in whole
/// milliseconds so the key is hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessedEventKey {
    pub call_id: String,
    pub status: CallStatus,
    pub duration_ms: u64,
}

impl ProcessedEventKey {
    pub fn from_record(record: &CallRecord) -> Self {
        let duration_ms = if record.duration_seconds.is_finite() && record.duration_seconds > 0.0 {
            (record.duration_seconds * 1000.0).round() as u64
        } else {
            0
        };
        Self {
            call_id: record.id.clone(),
            status: record.status.clone(),
            duration_ms,
        }
    }
}

impl std::fmt::Display for ProcessedEventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}ms", self.call_id, self.status, self.duration_ms)
    }
}
