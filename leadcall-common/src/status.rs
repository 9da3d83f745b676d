//! Canonical lead status and the provider call-status resolver
//!
//! The voice-call provider reports a call through three loosely related fields:
//! a lifecycle `status`, an optional `endedReason` and the connected duration.
//! [`resolve_status`] folds them into the four-valued [`LeadStatus`] shown on
//! lead records.
//!
//! The resolver is total: every combination of known or unknown provider
//! values yields exactly one status and nothing here can fail.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Calls shorter than this (seconds) are treated as unanswered when the
/// provider gives no better reason.
pub const SHORT_CALL_THRESHOLD_SECS: f64 = 5.0;

/// Canonical lead call status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    /// Call placed but not yet picked up
    Pending,
    /// Call is live
    Connected,
    /// Genuine conversation took place
    Completed,
    /// Contact attempt did not reach the lead
    Failed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Connected => "connected",
            LeadStatus::Completed => "completed",
            LeadStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider call lifecycle status
///
/// Serialized as the provider's kebab-case string. Values the provider adds
/// later deserialize into [`CallStatus::Other`] instead of failing the whole
/// poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallStatus {
    Initiated,
    Queued,
    Ringing,
    InProgress,
    Forwarding,
    Completed,
    Ended,
    Failed,
    NoAnswer,
    Busy,
    Other(String),
}

impl CallStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::Initiated => "initiated",
            CallStatus::Queued => "queued",
            CallStatus::Ringing => "ringing",
            CallStatus::InProgress => "in-progress",
            CallStatus::Forwarding => "forwarding",
            CallStatus::Completed => "completed",
            CallStatus::Ended => "ended",
            CallStatus::Failed => "failed",
            CallStatus::NoAnswer => "no-answer",
            CallStatus::Busy => "busy",
            CallStatus::Other(s) => s,
        }
    }

    /// Whether the provider considers the call finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallStatus::Completed
                | CallStatus::Ended
                | CallStatus::Failed
                | CallStatus::NoAnswer
                | CallStatus::Busy
        )
    }
}

/// Exact wire match; any other spelling is kept as [`CallStatus::Other`]
impl From<&str> for CallStatus {
    fn from(value: &str) -> Self {
        match value {
            "initiated" => CallStatus::Initiated,
            "queued" => CallStatus::Queued,
            "ringing" => CallStatus::Ringing,
            "in-progress" => CallStatus::InProgress,
            "forwarding" => CallStatus::Forwarding,
            "completed" => CallStatus::Completed,
            "ended" => CallStatus::Ended,
            "failed" => CallStatus::Failed,
            "no-answer" => CallStatus::NoAnswer,
            "busy" => CallStatus::Busy,
            _ => CallStatus::Other(value.to_string()),
        }
    }
}

impl From<String> for CallStatus {
    fn from(value: String) -> Self {
        CallStatus::from(value.as_str())
    }
}

impl From<CallStatus> for String {
    fn from(value: CallStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider's reason for a terminal call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EndedReason {
    AssistantEndedCall,
    CustomerEndedCall,
    AssistantForwardedCall,
    CustomerDidNotAnswer,
    CustomerBusy,
    AssistantDidNotRespond,
    AssistantNotAvailable,
    CallCancelled,
    Voicemail,
    Unknown,
    Other(String),
}

impl EndedReason {
    pub fn as_str(&self) -> &str {
        match self {
            EndedReason::AssistantEndedCall => "assistant-ended-call",
            EndedReason::CustomerEndedCall => "customer-ended-call",
            EndedReason::AssistantForwardedCall => "assistant-forwarded-call",
            EndedReason::CustomerDidNotAnswer => "customer-did-not-answer",
            EndedReason::CustomerBusy => "customer-busy",
            EndedReason::AssistantDidNotRespond => "assistant-did-not-respond",
            EndedReason::AssistantNotAvailable => "assistant-not-available",
            EndedReason::CallCancelled => "call-cancelled",
            EndedReason::Voicemail => "voicemail",
            EndedReason::Unknown => "unknown",
            EndedReason::Other(s) => s,
        }
    }

    /// Outcome table for terminal calls with a known reason
    ///
    /// Reasons outside the table count as failed.
    pub fn outcome(&self) -> LeadStatus {
        match self {
            EndedReason::AssistantEndedCall
            | EndedReason::CustomerEndedCall
            | EndedReason::AssistantForwardedCall
            | EndedReason::Voicemail => LeadStatus::Completed,
            EndedReason::CustomerDidNotAnswer
            | EndedReason::CustomerBusy
            | EndedReason::AssistantDidNotRespond
            | EndedReason::AssistantNotAvailable
            | EndedReason::CallCancelled
            | EndedReason::Unknown
            | EndedReason::Other(_) => LeadStatus::Failed,
        }
    }

    /// Parse an optional wire value; empty strings count as absent
    pub fn parse_optional(value: Option<&str>) -> Option<Self> {
        value
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(EndedReason::from)
    }
}

impl From<&str> for EndedReason {
    fn from(value: &str) -> Self {
        match value {
            "assistant-ended-call" => EndedReason::AssistantEndedCall,
            "customer-ended-call" => EndedReason::CustomerEndedCall,
            "assistant-forwarded-call" => EndedReason::AssistantForwardedCall,
            "customer-did-not-answer" => EndedReason::CustomerDidNotAnswer,
            "customer-busy" => EndedReason::CustomerBusy,
            "assistant-did-not-respond" => EndedReason::AssistantDidNotRespond,
            "assistant-not-available" => EndedReason::AssistantNotAvailable,
            "call-cancelled" => EndedReason::CallCancelled,
            "voicemail" => EndedReason::Voicemail,
            "unknown" => EndedReason::Unknown,
            _ => EndedReason::Other(value.to_string()),
        }
    }
}

impl From<String> for EndedReason {
    fn from(value: String) -> Self {
        EndedReason::from(value.as_str())
    }
}

impl From<EndedReason> for String {
    fn from(value: EndedReason) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EndedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the canonical lead status for one provider call observation
///
/// Non-terminal statuses map directly. `completed`/`ended` need the duration
/// and end reason, because the provider marks unanswered and busy calls
/// terminal too:
/// 1. shorter than [`SHORT_CALL_THRESHOLD_SECS`] with no reason, or with a
///    no-answer/busy reason, is a failed attempt
/// 2. no reason: completed only if strictly longer than the threshold
/// 3. otherwise the reason's [`EndedReason::outcome`]
///
/// Statuses the provider invents later resolve to `pending`. A negative or
/// NaN duration is treated as zero.
pub fn resolve_status(
    status: &CallStatus,
    ended_reason: Option<&EndedReason>,
    duration_seconds: f64,
) -> LeadStatus {
    let duration = if duration_seconds.is_nan() {
        0.0
    } else {
        duration_seconds.max(0.0)
    };

    match status {
        CallStatus::Initiated | CallStatus::Queued | CallStatus::Ringing => LeadStatus::Pending,
        CallStatus::InProgress | CallStatus::Forwarding => LeadStatus::Connected,
        CallStatus::Failed | CallStatus::NoAnswer | CallStatus::Busy => LeadStatus::Failed,
        CallStatus::Completed | CallStatus::Ended => {
            let short = duration < SHORT_CALL_THRESHOLD_SECS;
            match ended_reason {
                None if short => LeadStatus::Failed,
                Some(EndedReason::CustomerDidNotAnswer | EndedReason::CustomerBusy) if short => {
                    LeadStatus::Failed
                }
                None if duration > SHORT_CALL_THRESHOLD_SECS => LeadStatus::Completed,
                None => LeadStatus::Failed,
                Some(reason) => reason.outcome(),
            }
        }
        CallStatus::Other(_) => LeadStatus::Pending,
    }
}
