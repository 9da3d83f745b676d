//! Voice-call provider client
//!
//! Lists recent calls from the provider's REST API and converts them to
//! [`CallRecord`]s.
//!
//! # API Reference
//! - Endpoint: `GET {base_url}/call?limit=N`
//! - Auth: `Authorization: Bearer <private key>`
//! - Response: JSON array of call objects, newest first. A `{success, data}`
//!   envelope (as produced by the dashboard's own proxy) is accepted too.

use super::{build_http_client, ensure_success, join_url, parse_base_url};
use crate::collaborators::{CallSource, CollaboratorError};
use crate::types::CallRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadcall_common::{CallStatus, EndedReason};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Provider call-list client
pub struct VapiCallSource {
    http_client: Client,
    base_url: Url,
    api_key: String,
}

impl VapiCallSource {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, CollaboratorError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: parse_base_url(base_url)?,
            api_key,
        })
    }
}

#[async_trait]
impl CallSource for VapiCallSource {
    fn name(&self) -> &'static str {
        "vapi"
    }

    async fn recent_calls(&self, limit: usize) -> Result<Vec<CallRecord>, CollaboratorError> {
        let url = join_url(&self.base_url, &["call"])?;
        debug!(url = %url, limit, "Fetching recent calls");

        let response = self
            .http_client
            .get(url)
            .query(&[("limit", limit)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: CallListResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Parse(format!("Call list: {}", e)))?;

        let calls = match body {
            CallListResponse::Bare(calls) => calls,
            CallListResponse::Envelope { success: true, data, .. } => data,
            CallListResponse::Envelope { success: false, message, .. } => {
                return Err(CollaboratorError::Rejected(
                    message.unwrap_or_else(|| "call list reported success=false".to_string()),
                ));
            }
        };

        let records: Vec<CallRecord> = calls.into_iter().map(CallRecord::from).collect();
        debug!(count = records.len(), "Fetched recent calls");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CallListResponse {
    Bare(Vec<ProviderCall>),
    Envelope {
        success: bool,
        #[serde(default)]
        data: Vec<ProviderCall>,
        #[serde(default)]
        message: Option<String>,
    },
}

/// Call object as the provider serializes it
///
/// Only the fields the reconciler reads; everything else is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderCall {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    ended_reason: Option<String>,
    #[serde(default)]
    duration_seconds: Option<f64>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    customer: Option<ProviderCustomer>,
    /// Plain string in proxy envelopes; an object describing the outbound
    /// line in the provider's own payload
    #[serde(default)]
    phone_number: Option<serde_json::Value>,
    #[serde(default)]
    recording_url: Option<String>,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    artifact: Option<ProviderArtifact>,
}

#[derive(Debug, Deserialize)]
struct ProviderCustomer {
    #[serde(default)]
    number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderArtifact {
    #[serde(default)]
    recording_url: Option<String>,
    #[serde(default)]
    transcript: Option<String>,
}

impl ProviderCall {
    /// Reported duration, else the span between start and end, else 0
    fn duration_seconds(&self) -> f64 {
        if let Some(secs) = self.duration_seconds {
            return secs.max(0.0);
        }
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) if end > start => {
                (end - start).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        }
    }

    fn dialed_number(&self) -> String {
        if let Some(number) = self.customer.as_ref().and_then(|c| c.number.clone()) {
            return number;
        }
        match &self.phone_number {
            Some(serde_json::Value::String(number)) => number.clone(),
            _ => String::new(),
        }
    }
}

impl From<ProviderCall> for CallRecord {
    fn from(call: ProviderCall) -> Self {
        let duration_seconds = call.duration_seconds();
        let phone_number = call.dialed_number();
        let (artifact_recording, artifact_transcript) = match call.artifact {
            Some(artifact) => (artifact.recording_url, artifact.transcript),
            None => (None, None),
        };

        CallRecord {
            id: call.id,
            status: CallStatus::from(call.status.unwrap_or_default()),
            ended_reason: EndedReason::parse_optional(call.ended_reason.as_deref()),
            duration_seconds,
            phone_number,
            recording_url: call.recording_url.or(artifact_recording),
            transcript: call.transcript.or(artifact_transcript),
            started_at: call.started_at,
            ended_at: call.ended_at,
        }
    }
}
