//! Lead store client
//!
//! # API Reference
//! - `GET {base_url}/leads` -> `{success, data: [Lead]}` (bare array accepted)
//! - `PATCH {base_url}/leads/{id}` with a [`LeadPatch`] body -> `{success}`
//!   (an empty 2xx body counts as success)
//! - Optional `Authorization: Bearer <token>`

use super::{build_http_client, ensure_success, join_url, parse_base_url};
use crate::collaborators::{CollaboratorError, LeadStore};
use async_trait::async_trait;
use leadcall_common::models::{Lead, LeadPatch};
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct HttpLeadStore {
    http_client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpLeadStore {
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: parse_base_url(base_url)?,
            api_token,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LeadListResponse {
    Bare(Vec<Lead>),
    Envelope {
        success: bool,
        #[serde(default)]
        data: Vec<Lead>,
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[async_trait]
impl LeadStore for HttpLeadStore {
    fn name(&self) -> &'static str {
        "lead-api"
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CollaboratorError> {
        let url = join_url(&self.base_url, &["leads"])?;
        let response = self.authorize(self.http_client.get(url)).send().await?;
        let response = ensure_success(response).await?;

        let body: LeadListResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Parse(format!("Lead list: {}", e)))?;

        match body {
            LeadListResponse::Bare(leads) => Ok(leads),
            LeadListResponse::Envelope { success: true, data, .. } => {
                debug!(count = data.len(), "Fetched leads");
                Ok(data)
            }
            LeadListResponse::Envelope { success: false, message, .. } => {
                Err(CollaboratorError::Rejected(
                    message.unwrap_or_else(|| "lead list reported success=false".to_string()),
                ))
            }
        }
    }

    async fn update_lead(&self, lead_id: &str, patch: &LeadPatch) -> Result<(), CollaboratorError> {
        let url = join_url(&self.base_url, &["leads", lead_id])?;
        debug!(lead_id, status = %patch.call_connection_status, "Updating lead");

        let response = self
            .authorize(self.http_client.patch(url).json(patch))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }

        let body: UpdateResponse = serde_json::from_slice(&bytes)
            .map_err(|e| CollaboratorError::Parse(format!("Lead update: {}", e)))?;
        if body.success {
            Ok(())
        } else {
            Err(CollaboratorError::Rejected(
                body.message
                    .unwrap_or_else(|| format!("update of lead {} reported success=false", lead_id)),
            ))
        }
    }
}
