//! HTTP implementations of the collaborator traits
//!
//! - [`vapi::VapiCallSource`]: voice-call provider REST API
//! - [`lead_api::HttpLeadStore`]: dashboard lead store REST API

pub mod lead_api;
pub mod vapi;

pub use lead_api::HttpLeadStore;
pub use vapi::VapiCallSource;

use crate::collaborators::CollaboratorError;
use reqwest::{Client, Response, Url};
use std::time::Duration;

/// Build a reqwest client with the per-request timeout
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, CollaboratorError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("leadcall-sync/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CollaboratorError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Append path segments to a base URL, percent-encoding each one
pub(crate) fn join_url(base: &Url, segments: &[&str]) -> Result<Url, CollaboratorError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CollaboratorError::Network(format!("Base URL cannot be a base: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, CollaboratorError> {
    Url::parse(raw.trim()).map_err(|e| CollaboratorError::Network(format!("Invalid base URL {}: {}", raw, e)))
}

/// Turn a non-2xx response into [`CollaboratorError::Api`]
pub(crate) async fn ensure_success(response: Response) -> Result<Response, CollaboratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CollaboratorError::Api {
        status: status.as_u16(),
        body,
    })
}
