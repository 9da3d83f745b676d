//! # Leadcall Common Library
//!
//! Shared code for the leadcall reconciliation service including:
//! - Canonical lead status and the call-status resolver
//! - Phone number normalization, formatting and validation
//! - Event types (LeadcallEvent enum) and the EventBus
//! - Configuration loading
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod phone;
pub mod sse;
pub mod status;

pub use error::{Error, Result};
pub use status::{resolve_status, CallStatus, EndedReason, LeadStatus};
