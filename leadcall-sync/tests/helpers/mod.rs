//! In-memory collaborators for reconciler tests

#![allow(dead_code)]

use async_trait::async_trait;
use leadcall_common::models::{Lead, LeadPatch};
use leadcall_common::{CallStatus, EndedReason};
use leadcall_sync::collaborators::{CallSource, CollaboratorError, LeadStore};
use leadcall_sync::types::CallRecord;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted call feed: each fetch pops the next response; once the script is
/// exhausted the last response repeats.
pub struct ScriptedCalls {
    script: Mutex<VecDeque<Result<Vec<CallRecord>, String>>>,
    last: Mutex<Result<Vec<CallRecord>, String>>,
    pub fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub delay: Option<Duration>,
}

impl ScriptedCalls {
    pub fn new(script: Vec<Result<Vec<CallRecord>, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(Ok(Vec::new())),
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Same feed on every fetch
    pub fn repeating(records: Vec<CallRecord>) -> Self {
        Self::new(vec![Ok(records)])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Highest number of fetches ever running at once
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallSource for ScriptedCalls {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn recent_calls(&self, limit: usize) -> Result<Vec<CallRecord>, CollaboratorError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = script.pop_front() {
                *last = next.clone();
            }
            last.clone()
        };
        next.map(|mut records| {
            records.truncate(limit);
            records
        })
        .map_err(CollaboratorError::Network)
    }
}

/// Lead store recording every update; individual leads can be made to fail
pub struct RecordingLeads {
    pub leads: Mutex<Vec<Lead>>,
    pub updates: Mutex<Vec<(String, LeadPatch)>>,
    failing: Mutex<Vec<String>>,
    pub list_error: Mutex<Option<String>>,
}

impl RecordingLeads {
    pub fn new(leads: Vec<Lead>) -> Self {
        Self {
            leads: Mutex::new(leads),
            updates: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
            list_error: Mutex::new(None),
        }
    }

    pub fn fail_updates_for(&self, lead_id: &str) {
        self.failing.lock().unwrap().push(lead_id.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn updates(&self) -> Vec<(String, LeadPatch)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn status_of(&self, lead_id: &str) -> Option<leadcall_common::LeadStatus> {
        self.leads
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == lead_id)
            .and_then(|l| l.call_connection_status)
    }
}

#[async_trait]
impl LeadStore for RecordingLeads {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CollaboratorError> {
        if let Some(error) = self.list_error.lock().unwrap().clone() {
            return Err(CollaboratorError::Network(error));
        }
        Ok(self.leads.lock().unwrap().clone())
    }

    async fn update_lead(&self, lead_id: &str, patch: &LeadPatch) -> Result<(), CollaboratorError> {
        if self.failing.lock().unwrap().iter().any(|id| id == lead_id) {
            return Err(CollaboratorError::Api {
                status: 500,
                body: "lead store down".to_string(),
            });
        }
        self.updates
            .lock()
            .unwrap()
            .push((lead_id.to_string(), patch.clone()));
        if let Some(lead) = self.leads.lock().unwrap().iter_mut().find(|l| l.id == lead_id) {
            lead.call_connection_status = Some(patch.call_connection_status);
        }
        Ok(())
    }
}

pub fn lead(id: &str, number: &str) -> Lead {
    Lead {
        id: id.to_string(),
        name: None,
        contact_number: number.to_string(),
        call_connection_status: None,
    }
}

pub fn call(id: &str, status: &str, reason: Option<&str>, duration: f64, phone: &str) -> CallRecord {
    CallRecord::new(
        id,
        CallStatus::from(status),
        EndedReason::parse_optional(reason),
        duration,
        phone,
    )
}
