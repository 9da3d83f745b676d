//! Call-status reconciliation poller
//!
//! Stands in for provider webhooks: on a fixed cadence it lists the most
//! recent calls, skips call states it has already applied, resolves each new
//! state to a [`LeadStatus`] and writes it to the lead whose contact number
//! matches the dialed number.
//!
//! # Scheduling
//! One spawned task per running poller. The pause starts only after the
//! current tick finishes, so ticks never overlap; a manual [`Poller::tick`]
//! call queues behind an in-flight one.
//!
//! # Failure handling
//! Nothing escapes a tick. A failed fetch skips the tick, an unmatched or
//! ambiguous record is skipped, a failed update is logged and the remaining
//! records are still processed. Whether a failed update is retried is the
//! [`DeliveryPolicy`].

pub mod dedup;
pub mod matching;

pub use dedup::{DedupRetention, SeenSet};
pub use matching::{match_lead, MatchOutcome};

use crate::collaborators::{CallSource, CollaboratorError, LeadStore};
use crate::types::CallRecord;
use chrono::{DateTime, Utc};
use leadcall_common::config::{DeliveryPolicy, ReconcilerSettings};
use leadcall_common::events::{EventBus, LeadcallEvent};
use leadcall_common::models::{LastCallData, Lead, LeadPatch};
use leadcall_common::LeadStatus;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Poller tuning
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Pause between the end of one tick and the start of the next
    pub tick_interval: Duration,
    /// Calls requested per tick
    pub recent_call_limit: usize,
    /// Budget for each collaborator call
    pub request_timeout: Duration,
    pub delivery: DeliveryPolicy,
    pub retention: DedupRetention,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            recent_call_limit: 5,
            request_timeout: Duration::from_secs(10),
            delivery: DeliveryPolicy::AtMostOnce,
            retention: DedupRetention::ProcessLifetime,
        }
    }
}

impl From<&ReconcilerSettings> for ReconcilerConfig {
    fn from(settings: &ReconcilerSettings) -> Self {
        Self {
            tick_interval: settings.tick_interval(),
            recent_call_limit: settings.recent_call_limit,
            request_timeout: settings.request_timeout(),
            delivery: settings.delivery,
            retention: DedupRetention::from_max_keys(settings.max_seen_keys),
        }
    }
}

/// Outcome counts for one tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Records returned by the call source
    pub fetched: usize,
    /// Records whose key had not been seen
    pub processed: usize,
    pub duplicates: usize,
    pub updated: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
    pub update_failures: usize,
    /// Set when the tick was skipped because calls or leads could not be read
    pub fetch_error: Option<String>,
}

/// Cumulative poller counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcilerStats {
    pub running: bool,
    pub ticks: u64,
    pub fetch_failures: u64,
    pub updates_applied: u64,
    pub update_failures: u64,
    pub unmatched: u64,
    pub ambiguous: u64,
    pub duplicates_skipped: u64,
    pub seen_keys: usize,
    pub evicted_keys: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Cancels the loop it was returned for
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct RunningLoop {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct PollerInner {
    config: ReconcilerConfig,
    calls: Arc<dyn CallSource>,
    leads: Arc<dyn LeadStore>,
    event_bus: EventBus,
    seen: Mutex<SeenSet>,
    stats: RwLock<ReconcilerStats>,
    /// Held for the whole tick so scheduled and manual ticks serialize
    tick_lock: Mutex<()>,
}

/// Owned reconciliation poller
///
/// Independent instances share nothing. Dropping the poller cancels its loop.
pub struct Poller {
    inner: Arc<PollerInner>,
    running: StdMutex<Option<RunningLoop>>,
}

impl Poller {
    pub fn new(
        config: ReconcilerConfig,
        calls: Arc<dyn CallSource>,
        leads: Arc<dyn LeadStore>,
        event_bus: EventBus,
    ) -> Self {
        let seen = SeenSet::new(config.retention);
        Self {
            inner: Arc::new(PollerInner {
                config,
                calls,
                leads,
                event_bus,
                seen: Mutex::new(seen),
                stats: RwLock::new(ReconcilerStats::default()),
                tick_lock: Mutex::new(()),
            }),
            running: StdMutex::new(None),
        }
    }

    /// Start the recurring tick (must be called inside a tokio runtime)
    ///
    /// The first tick runs immediately. Calling `start` while already running
    /// returns a handle to the existing loop and spawns nothing.
    pub fn start(&self) -> CancelHandle {
        let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(existing) = running.as_ref() {
            if !existing.token.is_cancelled() && !existing.handle.is_finished() {
                debug!("Reconciler already running");
                return CancelHandle {
                    token: existing.token.clone(),
                };
            }
        }

        let token = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let loop_token = token.clone();
        let handle = tokio::spawn(async move { inner.run(loop_token).await });

        info!(
            interval_ms = self.inner.config.tick_interval.as_millis() as u64,
            limit = self.inner.config.recent_call_limit,
            delivery = ?self.inner.config.delivery,
            "Reconciler started"
        );

        *running = Some(RunningLoop {
            token: token.clone(),
            handle,
        });
        CancelHandle { token }
    }

    /// Stop the recurring tick
    ///
    /// No tick starts after this returns. A tick already in progress runs to
    /// completion in the background. No-op when not running.
    pub fn stop(&self) {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(running) = taken {
            running.token.cancel();
            info!("Reconciler stopped");
        }
    }

    /// [`Poller::stop`], then wait for an in-progress tick to finish
    pub async fn shutdown(&self) {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(running) = taken {
            running.token.cancel();
            if let Err(e) = running.handle.await {
                error!("Reconciler task ended abnormally: {}", e);
            }
            info!("Reconciler shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|r| !r.token.is_cancelled() && !r.handle.is_finished())
    }

    /// Run one reconciliation pass now
    pub async fn tick(&self) -> TickReport {
        self.inner.tick().await
    }

    pub async fn stats(&self) -> ReconcilerStats {
        let mut stats = self.inner.stats.read().await.clone();
        {
            let seen = self.inner.seen.lock().await;
            stats.seen_keys = seen.len();
            stats.evicted_keys = seen.evicted();
        }
        stats.running = self.is_running();
        stats
    }

    /// Subscribe to every event the poller publishes
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<LeadcallEvent> {
        self.inner.event_bus.subscribe()
    }

    /// Invoke `callback` for each applied status update
    ///
    /// The listener runs until the event bus closes.
    pub fn on_lead_status_resolved<F, Fut>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(String, LeadStatus, LastCallData) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(LeadcallEvent::LeadStatusResolved {
                        lead_id, status, call, ..
                    }) => callback(lead_id, status, call).await,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Status listener lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().unwrap_or_else(|p| p.into_inner()).take() {
            running.token.cancel();
        }
    }
}

impl PollerInner {
    async fn run(&self, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                break;
            }

            self.tick().await;

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.config.tick_interval) => {}
            }
        }
        debug!("Reconciler loop exited");
    }

    async fn with_timeout<T, F>(&self, fut: F) -> Result<T, CollaboratorError>
    where
        F: Future<Output = Result<T, CollaboratorError>>,
    {
        match tokio::time::timeout(self.config.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout),
        }
    }

    async fn tick(&self) -> TickReport {
        let _guard = self.tick_lock.lock().await;
        let mut report = TickReport::default();

        {
            let mut stats = self.stats.write().await;
            stats.ticks += 1;
            stats.last_tick_at = Some(Utc::now());
        }

        let records = match self
            .with_timeout(self.calls.recent_calls(self.config.recent_call_limit))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(source = self.calls.name(), "Failed to fetch recent calls, skipping tick: {}", e);
                return self.skip_tick(report, format!("fetch calls: {}", e)).await;
            }
        };
        report.fetched = records.len();

        if records.is_empty() {
            debug!("No recent calls");
            return self.finish_tick(report).await;
        }

        let leads = match self.with_timeout(self.leads.list_leads()).await {
            Ok(leads) => leads,
            Err(e) => {
                warn!(store = self.leads.name(), "Failed to list leads, skipping tick: {}", e);
                return self.skip_tick(report, format!("list leads: {}", e)).await;
            }
        };

        for record in &records {
            self.process_record(record, &leads, &mut report).await;
        }

        self.finish_tick(report).await
    }

    async fn process_record(&self, record: &CallRecord, leads: &[Lead], report: &mut TickReport) {
        let key = record.event_key();
        if !self.seen.lock().await.insert(key.clone()) {
            report.duplicates += 1;
            return;
        }
        report.processed += 1;

        let status = record.lead_status();
        debug!(
            call_id = %record.id,
            provider_status = %record.status,
            ended_reason = ?record.ended_reason.as_ref().map(|r| r.as_str()),
            duration = record.duration_seconds,
            resolved = %status,
            "Resolved call status"
        );

        let lead = match match_lead(&record.phone_number, leads) {
            MatchOutcome::Unique(lead) => lead,
            MatchOutcome::NoMatch => {
                info!(
                    call_id = %record.id,
                    phone = %record.phone_number,
                    "No lead matches call number, skipping"
                );
                report.unmatched += 1;
                return;
            }
            MatchOutcome::Ambiguous(candidates) => {
                let candidate_lead_ids: Vec<String> =
                    candidates.iter().map(|l| l.id.clone()).collect();
                warn!(
                    call_id = %record.id,
                    phone = %record.phone_number,
                    candidates = ?candidate_lead_ids,
                    "Call number matches several leads, not updating any"
                );
                report.ambiguous += 1;
                self.event_bus.emit_lossy(LeadcallEvent::LeadMatchAmbiguous {
                    call_id: record.id.clone(),
                    phone_number: record.phone_number.clone(),
                    candidate_lead_ids,
                    timestamp: Utc::now(),
                });
                return;
            }
        };

        let patch = LeadPatch {
            call_connection_status: status,
            last_call_data: record.last_call_data(),
        };

        match self.with_timeout(self.leads.update_lead(&lead.id, &patch)).await {
            Ok(()) => {
                info!(lead_id = %lead.id, call_id = %record.id, status = %status, "Lead status updated");
                report.updated += 1;
                self.event_bus.emit_lossy(LeadcallEvent::LeadStatusResolved {
                    lead_id: lead.id.clone(),
                    status,
                    call: patch.last_call_data,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                let will_retry = self.config.delivery == DeliveryPolicy::RetryFailedUpdates;
                if will_retry {
                    self.seen.lock().await.remove(&key);
                }
                warn!(
                    lead_id = %lead.id,
                    call_id = %record.id,
                    will_retry,
                    "Lead update failed: {}", e
                );
                report.update_failures += 1;
                self.stats.write().await.last_error = Some(format!("update lead {}: {}", lead.id, e));
                self.event_bus.emit_lossy(LeadcallEvent::LeadUpdateFailed {
                    lead_id: lead.id.clone(),
                    call_id: record.id.clone(),
                    error: e.to_string(),
                    will_retry,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    async fn skip_tick(&self, mut report: TickReport, error: String) -> TickReport {
        {
            let mut stats = self.stats.write().await;
            stats.fetch_failures += 1;
            stats.last_error = Some(error.clone());
        }
        self.event_bus.emit_lossy(LeadcallEvent::ReconcileFetchFailed {
            error: error.clone(),
            timestamp: Utc::now(),
        });
        report.fetch_error = Some(error);
        report
    }

    async fn finish_tick(&self, report: TickReport) -> TickReport {
        {
            let mut stats = self.stats.write().await;
            stats.updates_applied += report.updated as u64;
            stats.update_failures += report.update_failures as u64;
            stats.unmatched += report.unmatched as u64;
            stats.ambiguous += report.ambiguous as u64;
            stats.duplicates_skipped += report.duplicates as u64;
        }

        if report.processed > 0 {
            info!(
                fetched = report.fetched,
                processed = report.processed,
                updated = report.updated,
                unmatched = report.unmatched,
                ambiguous = report.ambiguous,
                failed = report.update_failures,
                "Reconcile tick complete"
            );
        } else {
            debug!(fetched = report.fetched, "Reconcile tick complete, nothing new");
        }

        self.event_bus.emit_lossy(LeadcallEvent::ReconcileTickCompleted {
            fetched: report.fetched,
            processed: report.processed,
            updated: report.updated,
            timestamp: Utc::now(),
        });
        report
    }
}
