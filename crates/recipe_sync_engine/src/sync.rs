use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use sync_logging::{sync_error, sync_info, sync_warn};
use thiserror::Error;

use crate::reconcile::{Clock, Reconciler};
use crate::source::fetch_source_records;
use crate::{ContentStore, FetchError, HttpClient, StoreError, SyncCounters, Trigger};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid recipe payload: {0}")]
    InvalidPayload(String),
    #[error("a sync pass is already running")]
    AlreadyRunning,
    #[error("content store unavailable: {0}")]
    Store(StoreError),
}

/// Where the "last pass finished" stamp lives between runs.
pub trait LastRunStore: Send + Sync {
    fn last_run(&self) -> Option<String>;

    /// Failures are the implementation's to log; a lost stamp never fails a pass.
    fn set_last_run(&self, timestamp: &str);
}

#[derive(Debug, Default)]
pub struct MemoryLastRun {
    value: Mutex<Option<String>>,
}

impl LastRunStore for MemoryLastRun {
    fn last_run(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_last_run(&self, timestamp: &str) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(timestamp.to_string());
    }
}

#[derive(Clone)]
pub struct SyncSettings {
    pub endpoint_url: String,
    pub clock: Clock,
}

impl std::fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSettings")
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

/// Runs passes: fetch the full recipe list, reconcile each record in order,
/// stamp the last run.
pub struct SyncService {
    settings: SyncSettings,
    store: Arc<dyn ContentStore>,
    http: Arc<dyn HttpClient>,
    last_run: Arc<dyn LastRunStore>,
    reconciler: Reconciler,
    running: AtomicBool,
}

/// Releases the store claim and the in-flight flag however the pass ends.
struct PassGuard<'a> {
    running: &'a AtomicBool,
    store: Option<&'a dyn ContentStore>,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if let Some(store) = self.store {
            store.end_pass();
        }
        self.running.store(false, Ordering::Release);
        sync_logging::end_pass();
    }
}

impl SyncService {
    pub fn new(
        settings: SyncSettings,
        store: Arc<dyn ContentStore>,
        http: Arc<dyn HttpClient>,
        last_run: Arc<dyn LastRunStore>,
    ) -> Self {
        let reconciler = Reconciler::new(store.clone(), http.clone(), settings.clock.clone());
        Self {
            settings,
            store,
            http,
            last_run,
            reconciler,
            running: AtomicBool::new(false),
        }
    }

    pub fn last_run(&self) -> Option<String> {
        self.last_run.last_run()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// One full pass. Only a failed fetch, an overlapping pass or an
    /// unavailable store is an error; per-record failures are counted in the
    /// returned tallies.
    pub async fn run_pass(&self, trigger: Trigger) -> Result<SyncCounters, SyncError> {
        let _guard = self.begin_pass()?;
        sync_info!("=== STARTING RECIPE FETCH PROCESS ({}) ===", trigger);

        let records = match fetch_source_records(self.http.as_ref(), &self.settings.endpoint_url).await
        {
            Ok(records) => records,
            Err(err) => {
                sync_error!("Fetch Recipes ERROR: {}", err);
                return Err(err);
            }
        };

        let mut counters = SyncCounters::default();
        let total = records.len();
        for (index, record) in records.iter().enumerate() {
            sync_info!("Processing recipe {} of {}", index + 1, total);
            counters.record(self.reconciler.reconcile(record).await);
        }

        self.last_run.set_last_run(&(self.settings.clock)());

        sync_info!("=== RECIPE FETCH COMPLETE ===");
        sync_info!(
            "Results: Created: {}, Updated: {}, Skipped: {}, Errors: {}, Without ID: {}",
            counters.created,
            counters.updated,
            counters.skipped,
            counters.errors,
            counters.discarded
        );
        Ok(counters)
    }

    fn begin_pass(&self) -> Result<PassGuard<'_>, SyncError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            sync_warn!("Sync requested while another pass is running; refusing");
            return Err(SyncError::AlreadyRunning);
        }
        let mut guard = PassGuard {
            running: &self.running,
            store: None,
        };
        match self.store.begin_pass() {
            Ok(()) => guard.store = Some(self.store.as_ref()),
            Err(StoreError::Busy) => {
                sync_warn!("Content store is claimed by another pass; refusing");
                return Err(SyncError::AlreadyRunning);
            }
            Err(err) => {
                sync_error!("Could not claim content store: {}", err);
                return Err(SyncError::Store(err));
            }
        }
        sync_logging::begin_pass();
        Ok(guard)
    }
}
