use std::fmt;
use std::time::Duration;

use sync_logging::{sync_error, sync_info};

use crate::{SyncCounters, SyncError, SyncService};

/// Default spacing between scheduled passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    Activation,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Scheduled => write!(f, "scheduled"),
            Trigger::Activation => write!(f, "activation"),
            Trigger::Manual => write!(f, "manual"),
        }
    }
}

/// Recurring-invocation registry owned by the host. The sync only asks it to
/// register or clear the recurring pass; running the timer is the host's job.
pub trait Scheduler: Send + Sync {
    fn is_scheduled(&self) -> bool;

    fn schedule_recurring(&self, interval: Duration);

    fn clear(&self);

    /// Human-readable time of the next scheduled pass.
    fn next_run(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Result line shown after a manual trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl AdminNotice {
    pub fn from_result(result: &Result<SyncCounters, SyncError>) -> Self {
        match result {
            Ok(counters) => Self {
                kind: NoticeKind::Success,
                message: format!(
                    "Recipes fetched successfully! {} recipes created, {} recipes updated, {} errors.",
                    counters.created, counters.updated, counters.errors
                ),
            },
            Err(SyncError::AlreadyRunning) => Self {
                kind: NoticeKind::Error,
                message: "A recipe fetch is already in progress. Try again shortly.".to_string(),
            },
            Err(_) => Self {
                kind: NoticeKind::Error,
                message: "Failed to fetch recipes. Check error log for details.".to_string(),
            },
        }
    }
}

/// "Last Run Information" shown alongside the manual trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub last_fetch: String,
    pub next_run: String,
}

impl SyncService {
    /// Register the recurring pass if needed, then run one pass immediately.
    pub async fn activate(
        &self,
        scheduler: &dyn Scheduler,
        interval: Duration,
    ) -> Result<SyncCounters, SyncError> {
        if !scheduler.is_scheduled() {
            scheduler.schedule_recurring(interval);
            sync_info!("Scheduled recurring recipe fetch every {:?}", interval);
        }
        self.run_logged(Trigger::Activation).await
    }

    pub fn deactivate(&self, scheduler: &dyn Scheduler) {
        scheduler.clear();
        sync_info!("Cleared recurring recipe fetch");
    }

    /// Entry point for the host's timer. Outcomes go to the log only.
    pub async fn run_scheduled(&self) -> Result<SyncCounters, SyncError> {
        self.run_logged(Trigger::Scheduled).await
    }

    pub async fn run_manual(&self) -> AdminNotice {
        let result = self.run_pass(Trigger::Manual).await;
        AdminNotice::from_result(&result)
    }

    pub fn status(&self, scheduler: &dyn Scheduler) -> SyncStatus {
        SyncStatus {
            last_fetch: self.last_run().unwrap_or_else(|| "Never".to_string()),
            next_run: scheduler
                .next_run()
                .unwrap_or_else(|| "Not scheduled".to_string()),
        }
    }

    async fn run_logged(&self, trigger: Trigger) -> Result<SyncCounters, SyncError> {
        let result = self.run_pass(trigger).await;
        if let Err(err) = &result {
            sync_error!("{} recipe fetch failed: {}", trigger, err);
        }
        result
    }
}
