use std::time::Duration;

use anyhow::Result;
use recipe_sync_engine::{SyncCounters, SyncError, SyncService};
use sync_logging::{sync_debug, sync_info};

use crate::persistence::StateFile;

/// Activate, then run scheduled passes until Ctrl-C. The schedule is cleared
/// on the way out.
pub async fn run(service: &SyncService, state: &StateFile, interval: Duration) -> Result<()> {
    report("Activation", service.activate(state, interval).await);
    skip_overdue(state);

    loop {
        let wait = state.time_until_next_run().unwrap_or(interval);
        sync_info!("Next recipe fetch in {}s", wait.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                report("Scheduled", service.run_scheduled().await);
                state.advance();
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                sync_info!("Shutdown requested");
                break;
            }
        }
    }

    service.deactivate(state);
    Ok(())
}

/// A schedule left over from an earlier process may already be due; the
/// activation pass covers it.
fn skip_overdue(state: &StateFile) {
    if state.time_until_next_run() == Some(Duration::ZERO) {
        state.advance();
    }
}

/// Passes that ran have already logged their failures; only a refused pass is
/// worth a line here.
fn report(label: &str, outcome: Result<SyncCounters, SyncError>) {
    match outcome {
        Ok(counters) => sync_debug!("{} pass finished: {:?}", label, counters),
        Err(SyncError::AlreadyRunning) => {
            sync_info!("{} pass skipped, another pass holds the data dir", label)
        }
        Err(err) => sync_debug!("{} pass failed: {}", label, err),
    }
}
