use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use recipe_sync_engine::{
    ensure_output_dir, AtomicFileWriter, DirLock, LastRunStore, PersistError, Scheduler,
};
use serde::{Deserialize, Serialize};
use sync_logging::{sync_error, sync_info, sync_warn};

const STATE_FILENAME: &str = ".recipe_sync_state.ron";
const LOCK_FILENAME: &str = ".recipe_sync_state.lock";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedState {
    last_fetch: Option<String>,
    next_run: Option<String>,
    interval_secs: Option<u64>,
}

type Now = fn() -> DateTime<Utc>;

/// Process state kept next to the content store: the last-run stamp and the
/// recurring schedule.
///
/// The daemon and one-shot commands share the file, so reads go to disk and
/// every change is a locked read-modify-write. The last state seen is kept in
/// memory for when the file cannot be read.
pub struct StateFile {
    dir: PathBuf,
    writer: AtomicFileWriter,
    cached: Mutex<PersistedState>,
    now: Now,
}

impl StateFile {
    pub fn open(data_dir: &Path) -> Result<Self, PersistError> {
        Self::open_with_clock(data_dir, Utc::now)
    }

    pub fn open_with_clock(data_dir: &Path, now: Now) -> Result<Self, PersistError> {
        ensure_output_dir(data_dir)?;
        let state = load_state(data_dir).unwrap_or_default();
        sync_info!("Sync state in {:?}: {:?}", data_dir, state);
        Ok(Self {
            dir: data_dir.to_path_buf(),
            writer: AtomicFileWriter::new(data_dir.to_path_buf()),
            cached: Mutex::new(state),
            now,
        })
    }

    /// Time left until the next scheduled pass; zero when it is already due
    /// or the stored time is unreadable.
    pub fn time_until_next_run(&self) -> Option<Duration> {
        let next = self.read().next_run?;
        let wait = match DateTime::parse_from_rfc3339(&next) {
            Ok(at) => (at.with_timezone(&Utc) - (self.now)())
                .to_std()
                .unwrap_or(Duration::ZERO),
            Err(err) => {
                sync_warn!("Unreadable next run time {:?}: {}", next, err);
                Duration::ZERO
            }
        };
        Some(wait)
    }

    /// Move the next run one interval past now. No-op when unscheduled.
    pub fn advance(&self) {
        let next = |interval| self.after(interval);
        self.update(|state| {
            if let Some(secs) = state.interval_secs {
                state.next_run = Some(next(Duration::from_secs(secs)));
            }
        });
    }

    fn after(&self, interval: Duration) -> String {
        chrono::Duration::from_std(interval)
            .ok()
            .and_then(|delta| (self.now)().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .to_rfc3339()
    }

    fn cache(&self) -> MutexGuard<'_, PersistedState> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> PersistedState {
        let mut cached = self.cache();
        if let Some(state) = load_state(&self.dir) {
            *cached = state;
        }
        cached.clone()
    }

    /// Apply `change` to the on-disk state under the state lock. Without the
    /// lock the change still lands in memory and is written best-effort.
    fn update(&self, change: impl FnOnce(&mut PersistedState)) {
        let mut cached = self.cache();
        let _lock = match DirLock::acquire(&self.dir, LOCK_FILENAME) {
            Ok(lock) => Some(lock),
            Err(err) => {
                sync_warn!("Could not lock sync state in {:?}: {}", self.dir, err);
                None
            }
        };
        let mut state = load_state(&self.dir).unwrap_or_else(|| cached.clone());
        change(&mut state);
        self.save(&state);
        *cached = state;
    }

    fn save(&self, state: &PersistedState) {
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(state, pretty) {
            Ok(text) => text,
            Err(err) => {
                sync_error!("Failed to serialize sync state: {}", err);
                return;
            }
        };
        if let Err(err) = self.writer.write(STATE_FILENAME, content) {
            sync_error!(
                "Failed to write sync state to {:?}: {}",
                self.writer.dir(),
                err
            );
        }
    }
}

/// `None` when the file exists but cannot be read or parsed.
fn load_state(data_dir: &Path) -> Option<PersistedState> {
    let path = data_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Some(PersistedState::default());
        }
        Err(err) => {
            sync_warn!("Failed to read sync state from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str(&content) {
        Ok(state) => Some(state),
        Err(err) => {
            sync_warn!("Failed to parse sync state from {:?}: {}", path, err);
            None
        }
    }
}

impl LastRunStore for StateFile {
    fn last_run(&self) -> Option<String> {
        self.read().last_fetch
    }

    fn set_last_run(&self, timestamp: &str) {
        self.update(|state| state.last_fetch = Some(timestamp.to_string()));
    }
}

impl Scheduler for StateFile {
    fn is_scheduled(&self) -> bool {
        self.read().interval_secs.is_some()
    }

    fn schedule_recurring(&self, interval: Duration) {
        let next_run = self.after(interval);
        self.update(|state| {
            state.interval_secs = Some(interval.as_secs());
            state.next_run = Some(next_run);
        });
    }

    fn clear(&self) {
        self.update(|state| {
            state.interval_secs = None;
            state.next_run = None;
        });
    }

    fn next_run(&self) -> Option<String> {
        self.read().next_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn fresh_state_is_unscheduled() {
        let tmp = TempDir::new().unwrap();
        let state = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();

        assert!(!state.is_scheduled());
        assert_eq!(state.last_run(), None);
        assert_eq!(state.next_run(), None);
        assert_eq!(state.time_until_next_run(), None);
    }

    #[test]
    fn schedule_and_last_run_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let state = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();
            state.schedule_recurring(Duration::from_secs(3600));
            state.set_last_run("2024-06-01T07:59:00+00:00");
        }
        assert!(tmp.path().join(STATE_FILENAME).is_file());

        let state = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();
        assert!(state.is_scheduled());
        assert_eq!(state.last_run().as_deref(), Some("2024-06-01T07:59:00+00:00"));
        assert_eq!(state.next_run().as_deref(), Some("2024-06-01T09:00:00+00:00"));
        assert_eq!(state.time_until_next_run(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn clear_removes_schedule_but_keeps_last_run() {
        let tmp = TempDir::new().unwrap();
        let state = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();
        state.schedule_recurring(Duration::from_secs(60));
        state.set_last_run("2024-06-01T08:00:00+00:00");

        state.clear();

        assert!(!state.is_scheduled());
        assert_eq!(state.next_run(), None);
        assert!(state.last_run().is_some());
        state.advance();
        assert_eq!(state.next_run(), None);
    }

    #[test]
    fn overdue_run_waits_zero() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(STATE_FILENAME),
            r#"(last_fetch: None, next_run: Some("2024-06-01T07:00:00+00:00"), interval_secs: Some(3600))"#,
        )
        .unwrap();
        let state = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();

        assert_eq!(state.time_until_next_run(), Some(Duration::ZERO));
        state.advance();
        assert_eq!(state.next_run().as_deref(), Some("2024-06-01T09:00:00+00:00"));
    }

    #[test]
    fn corrupt_state_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(STATE_FILENAME), "not ron at all (").unwrap();

        let state = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();
        assert!(!state.is_scheduled());
    }

    #[test]
    fn two_handles_keep_each_others_changes() {
        let tmp = TempDir::new().unwrap();
        let daemon = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();
        let manual = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();

        daemon.schedule_recurring(Duration::from_secs(3600));
        manual.set_last_run("2024-06-01T08:00:05+00:00");
        daemon.advance();

        assert!(manual.is_scheduled());
        assert_eq!(daemon.last_run().as_deref(), Some("2024-06-01T08:00:05+00:00"));

        let reopened = StateFile::open_with_clock(tmp.path(), fixed_now).unwrap();
        assert_eq!(reopened.last_run().as_deref(), Some("2024-06-01T08:00:05+00:00"));
        assert_eq!(reopened.next_run().as_deref(), Some("2024-06-01T09:00:00+00:00"));
    }
}
