use std::fmt;

use recipe_sync_core::ExternalId;
use serde::{Deserialize, Serialize};

/// Content kind every synced recipe entry is filed under.
pub const RECIPE_KIND: &str = "recipe";

/// Author assigned to entries created or updated by the sync.
pub const DEFAULT_AUTHOR: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Pending,
    Private,
    Publish,
}

impl PostStatus {
    pub const ALL: [PostStatus; 4] = [
        PostStatus::Draft,
        PostStatus::Pending,
        PostStatus::Private,
        PostStatus::Publish,
    ];
}

/// Columns written on create and overwritten on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFields {
    pub kind: String,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub author: u64,
}

/// Metadata-equality lookup restricted to a content kind and a set of statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub kind: String,
    pub meta_key: String,
    pub meta_value: String,
    pub statuses: Vec<PostStatus>,
}

impl EntryQuery {
    /// Recipe entry synced from `id`, whatever its publication status.
    pub fn by_external_id(id: &ExternalId) -> Self {
        Self {
            kind: RECIPE_KIND.to_string(),
            meta_key: crate::meta_keys::EXTERNAL_ID.to_string(),
            meta_value: id.as_str().to_string(),
            statuses: PostStatus::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    /// Local entry is at least as new as the upstream record.
    Skipped,
    /// The store rejected the lookup, create or update.
    Errored,
    /// Record carried no usable identifier.
    Discarded,
}

/// Per-pass tallies. Only `created`, `updated` and `errors` are surfaced to
/// the admin notice; the rest feed the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounters {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub discarded: usize,
}

impl SyncCounters {
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Skipped => self.skipped += 1,
            SyncOutcome::Errored => self.errors += 1,
            SyncOutcome::Discarded => self.discarded += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub final_url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
