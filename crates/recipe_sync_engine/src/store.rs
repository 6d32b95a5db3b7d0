use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::{EntryFields, EntryId, EntryQuery, MediaId, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry {0} not found")]
    NotFound(EntryId),
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("media library error: {0}")]
    Media(String),
    #[error("content store is in use by another sync pass")]
    Busy,
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Host content storage: entries, per-entry metadata and the media library.
///
/// Implementations must be safe to share; the sync calls them from async code
/// but never concurrently for the same pass.
pub trait ContentStore: Send + Sync {
    /// Claim the store for one pass until [`ContentStore::end_pass`].
    /// Stores shared between processes return [`StoreError::Busy`] while
    /// another holder is active and pick up that holder's writes on success.
    fn begin_pass(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn end_pass(&self) {}

    fn find_entry(&self, query: &EntryQuery) -> Result<Option<EntryId>, StoreError>;

    fn create_entry(&self, fields: &EntryFields, created_at: &str) -> Result<EntryId, StoreError>;

    fn update_entry(&self, id: EntryId, fields: &EntryFields) -> Result<(), StoreError>;

    fn get_meta(&self, id: EntryId, key: &str) -> Option<Value>;

    fn set_meta(&self, id: EntryId, key: &str, value: Value) -> Result<(), StoreError>;

    fn has_cover_image(&self, id: EntryId) -> bool;

    fn set_cover_image(&self, id: EntryId, media: MediaId) -> Result<(), StoreError>;

    /// Take ownership of the file at `source` as a media item attached to
    /// `parent`. The caller deletes `source` afterwards.
    fn store_media(
        &self,
        source: &Path,
        filename: &str,
        parent: EntryId,
    ) -> Result<MediaId, StoreError>;
}
