use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ContentStore, EntryFields, EntryId, EntryQuery, MediaId, PostStatus, StoreError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: EntryId,
    pub kind: String,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub author: u64,
    pub created_at: String,
    pub cover_image: Option<MediaId>,
    pub meta: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMedia {
    pub id: MediaId,
    pub parent: EntryId,
    pub filename: String,
    pub byte_len: u64,
    /// Where the bytes live; `None` for stores that only keep the record.
    pub path: Option<PathBuf>,
}

/// Serializable image of a whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub next_id: u64,
    pub entries: Vec<StoredEntry>,
    pub media: Vec<StoredMedia>,
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: StoreSnapshot,
    writes: usize,
}

impl Inner {
    fn entry_mut(&mut self, id: EntryId) -> Result<&mut StoredEntry, StoreError> {
        self.snapshot
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn entry(&self, id: EntryId) -> Option<&StoredEntry> {
        self.snapshot.entries.iter().find(|entry| entry.id == id)
    }

    fn allocate_id(&mut self) -> u64 {
        self.snapshot.next_id += 1;
        self.snapshot.next_id
    }
}

/// Process-local content store. Entries and media share one id sequence.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    inner: Mutex<Inner>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            inner: Mutex::new(Inner {
                snapshot,
                writes: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().snapshot.clone()
    }

    /// Swap in `snapshot` wholesale. The write counter is kept.
    pub(crate) fn replace_snapshot(&self, snapshot: StoreSnapshot) {
        self.lock().snapshot = snapshot;
    }

    pub fn entry(&self, id: EntryId) -> Option<StoredEntry> {
        self.lock().entry(id).cloned()
    }

    pub fn entries(&self) -> Vec<StoredEntry> {
        self.lock().snapshot.entries.clone()
    }

    pub fn media(&self, id: MediaId) -> Option<StoredMedia> {
        self.lock()
            .snapshot
            .media
            .iter()
            .find(|media| media.id == id)
            .cloned()
    }

    /// Number of mutating calls accepted since construction.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Editorial status change made outside the sync (e.g. publishing).
    pub fn set_status(&self, id: EntryId, status: PostStatus) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.entry_mut(id)?.status = status;
        Ok(())
    }

    pub(crate) fn set_media_path(&self, id: MediaId, path: PathBuf) {
        let mut inner = self.lock();
        if let Some(media) = inner.snapshot.media.iter_mut().find(|m| m.id == id) {
            media.path = Some(path);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContentStore for MemoryContentStore {
    fn find_entry(&self, query: &EntryQuery) -> Result<Option<EntryId>, StoreError> {
        let inner = self.lock();
        let found = inner
            .snapshot
            .entries
            .iter()
            .filter(|entry| entry.kind == query.kind && query.statuses.contains(&entry.status))
            .find(|entry| {
                entry
                    .meta
                    .get(&query.meta_key)
                    .is_some_and(|value| meta_matches(value, &query.meta_value))
            })
            .map(|entry| entry.id);
        Ok(found)
    }

    fn create_entry(&self, fields: &EntryFields, created_at: &str) -> Result<EntryId, StoreError> {
        let mut inner = self.lock();
        let id = EntryId(inner.allocate_id());
        inner.snapshot.entries.push(StoredEntry {
            id,
            kind: fields.kind.clone(),
            title: fields.title.clone(),
            content: fields.content.clone(),
            status: fields.status,
            author: fields.author,
            created_at: created_at.to_string(),
            cover_image: None,
            meta: BTreeMap::new(),
        });
        inner.writes += 1;
        Ok(id)
    }

    fn update_entry(&self, id: EntryId, fields: &EntryFields) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let entry = inner.entry_mut(id)?;
        entry.kind = fields.kind.clone();
        entry.title = fields.title.clone();
        entry.content = fields.content.clone();
        entry.status = fields.status;
        entry.author = fields.author;
        inner.writes += 1;
        Ok(())
    }

    fn get_meta(&self, id: EntryId, key: &str) -> Option<Value> {
        self.lock().entry(id)?.meta.get(key).cloned()
    }

    fn set_meta(&self, id: EntryId, key: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.entry_mut(id)?.meta.insert(key.to_string(), value);
        inner.writes += 1;
        Ok(())
    }

    fn has_cover_image(&self, id: EntryId) -> bool {
        self.lock()
            .entry(id)
            .is_some_and(|entry| entry.cover_image.is_some())
    }

    fn set_cover_image(&self, id: EntryId, media: MediaId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.snapshot.media.iter().any(|m| m.id == media) {
            return Err(StoreError::Media(format!("unknown media {media}")));
        }
        inner.entry_mut(id)?.cover_image = Some(media);
        inner.writes += 1;
        Ok(())
    }

    fn store_media(
        &self,
        source: &Path,
        filename: &str,
        parent: EntryId,
    ) -> Result<MediaId, StoreError> {
        let byte_len = fs::metadata(source)
            .map_err(|err| StoreError::Media(format!("{}: {err}", source.display())))?
            .len();
        if byte_len == 0 {
            return Err(StoreError::Media("empty media file".into()));
        }

        let mut inner = self.lock();
        inner.entry_mut(parent)?;
        let id = MediaId(inner.allocate_id());
        inner.snapshot.media.push(StoredMedia {
            id,
            parent,
            filename: filename.to_string(),
            byte_len,
            path: None,
        });
        inner.writes += 1;
        Ok(id)
    }
}

/// Ids may have been stored as JSON numbers or strings.
fn meta_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        _ => false,
    }
}
