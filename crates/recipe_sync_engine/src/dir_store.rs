use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use sync_logging::{sync_debug, sync_info, sync_warn};

use crate::memory_store::{MemoryContentStore, StoreSnapshot};
use crate::persist::{ensure_output_dir, AtomicFileWriter, DirLock, PersistError};
use crate::{ContentStore, EntryFields, EntryId, EntryQuery, MediaId, StoreError};

const STORE_FILENAME: &str = "store.json";
const LOCK_FILENAME: &str = ".store.lock";
const MEDIA_DIR: &str = "media";

/// Content store persisted under a data directory:
/// `store.json` holds entries and metadata, `media/` holds image files.
///
/// Several processes may open the same directory. Writes happen under an
/// advisory lock on `.store.lock` and start from the current `store.json`;
/// a sync pass holds that lock from [`ContentStore::begin_pass`] to
/// [`ContentStore::end_pass`]. A write whose flush fails leaves memory as it
/// was before the write.
#[derive(Debug)]
pub struct DirectoryContentStore {
    memory: MemoryContentStore,
    writer: AtomicFileWriter,
    media_writer: AtomicFileWriter,
    pass_lock: Mutex<Option<DirLock>>,
}

impl DirectoryContentStore {
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        ensure_output_dir(root)?;
        let snapshot = load_snapshot(root)?;
        sync_info!(
            "Opened content store at {:?} ({} entries)",
            root,
            snapshot.entries.len()
        );

        Ok(Self {
            memory: MemoryContentStore::from_snapshot(snapshot),
            writer: AtomicFileWriter::new(root.to_path_buf()),
            media_writer: AtomicFileWriter::new(root.join(MEDIA_DIR)),
            pass_lock: Mutex::new(None),
        })
    }

    /// Read access to the loaded entries.
    pub fn memory(&self) -> &MemoryContentStore {
        &self.memory
    }

    pub fn root(&self) -> &Path {
        self.writer.dir()
    }

    fn held(&self) -> MutexGuard<'_, Option<DirLock>> {
        self.pass_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reload(&self) -> Result<(), StoreError> {
        self.memory.replace_snapshot(load_snapshot(self.root())?);
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.memory.snapshot())
            .map_err(|err| PersistError::Serialize(err.to_string()))?;
        self.writer.write(STORE_FILENAME, content)?;
        Ok(())
    }

    /// Run `op` against the current on-disk state and persist the result.
    /// Outside a pass the directory lock is taken for this write only.
    fn write<T>(
        &self,
        op: impl FnOnce(&MemoryContentStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let held = self.held();
        let _write_lock = match held.as_ref() {
            Some(_) => None,
            None => {
                let lock = DirLock::acquire(self.root(), LOCK_FILENAME)?;
                self.reload()?;
                Some(lock)
            }
        };

        let before = self.memory.snapshot();
        let result = op(&self.memory).and_then(|value| self.flush().map(|()| value));
        if result.is_err() {
            self.memory.replace_snapshot(before);
        }
        result
    }
}

fn load_snapshot(root: &Path) -> Result<StoreSnapshot, StoreError> {
    let path = root.join(STORE_FILENAME);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(serde_json::from_str::<StoreSnapshot>(&text)
            .map_err(|err| PersistError::Serialize(format!("{}: {err}", path.display())))?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoreSnapshot::default()),
        Err(err) => Err(PersistError::Io(err).into()),
    }
}

impl ContentStore for DirectoryContentStore {
    fn begin_pass(&self) -> Result<(), StoreError> {
        let mut held = self.held();
        if held.is_some() {
            return Err(StoreError::Busy);
        }
        let lock = match DirLock::try_acquire(self.root(), LOCK_FILENAME) {
            Ok(lock) => lock,
            Err(PersistError::Locked(path)) => {
                sync_warn!("{:?} is held by another sync process", path);
                return Err(StoreError::Busy);
            }
            Err(err) => return Err(err.into()),
        };
        self.reload()?;
        sync_debug!("Acquired {:?} for this pass", lock.path());
        *held = Some(lock);
        Ok(())
    }

    fn end_pass(&self) {
        self.held().take();
    }

    fn find_entry(&self, query: &EntryQuery) -> Result<Option<EntryId>, StoreError> {
        self.memory.find_entry(query)
    }

    fn create_entry(&self, fields: &EntryFields, created_at: &str) -> Result<EntryId, StoreError> {
        self.write(|memory| memory.create_entry(fields, created_at))
    }

    fn update_entry(&self, id: EntryId, fields: &EntryFields) -> Result<(), StoreError> {
        self.write(|memory| memory.update_entry(id, fields))
    }

    fn get_meta(&self, id: EntryId, key: &str) -> Option<Value> {
        self.memory.get_meta(id, key)
    }

    fn set_meta(&self, id: EntryId, key: &str, value: Value) -> Result<(), StoreError> {
        self.write(|memory| memory.set_meta(id, key, value))
    }

    fn has_cover_image(&self, id: EntryId) -> bool {
        self.memory.has_cover_image(id)
    }

    fn set_cover_image(&self, id: EntryId, media: MediaId) -> Result<(), StoreError> {
        self.write(|memory| memory.set_cover_image(id, media))
    }

    fn store_media(
        &self,
        source: &Path,
        filename: &str,
        parent: EntryId,
    ) -> Result<MediaId, StoreError> {
        let bytes = fs::read(source).map_err(PersistError::Io)?;
        let mut copied = None;
        let result = self.write(|memory| {
            let id = memory.store_media(source, filename, parent)?;
            let path = self.media_writer.write(&format!("{id}-{filename}"), &bytes)?;
            copied = Some(path.clone());
            memory.set_media_path(id, path);
            Ok(id)
        });
        if let (Err(_), Some(path)) = (&result, copied) {
            if let Err(err) = fs::remove_file(&path) {
                sync_warn!("Could not remove unrecorded media {:?}: {}", path, err);
            }
        }
        result
    }
}
