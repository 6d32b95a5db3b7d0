//! Recipe sync engine: collaborator seams, reconciliation and pass orchestration.
mod content;
mod decode;
mod dir_store;
mod fetch;
mod filename;
mod image;
mod memory_store;
mod persist;
mod reconcile;
mod source;
mod store;
mod sync;
mod trigger;
mod types;

pub use content::{entry_fields, presentation_body, strip_all_tags, PLACEHOLDER_DESCRIPTION, UNTITLED};
pub use decode::{decode_body, DecodeError, DecodedBody};
pub use dir_store::DirectoryContentStore;
pub use fetch::{FetchSettings, HttpClient, ReqwestHttpClient};
pub use filename::image_filename;
pub use image::{attach_cover_image, try_attach_cover_image, AttachResult, ImageAttachError};
pub use memory_store::{MemoryContentStore, StoreSnapshot, StoredEntry, StoredMedia};
pub use persist::{ensure_output_dir, AtomicFileWriter, DirLock, PersistError};
pub use reconcile::{meta_keys, needs_update, write_recipe_meta, Clock, Reconciler};
pub use source::fetch_source_records;
pub use store::{ContentStore, StoreError};
pub use sync::{LastRunStore, MemoryLastRun, SyncError, SyncService, SyncSettings};
pub use trigger::{AdminNotice, NoticeKind, Scheduler, SyncStatus, Trigger, DEFAULT_INTERVAL};
pub use types::{
    EntryFields, EntryId, EntryQuery, FailureKind, FetchError, HttpResponse, MediaId, PostStatus,
    SyncCounters, SyncOutcome, DEFAULT_AUTHOR, RECIPE_KIND,
};
