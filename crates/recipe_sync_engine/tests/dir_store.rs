use std::fs;

use recipe_sync_engine::{
    meta_keys, ContentStore, DirectoryContentStore, EntryFields, EntryId, EntryQuery,
    PostStatus, StoreError,
};
use serde_json::json;
use tempfile::TempDir;

fn fields(title: &str) -> EntryFields {
    EntryFields {
        kind: "recipe".into(),
        title: title.into(),
        content: "<p>body</p>".into(),
        status: PostStatus::Draft,
        author: 1,
    }
}

#[test]
fn entries_and_meta_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("data");

    let id = {
        let store = DirectoryContentStore::open(&root).unwrap();
        let id = store.create_entry(&fields("Żurek"), "2024-01-01T00:00:00Z").unwrap();
        store.set_meta(id, meta_keys::EXTERNAL_ID, json!("17")).unwrap();
        id
    };
    assert!(root.join("store.json").is_file());

    let reopened = DirectoryContentStore::open(&root).unwrap();
    let found = reopened
        .find_entry(&EntryQuery::by_external_id(&"17".into()))
        .unwrap();
    assert_eq!(found, Some(id));
    assert_eq!(reopened.memory().entry(id).unwrap().title, "Żurek");

    let next = reopened.create_entry(&fields("Pierogi"), "2024-01-02T00:00:00Z").unwrap();
    assert_ne!(next, id);
}

#[test]
fn media_is_copied_under_media_dir() {
    let tmp = TempDir::new().unwrap();
    let store = DirectoryContentStore::open(tmp.path()).unwrap();
    let id = store.create_entry(&fields("Bigos"), "2024-01-01T00:00:00Z").unwrap();

    let source = tmp.path().join("download.tmp");
    fs::write(&source, b"jpegdata").unwrap();
    let media = store.store_media(&source, "bigos.jpg", id).unwrap();
    store.set_cover_image(id, media).unwrap();

    let stored = store.memory().media(media).unwrap();
    let path = stored.path.expect("media path recorded");
    assert!(path.starts_with(tmp.path().join("media")));
    assert_eq!(fs::read(&path).unwrap(), b"jpegdata");

    let reopened = DirectoryContentStore::open(tmp.path()).unwrap();
    assert!(reopened.has_cover_image(id));
}

#[test]
fn corrupt_store_file_is_reported() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("store.json"), "{ not json").unwrap();

    let err = DirectoryContentStore::open(tmp.path()).unwrap_err();
    assert!(matches!(err, StoreError::Persist(_)), "{err}");
}

#[test]
fn two_handles_on_one_dir_do_not_collide() {
    let tmp = TempDir::new().unwrap();
    let a = DirectoryContentStore::open(tmp.path()).unwrap();
    let b = DirectoryContentStore::open(tmp.path()).unwrap();

    let first = a.create_entry(&fields("Barszcz"), "2024-01-01T00:00:00Z").unwrap();
    a.set_meta(first, meta_keys::EXTERNAL_ID, json!("1")).unwrap();
    let second = b.create_entry(&fields("Kluski"), "2024-01-01T00:00:00Z").unwrap();
    b.set_meta(second, meta_keys::EXTERNAL_ID, json!("2")).unwrap();

    assert_ne!(first, second);
    let reopened = DirectoryContentStore::open(tmp.path()).unwrap();
    assert_eq!(reopened.memory().entries().len(), 2);
    for (external, id) in [("1", first), ("2", second)] {
        let found = reopened
            .find_entry(&EntryQuery::by_external_id(&external.into()))
            .unwrap();
        assert_eq!(found, Some(id));
    }
}

#[test]
fn pass_claim_excludes_other_handles() {
    let tmp = TempDir::new().unwrap();
    let a = DirectoryContentStore::open(tmp.path()).unwrap();
    let b = DirectoryContentStore::open(tmp.path()).unwrap();

    a.begin_pass().unwrap();
    assert!(matches!(a.begin_pass(), Err(StoreError::Busy)));
    assert!(matches!(b.begin_pass(), Err(StoreError::Busy)));
    let id = a.create_entry(&fields("Gołąbki"), "2024-01-01T00:00:00Z").unwrap();
    a.end_pass();

    b.begin_pass().unwrap();
    assert_eq!(b.memory().entry(id).unwrap().title, "Gołąbki");
    b.end_pass();
}

#[test]
fn failed_flush_leaves_no_orphan_entry() {
    let tmp = TempDir::new().unwrap();
    let store = DirectoryContentStore::open(tmp.path()).unwrap();
    store.begin_pass().unwrap();

    // A non-empty directory in place of store.json makes the rename fail.
    let blocker = tmp.path().join("store.json");
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("keep"), b"x").unwrap();

    let err = store.create_entry(&fields("Placki"), "2024-01-01T00:00:00Z").unwrap_err();
    assert!(matches!(err, StoreError::Persist(_)), "{err}");
    assert!(store.memory().entries().is_empty());

    fs::remove_dir_all(&blocker).unwrap();
    let id = store.create_entry(&fields("Placki"), "2024-01-01T00:00:00Z").unwrap();
    store.end_pass();

    let reopened = DirectoryContentStore::open(tmp.path()).unwrap();
    let entries = reopened.memory().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(id, EntryId(1));
}

#[test]
fn failed_media_copy_leaves_no_media_record() {
    let tmp = TempDir::new().unwrap();
    let store = DirectoryContentStore::open(tmp.path()).unwrap();
    let id = store.create_entry(&fields("Sernik"), "2024-01-01T00:00:00Z").unwrap();

    // A plain file where the media directory belongs.
    fs::write(tmp.path().join("media"), b"").unwrap();
    let source = tmp.path().join("download.tmp");
    fs::write(&source, b"jpegdata").unwrap();

    assert!(store.store_media(&source, "sernik.jpg", id).is_err());
    assert!(store.memory().snapshot().media.is_empty());

    let next = store.create_entry(&fields("Makowiec"), "2024-01-02T00:00:00Z").unwrap();
    assert_eq!(next, EntryId(id.0 + 1));
    let reopened = DirectoryContentStore::open(tmp.path()).unwrap();
    assert!(reopened.memory().snapshot().media.is_empty());
}
