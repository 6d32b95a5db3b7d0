use std::fs;

use recipe_sync_engine::{ensure_output_dir, AtomicFileWriter, DirLock, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_data_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("data");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("store.json", "{}").unwrap();
    assert_eq!(first.file_name().unwrap(), "store.json");
    assert_eq!(fs::read_to_string(&first).unwrap(), "{}");

    let second = writer.write("store.json", "{\"next_id\":1}").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "{\"next_id\":1}");
}

#[test]
fn binary_write_round_trips_bytes() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("media"));

    let target = writer.write("3-cover.jpg", [0xFFu8, 0xD8, 0xFF]).unwrap();
    assert_eq!(fs::read(&target).unwrap(), vec![0xFF, 0xD8, 0xFF]);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("store.json", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("store.json").exists());
}

#[test]
fn dir_lock_is_exclusive_until_dropped() {
    let temp = TempDir::new().unwrap();

    let held = DirLock::try_acquire(temp.path(), ".store.lock").unwrap();
    let err = DirLock::try_acquire(temp.path(), ".store.lock").unwrap_err();
    assert!(matches!(err, PersistError::Locked(ref path) if path == held.path()));

    drop(held);
    let again = DirLock::try_acquire(temp.path(), ".store.lock").unwrap();
    assert!(again.path().is_file());
}
