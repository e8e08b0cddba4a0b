//! File Storage Tests
//!
//! Loading and saving control table bytes on disk.

use std::path::Path;

use bioloid::storage::{FileStorage, Storage};
use bioloid::BioloidError;
use tempfile::tempdir;

fn counting_bytes() -> [u8; 32] {
    let mut buf = [0u8; 32];
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = i as u8;
    }
    buf
}

// =============================================================================
// Load
// =============================================================================

#[test]
fn test_load_missing_file_fails() {
    let dir = tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path().join("missing.ctl"));

    let mut buf = [0x5au8; 32];
    let err = storage.load(0, &mut buf).unwrap_err();
    assert!(matches!(err, BioloidError::Storage(_)));
    assert_eq!(buf, [0x5a; 32]);
}

#[test]
fn test_load_from_offsets() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("table.ctl");
    std::fs::write(&path, counting_bytes()).unwrap();
    let mut storage = FileStorage::new(&path);

    // Reading past the end of the file fails and leaves the buffer alone
    let mut buf = [0u8; 32];
    assert!(storage.load(10, &mut buf).is_err());
    assert_eq!(buf, [0u8; 32]);

    storage.load(0, &mut buf).unwrap();
    assert_eq!(buf, counting_bytes());

    let mut tail = [0u8; 4];
    storage.load(28, &mut tail).unwrap();
    assert_eq!(tail, [28, 29, 30, 31]);
}

// =============================================================================
// Save
// =============================================================================

#[test]
fn test_save_creates_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.ctl");
    let mut storage = FileStorage::new(&path);

    storage.save(0, &counting_bytes()).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), counting_bytes().to_vec());
    assert_eq!(storage.path(), path.as_path());
}

#[test]
fn test_save_at_offset_keeps_other_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("table.ctl");
    let mut storage = FileStorage::new(&path);

    storage.save(0, &counting_bytes()).unwrap();
    storage.save(4, &[0xaa, 0xbb]).unwrap();

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk.len(), 32);
    assert_eq!(&on_disk[..8], &[0, 1, 2, 3, 0xaa, 0xbb, 6, 7]);
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path().join("table.ctl"));

    storage.save(0, &[1, 2, 3, 4, 5]).unwrap();
    let mut buf = [0u8; 5];
    storage.load(0, &mut buf).unwrap();
    assert_eq!(buf, [1, 2, 3, 4, 5]);
}

#[test]
fn test_save_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path().join("no_such_dir").join("table.ctl"));

    let err = storage.save(0, &[0u8; 32]).unwrap_err();
    assert!(matches!(err, BioloidError::Storage(_)));
}

#[test]
fn test_save_to_full_device_fails() {
    if !Path::new("/dev/full").exists() {
        return;
    }
    let mut storage = FileStorage::new("/dev/full");
    assert!(storage.save(0, &[0u8; 32]).is_err());
}
