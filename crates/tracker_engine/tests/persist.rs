use std::fs;

use tempfile::TempDir;
use tracker_engine::{ensure_dir, write_atomically};

#[test]
fn creates_missing_directory() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("a").join("b");
    ensure_dir(&nested).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("history.ron");

    write_atomically(&target, "first").unwrap();
    write_atomically(&target, "second").unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "second");
    let entries = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn fails_when_parent_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("not_a_dir");
    fs::write(&file, "x").unwrap();

    assert!(write_atomically(&file.join("history.ron"), "data").is_err());
}
