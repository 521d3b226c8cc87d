use std::fs;

use exu_store::{archive_tree, in_archive, ArchiveCache};
use tempfile::tempdir;

#[test]
fn archived_trees_answer_membership() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("results");
    fs::create_dir_all(tree.join("Cliff/alpha-0.5")).unwrap();
    fs::write(tree.join("Cliff/alpha-0.5/returns.csv"), "0,1\n").unwrap();
    fs::write(tree.join("Cliff/notes.txt"), "ok").unwrap();

    let archive = dir.path().join("results.zip");
    archive_tree(&tree, &archive).unwrap();

    assert!(in_archive(&archive, "Cliff/alpha-0.5/returns.csv"));
    assert!(in_archive(&archive, "Cliff/notes.txt"));
    assert!(!in_archive(&archive, "Cliff/alpha-0.25/returns.csv"));
}

#[test]
fn cached_lookups_agree_with_direct_ones() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("results");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("data.csv"), "0\n").unwrap();
    let archive = dir.path().join("results.zip");
    archive_tree(&tree, &archive).unwrap();

    let mut cache = ArchiveCache::new();
    assert!(cache.in_archive(&archive, "data.csv"));
    assert!(!cache.in_archive(&archive, "other.csv"));
    // cached answer survives the archive disappearing
    fs::remove_file(&archive).unwrap();
    assert!(cache.in_archive(&archive, "data.csv"));
    assert!(!in_archive(&archive, "data.csv"));
}

#[test]
fn absent_archives_never_raise() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("nope.zip");
    assert!(!in_archive(&archive, "anything"));

    // a corrupt archive answers false too
    fs::write(&archive, "not a zip").unwrap();
    assert!(!in_archive(&archive, "anything"));
}
