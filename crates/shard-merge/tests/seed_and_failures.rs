mod common;

use std::fs;

use shard_core::errors::codes;
use shard_merge::{
    merge_campaign, merge_shard, read_counters, seed_store, MergeConfig,
};
use shard_store::{AccessMode, Container, Namespace, NativeContainer};
use tempfile::tempdir;

use common::{names, write_shard};

#[test]
fn single_shard_output_is_byte_identical() {
    let dir = tempdir().unwrap();
    let seed = write_shard(dir.path(), "only.evs", &[3, 4], &[3, 4]);
    let report = merge_campaign::<NativeContainer>(&MergeConfig::new(dir.path())).unwrap();
    assert!(report.shards.is_empty());
    assert_eq!(report.final_high_water_mark, Some(4));
    assert_eq!(
        fs::read(&seed).unwrap(),
        fs::read(dir.path().join("merged_h5.evs")).unwrap()
    );
    assert_eq!(report.seed.sha256, report.output_sha256);
    assert_eq!(report.seed.traces, 2);
    assert_eq!(report.seed.clouds, 2);
}

#[test]
fn seed_copy_failure_is_fatal() {
    let dir = tempdir().unwrap();
    let seed = write_shard(dir.path(), "a.evs", &[0], &[0]);
    let err = seed_store(&seed, &dir.path().join("missing_dir").join("out.evs")).unwrap_err();
    assert_eq!(err.code(), codes::SEED_COPY);
}

#[test]
fn unreadable_shard_aborts_the_run() {
    let dir = tempdir().unwrap();
    write_shard(dir.path(), "a.evs", &[0], &[0]);
    fs::write(dir.path().join("b.evs"), b"truncated").unwrap();
    write_shard(dir.path(), "c.evs", &[0], &[0]);

    let err = merge_campaign::<NativeContainer>(&MergeConfig::new(dir.path())).unwrap_err();
    assert_eq!(err.code(), codes::STORE_OPEN);
    assert!(!dir.path().join("merged_h5.evs").exists());
    assert!(dir.path().join("merged_h5.evs.partial").exists());
}

#[test]
fn merging_into_a_store_without_counters_fails() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("store.evs");
    NativeContainer::create(&store).unwrap().close().unwrap();
    let shard = write_shard(dir.path(), "b.evs", &[0], &[0]);
    let err = merge_shard::<NativeContainer>(&store, &shard).unwrap_err();
    assert_eq!(err.code(), codes::COUNTER_MISSING);
}

#[test]
fn collision_leaves_counters_at_last_commit() {
    let dir = tempdir().unwrap();
    write_shard(dir.path(), "a.evs", &[0], &[0]);
    // Trace 5 lands at 6 but only cloud 0 drives the mark (to 1).
    write_shard(dir.path(), "b.evs", &[5], &[0]);
    // Offset 2, trace 4 lands at 6 again.
    write_shard(dir.path(), "c.evs", &[4], &[]);

    let err = merge_campaign::<NativeContainer>(&MergeConfig::new(dir.path())).unwrap_err();
    assert_eq!(err.code(), codes::DATASET_EXISTS);

    let staging = dir.path().join("merged_h5.evs.partial");
    let store = NativeContainer::open(&staging, AccessMode::ReadOnly).unwrap();
    assert_eq!(read_counters(&store).unwrap().high_water_mark, 1);
    store.close().unwrap();
    assert!(names(&staging, Namespace::Get).contains(&"evt6_header".to_string()));
}

#[test]
fn unstaged_merge_writes_output_in_place() {
    let dir = tempdir().unwrap();
    write_shard(dir.path(), "a.evs", &[0], &[0]);
    write_shard(dir.path(), "b.evs", &[0], &[0]);
    let mut config = MergeConfig::new(dir.path());
    config.staging = false;
    config.hash_inputs = false;
    let report = merge_campaign::<NativeContainer>(&config).unwrap();
    assert!(report.output_sha256.is_none());
    assert!(report.shards[0].sha256.is_none());
    assert!(dir.path().join("merged_h5.evs").exists());
    assert!(!dir.path().join("merged_h5.evs.partial").exists());
}

#[test]
fn auxiliary_counters_survive_rewrites() {
    let dir = tempdir().unwrap();
    write_shard(dir.path(), "a.evs", &[0, 1], &[0, 1]);
    write_shard(dir.path(), "b.evs", &[0], &[0]);
    merge_campaign::<NativeContainer>(&MergeConfig::new(dir.path())).unwrap();
    let store =
        NativeContainer::open(&dir.path().join("merged_h5.evs"), AccessMode::ReadOnly).unwrap();
    let counters = read_counters(&store).unwrap();
    // Field 0 still carries the seed's own value.
    assert_eq!(counters.first, 2.0);
    assert_eq!(counters.second, 0.0);
    assert_eq!(counters.high_water_mark, 2);
}
