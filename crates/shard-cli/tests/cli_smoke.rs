use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use shard_merge::counters::META_DATASET;
use shard_store::{Container, Dataset, Namespace, NativeContainer};
use tempfile::tempdir;

fn shard_merge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shard-merge"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn shard-merge")
}

fn write_shard(dir: &Path, name: &str, locals: &[u64]) -> PathBuf {
    let path = dir.join(name);
    let mut store = NativeContainer::create(&path).unwrap();
    for &local in locals {
        let trace = Dataset::from_f64(vec![2], vec![local as f64, 3.7]).unwrap();
        for kind in ["header", "data"] {
            store
                .create_dataset(Namespace::Get, &format!("evt{local}_{kind}"), &trace)
                .unwrap();
        }
        let cloud = Dataset::from_f64(vec![1, 4], vec![0.0, 1.0, 2.0, local as f64]).unwrap();
        store
            .create_dataset(Namespace::Clouds, &format!("evt{local}_cloud"), &cloud)
            .unwrap();
    }
    let high_water = locals.iter().max().map_or(-1.0, |&m| m as f64);
    store
        .create_dataset(
            Namespace::Meta,
            META_DATASET,
            &Dataset::record(vec![locals.len() as f64, 0.0, high_water]),
        )
        .unwrap();
    store.close().unwrap();
    path
}

#[test]
fn plan_lists_seed_and_shards_without_touching_output() {
    let dir = tempdir().unwrap();
    write_shard(dir.path(), "run_b.evs", &[0]);
    write_shard(dir.path(), "run_a.evs", &[0, 1]);
    std::fs::write(dir.path().join("merged_h5.evs"), b"stale").unwrap();

    let output = shard_merge(&["plan", "--source", dir.path().to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(plan["seed"].as_str().unwrap().ends_with("run_a.evs"));
    assert_eq!(plan["shards"].as_array().unwrap().len(), 1);
    assert!(dir.path().join("merged_h5.evs").exists());
}

#[test]
fn merge_then_verify_round_trip() {
    let dir = tempdir().unwrap();
    write_shard(dir.path(), "run_a.evs", &[0, 1]);
    write_shard(dir.path(), "run_b.evs", &[0, 1, 2]);
    let report_path = dir.path().join("reports").join("merge.json");

    let output = shard_merge(&[
        "merge",
        "--source",
        dir.path().to_str().unwrap(),
        "--report",
        report_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["final_high_water_mark"], 4);
    assert_eq!(report["shards"][0]["offset"], 2);
    assert!(report_path.exists());

    let merged = dir.path().join("merged_h5.evs");
    let output = shard_merge(&["verify", "--store", merged.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let verdict: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(verdict["high_water_mark"], 4);
    assert_eq!(verdict["traces"], 5);
}

#[test]
fn verify_fails_on_mislabelled_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.evs");
    let mut store = NativeContainer::create(&path).unwrap();
    store
        .create_dataset(
            Namespace::Get,
            "evt3_header",
            &Dataset::from_f64(vec![2], vec![7.0, 0.0]).unwrap(),
        )
        .unwrap();
    store
        .create_dataset(
            Namespace::Get,
            "evt3_data",
            &Dataset::from_i16(vec![2], vec![7, 0]).unwrap(),
        )
        .unwrap();
    store
        .create_dataset(
            Namespace::Clouds,
            "evt3_cloud",
            &Dataset::from_f64(vec![4], vec![0.0, 0.0, 0.0, 3.0]).unwrap(),
        )
        .unwrap();
    store
        .create_dataset(Namespace::Meta, META_DATASET, &Dataset::record(vec![1.0, 0.0, 3.0]))
        .unwrap();
    store.close().unwrap();

    let output = shard_merge(&["verify", "--store", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let verdict: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(verdict["header_mismatches"][0]["key"], "evt3_header");
}

#[test]
fn missing_source_is_a_usage_error() {
    let output = shard_merge(&["merge"]);
    assert!(!output.status.success());
}
