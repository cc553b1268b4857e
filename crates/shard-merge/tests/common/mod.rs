#![allow(dead_code)]

use std::path::{Path, PathBuf};

use shard_merge::counters::META_DATASET;
use shard_store::{Container, Dataset, Namespace, NativeContainer};

/// Raw trace for a local event: two channels of four samples, with
/// fractional and out-of-range samples so narrowing is visible.
pub fn raw_trace(local: u64) -> Dataset {
    Dataset::from_f64(
        vec![2, 4],
        vec![local as f64, 10.9, -3.2, 40_000.0, 1.0, 2.5, -7.9, 0.0],
    )
    .unwrap()
}

pub fn cloud(local: u64) -> Dataset {
    Dataset::from_f64(
        vec![3, 4],
        vec![
            0.5, 1.5, 2.5, local as f64, //
            3.5, 4.5, 5.5, 6.5, //
            7.5, 8.5, 9.5, 10.5,
        ],
    )
    .unwrap()
}

/// Writes a native shard holding header/data pairs for `traces`, clouds for
/// `clouds`, and a meta record whose high-water mark is the largest cloud
/// index (or `-1` when there are none).
pub fn write_shard(dir: &Path, name: &str, traces: &[u64], clouds: &[u64]) -> PathBuf {
    let path = dir.join(name);
    let mut store = NativeContainer::create(&path).unwrap();
    for &local in traces {
        let trace = raw_trace(local);
        store
            .create_dataset(Namespace::Get, &format!("evt{local}_header"), &trace)
            .unwrap();
        store
            .create_dataset(Namespace::Get, &format!("evt{local}_data"), &trace)
            .unwrap();
    }
    for &local in clouds {
        store
            .create_dataset(Namespace::Clouds, &format!("evt{local}_cloud"), &cloud(local))
            .unwrap();
    }
    let high_water = clouds.iter().max().map_or(-1.0, |&m| m as f64);
    store
        .create_dataset(
            Namespace::Meta,
            META_DATASET,
            &Dataset::record(vec![traces.len() as f64, 0.0, high_water]),
        )
        .unwrap();
    store.close().unwrap();
    path
}

/// Adds an arbitrary dataset to an existing shard.
pub fn add_dataset(path: &Path, namespace: Namespace, name: &str, dataset: &Dataset) {
    let mut store =
        NativeContainer::open(path, shard_store::AccessMode::ReadWrite).unwrap();
    store.create_dataset(namespace, name, dataset).unwrap();
    store.close().unwrap();
}

pub fn names(path: &Path, namespace: Namespace) -> Vec<String> {
    let store = NativeContainer::open(path, shard_store::AccessMode::ReadOnly).unwrap();
    store.dataset_names(namespace).unwrap()
}

pub fn read(path: &Path, namespace: Namespace, name: &str) -> Dataset {
    let store = NativeContainer::open(path, shard_store::AccessMode::ReadOnly).unwrap();
    store.read_dataset(namespace, name).unwrap()
}
