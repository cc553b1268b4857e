#![cfg(feature = "hdf5")]

use std::path::{Path, PathBuf};

use shard_merge::counters::META_DATASET;
use shard_merge::{merge_campaign, read_counters, verify_store, MergeConfig};
use shard_store::{AccessMode, Container, Dataset, ElementType, Hdf5Container, Namespace};
use tempfile::tempdir;

fn raw_trace(local: u64) -> Dataset {
    Dataset::from_f64(vec![2, 3], vec![local as f64, 10.9, -3.2, 40_000.0, 1.0, -7.9]).unwrap()
}

fn write_h5_shard(dir: &Path, name: &str, locals: &[u64]) -> PathBuf {
    let path = dir.join(name);
    let mut store = Hdf5Container::create(&path).unwrap();
    for &local in locals {
        for kind in ["header", "data"] {
            store
                .create_dataset(Namespace::Get, &format!("evt{local}_{kind}"), &raw_trace(local))
                .unwrap();
        }
        let cloud = Dataset::from_f64(vec![1, 4], vec![0.5, 1.5, 2.5, local as f64]).unwrap();
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
fn two_h5_shards_renumber_past_seed() {
    let dir = tempdir().unwrap();
    write_h5_shard(dir.path(), "a.h5", &[0]);
    write_h5_shard(dir.path(), "b.h5", &[0, 1]);

    let report = merge_campaign::<Hdf5Container>(&MergeConfig::new(dir.path())).unwrap();
    let merged = dir.path().join("merged_h5.h5");
    assert_eq!(report.output, merged);
    assert_eq!(report.shards[0].offset.value(), 1);
    assert_eq!(report.final_high_water_mark, Some(2));

    let store = Hdf5Container::open(&merged, AccessMode::ReadOnly).unwrap();
    assert_eq!(
        store.dataset_names(Namespace::Clouds).unwrap(),
        vec!["evt0_cloud", "evt1_cloud", "evt2_cloud"]
    );
    let header = store.read_dataset(Namespace::Get, "evt2_header").unwrap();
    assert_eq!(header.element_type(), ElementType::Float64);
    assert_eq!(header.first_scalar(), Some(2.0));
    let data = store.read_dataset(Namespace::Get, "evt2_data").unwrap();
    assert_eq!(data.element_type(), ElementType::Int16);
    assert_eq!(data.to_f64_vec(), vec![1.0, 10.0, -3.0, 32_767.0, 1.0, -7.0]);
    assert_eq!(read_counters(&store).unwrap().high_water_mark, 2);
    store.close().unwrap();

    let verdict = verify_store::<Hdf5Container>(&merged).unwrap();
    assert!(verdict.is_consistent(), "{verdict:?}");
    assert_eq!(verdict.traces, 3);
}
