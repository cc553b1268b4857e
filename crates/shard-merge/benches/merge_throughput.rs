use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shard_merge::counters::META_DATASET;
use shard_merge::{merge_campaign, MergeConfig};
use shard_store::{Container, Dataset, Namespace, NativeContainer};
use tempfile::tempdir;

fn write_shard(dir: &std::path::Path, name: &str, events: u64) {
    let mut store = NativeContainer::create(&dir.join(name)).unwrap();
    for local in 0..events {
        let samples: Vec<f64> = (0..512).map(|s| (s as f64 * 0.37) + local as f64).collect();
        let trace = Dataset::from_f64(vec![4, 128], samples).unwrap();
        store
            .create_dataset(Namespace::Get, &format!("evt{local}_data"), &trace)
            .unwrap();
        let cloud = Dataset::from_f64(vec![32, 4], vec![local as f64; 128]).unwrap();
        store
            .create_dataset(Namespace::Clouds, &format!("evt{local}_cloud"), &cloud)
            .unwrap();
    }
    store
        .create_dataset(
            Namespace::Meta,
            META_DATASET,
            &Dataset::record(vec![events as f64, 0.0, events as f64 - 1.0]),
        )
        .unwrap();
    store.close().unwrap();
}

fn bench_merge(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    for shard in 0..4 {
        write_shard(dir.path(), &format!("run_{shard:02}.evs"), 64);
    }
    let mut config = MergeConfig::new(dir.path());
    config.hash_inputs = false;

    c.bench_function("merge_four_shards", |b| {
        b.iter(|| {
            let report = merge_campaign::<NativeContainer>(black_box(&config)).unwrap();
            black_box(report);
        })
    });
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
