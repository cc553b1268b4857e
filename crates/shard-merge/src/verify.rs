//! Post-merge consistency checks on a merged store.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use shard_core::ShardError;
use shard_store::{AccessMode, Container, Namespace};

use crate::counters::read_counters;
use crate::key::{EventKey, EventKind};

/// A header whose embedded event index disagrees with its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMismatch {
    /// Header dataset name.
    pub key: String,
    /// Index parsed from the key.
    pub expected: u64,
    /// First scalar actually stored.
    pub found: Option<f64>,
}

/// Findings of [`verify_store`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// High-water mark in the counter record.
    pub high_water_mark: i64,
    /// Distinct events with a header or data array.
    pub traces: usize,
    /// Distinct events with a cloud.
    pub clouds: usize,
    /// Largest cloud index present.
    pub max_cloud_index: Option<u64>,
    /// Headers whose embedded index disagrees with their key.
    pub header_mismatches: Vec<HeaderMismatch>,
    /// Headers with no `_data` twin.
    pub missing_data: Vec<u64>,
    /// Data arrays with no `_header` twin.
    pub missing_header: Vec<u64>,
    /// Events traced in `get` but absent from `clouds`. Informational.
    pub traces_without_cloud: Vec<u64>,
    /// Events in `clouds` but absent from `get`. Informational.
    pub clouds_without_trace: Vec<u64>,
    /// Keys outside the per-event naming convention, as `namespace/key`.
    pub unrecognized_keys: Vec<String>,
}

impl VerifyReport {
    /// Whether the high-water mark covers every cloud index.
    pub fn high_water_covers_clouds(&self) -> bool {
        self.max_cloud_index
            .map_or(true, |max| max as i64 <= self.high_water_mark)
    }

    /// True unless a header is mislabelled, a trace half is missing, or the
    /// high-water mark trails the clouds. Cross-namespace gaps do not count.
    pub fn is_consistent(&self) -> bool {
        self.header_mismatches.is_empty()
            && self.missing_data.is_empty()
            && self.missing_header.is_empty()
            && self.high_water_covers_clouds()
    }
}

/// Re-opens a merged store read-only and checks its invariants.
pub fn verify_store<C: Container>(path: &Path) -> Result<VerifyReport, ShardError> {
    let store = C::open(path, AccessMode::ReadOnly)?;
    let counters = read_counters(&store)?;

    let mut headers = BTreeMap::new();
    let mut data = BTreeSet::new();
    let mut clouds = BTreeSet::new();
    let mut unrecognized_keys = Vec::new();

    for name in store.dataset_names(Namespace::Get)? {
        match EventKey::parse(&name) {
            Ok(key) if key.kind == EventKind::Header => {
                headers.insert(key.index, name);
            }
            Ok(key) if key.kind == EventKind::Data => {
                data.insert(key.index);
            }
            _ => unrecognized_keys.push(format!("{}/{name}", Namespace::Get)),
        }
    }
    for name in store.dataset_names(Namespace::Clouds)? {
        match EventKey::parse(&name) {
            Ok(key) if key.kind == EventKind::Cloud => {
                clouds.insert(key.index);
            }
            _ => unrecognized_keys.push(format!("{}/{name}", Namespace::Clouds)),
        }
    }

    let mut header_mismatches = Vec::new();
    for (index, name) in &headers {
        let found = store.read_dataset(Namespace::Get, name)?.first_scalar();
        if found != Some(*index as f64) {
            header_mismatches.push(HeaderMismatch {
                key: name.clone(),
                expected: *index,
                found,
            });
        }
    }
    store.close()?;

    let traced: BTreeSet<u64> = headers.keys().copied().chain(data.iter().copied()).collect();
    Ok(VerifyReport {
        high_water_mark: counters.high_water_mark,
        traces: traced.len(),
        clouds: clouds.len(),
        max_cloud_index: clouds.last().copied(),
        header_mismatches,
        missing_data: headers.keys().filter(|i| !data.contains(*i)).copied().collect(),
        missing_header: data.iter().filter(|i| !headers.contains_key(*i)).copied().collect(),
        traces_without_cloud: traced.difference(&clouds).copied().collect(),
        clouds_without_trace: clouds.difference(&traced).copied().collect(),
        unrecognized_keys,
    })
}
