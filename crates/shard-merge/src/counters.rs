//! The `meta/meta` bookkeeping record.
//!
//! The record is three wide scalars; the third is the high-water mark, the
//! largest global event index committed so far. It is read once at the start
//! of a shard pass and rewritten once after every per-event dataset of that
//! shard has been written.

use serde::{Deserialize, Serialize};
use shard_core::errors::{codes, ErrorInfo, ShardError};
use shard_store::{Container, Dataset, Namespace};

/// Name of the counter record inside the `meta` namespace.
pub const META_DATASET: &str = "meta";

const HIGH_WATER_FIELD: usize = 2;

/// Largest integer every `f64` below it represents exactly.
pub const MAX_EXACT_INDEX: u64 = 1 << 53;

/// Typed view of the counter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    /// Auxiliary counter in field 0, carried through unchanged.
    pub first: f64,
    /// Auxiliary counter in field 1, carried through unchanged.
    pub second: f64,
    /// Largest global index committed so far. `-1` marks an empty store.
    pub high_water_mark: i64,
    /// Fields beyond the third, preserved on rewrite.
    #[serde(default)]
    pub trailing: Vec<f64>,
}

fn counter_error(code: &str, message: impl Into<String>) -> ShardError {
    ShardError::Counter(ErrorInfo::new(code, message))
}

impl Counters {
    /// Decodes a stored record.
    pub fn from_record(values: &[f64]) -> Result<Self, ShardError> {
        if values.len() <= HIGH_WATER_FIELD {
            return Err(counter_error(
                codes::COUNTER_CORRUPT,
                format!("counter record has {} fields, expected at least 3", values.len()),
            ));
        }
        let raw = values[HIGH_WATER_FIELD];
        if !raw.is_finite() || raw.fract() != 0.0 || raw < -1.0 || raw >= MAX_EXACT_INDEX as f64 {
            return Err(ShardError::Counter(
                ErrorInfo::new(codes::COUNTER_CORRUPT, "high-water mark is not a usable index")
                    .with_context("value", raw.to_string()),
            ));
        }
        Ok(Self {
            first: values[0],
            second: values[1],
            high_water_mark: raw as i64,
            trailing: values[HIGH_WATER_FIELD + 1..].to_vec(),
        })
    }

    /// Encodes the record for storage.
    pub fn to_record(&self) -> Vec<f64> {
        let mut values = vec![self.first, self.second, self.high_water_mark as f64];
        values.extend_from_slice(&self.trailing);
        values
    }

    /// Counters after a shard whose largest cloud index was `max_seen`.
    ///
    /// The high-water mark never moves backwards, including for shards that
    /// contribute no clouds.
    pub fn advance(&self, max_seen: Option<u64>) -> Self {
        let mut next = self.clone();
        if let Some(seen) = max_seen {
            // max_seen came from Offset::apply, which keeps it below MAX_EXACT_INDEX.
            next.high_water_mark = next.high_water_mark.max(seen as i64);
        }
        next
    }
}

/// The amount added to a shard's local indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offset(u64);

impl Offset {
    /// Wraps a raw offset.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// `high_water_mark + 1`.
    pub fn after(counters: &Counters) -> Self {
        // from_record bounds the mark to [-1, 2^53), so the sum is non-negative.
        Self((counters.high_water_mark + 1) as u64)
    }

    /// The raw offset.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Maps a local index to its global index.
    pub fn apply(&self, local: u64) -> Result<u64, ShardError> {
        match local.checked_add(self.0) {
            Some(global) if global < MAX_EXACT_INDEX => Ok(global),
            _ => Err(ShardError::Counter(
                ErrorInfo::new(codes::COUNTER_OVERFLOW, "global index out of range")
                    .with_context("local", local.to_string())
                    .with_context("offset", self.0.to_string()),
            )),
        }
    }
}

/// Reads the counter record from a store.
pub fn read_counters<C: Container>(store: &C) -> Result<Counters, ShardError> {
    if !store.contains(Namespace::Meta, META_DATASET)? {
        return Err(ShardError::Counter(
            ErrorInfo::new(codes::COUNTER_MISSING, "store has no meta/meta record")
                .with_path(store.path()),
        ));
    }
    let record = store.read_dataset(Namespace::Meta, META_DATASET)?;
    Counters::from_record(&record.to_f64_vec()).map_err(|err| match err {
        ShardError::Counter(info) => ShardError::Counter(info.with_path(store.path())),
        other => other,
    })
}

/// Replaces the counter record (delete, then recreate as a wide record).
pub fn write_counters<C: Container>(store: &mut C, counters: &Counters) -> Result<(), ShardError> {
    if store.contains(Namespace::Meta, META_DATASET)? {
        store.unlink(Namespace::Meta, META_DATASET)?;
    }
    store.create_dataset(
        Namespace::Meta,
        META_DATASET,
        &Dataset::record(counters.to_record()),
    )
}
