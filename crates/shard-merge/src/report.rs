//! The JSON report produced by a campaign merge.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shard_core::errors::{codes, ErrorInfo, ShardError};
use shard_core::{from_json_slice, to_canonical_json_bytes, SchemaVersion};
use shard_store::Namespace;

use crate::counters::Offset;
use crate::key::KeyError;

/// Schema of the JSON merge report.
pub const REPORT_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Why a dataset was left out of the merged store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The key does not follow the `evt<index>_<role>` convention.
    MalformedKey(KeyError),
    /// A well-formed key whose role does not belong in this namespace.
    UnexpectedKind,
    /// A raw trace with no elements has no event-index field to relabel.
    EmptyTrace,
}

/// One dataset that was reported and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedKey {
    /// Namespace the key was found in.
    pub namespace: Namespace,
    /// Dataset name as stored in the shard.
    pub key: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// The seed shard as copied into the merged store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    /// Seed shard path.
    pub shard: PathBuf,
    /// `None` when the seed carries no counter record.
    pub high_water_mark: Option<i64>,
    /// Trace data arrays carried over from the seed.
    pub traces: usize,
    /// Clouds carried over from the seed.
    pub clouds: usize,
    /// Digest of the seed shard, when hashing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Result of merging one non-seed shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardOutcome {
    /// Shard path.
    pub shard: PathBuf,
    /// Offset added to every local index of the shard.
    pub offset: Offset,
    /// High-water mark read before the shard was merged.
    pub high_water_before: i64,
    /// High-water mark committed after the shard.
    pub high_water_after: i64,
    /// Header and data pairs written.
    pub traces_copied: usize,
    /// Clouds written.
    pub clouds_copied: usize,
    /// Largest global index given to a trace.
    pub max_trace_index: Option<u64>,
    /// Largest global index given to a cloud.
    pub max_cloud_index: Option<u64>,
    /// Datasets left out, with reasons.
    #[serde(default)]
    pub skipped: Vec<SkippedKey>,
    /// Digest of the shard, when hashing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ShardOutcome {
    pub(crate) fn new(shard: &Path, offset: Offset, high_water_before: i64) -> Self {
        Self {
            shard: shard.to_path_buf(),
            offset,
            high_water_before,
            high_water_after: high_water_before,
            traces_copied: 0,
            clouds_copied: 0,
            max_trace_index: None,
            max_cloud_index: None,
            skipped: Vec::new(),
            sha256: None,
        }
    }
}

/// Summary of a campaign merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Report layout version.
    pub schema: SchemaVersion,
    /// Path of the merged store.
    pub output: PathBuf,
    /// The shard copied to seed the store.
    pub seed: SeedSummary,
    /// Every other shard, in merge order.
    pub shards: Vec<ShardOutcome>,
    /// High-water mark of the finished store; `None` if the seed had no counters.
    pub final_high_water_mark: Option<i64>,
    /// Digest of the merged store, when hashing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_sha256: Option<String>,
}

impl MergeReport {
    /// Every skipped dataset across all merged shards.
    pub fn skipped(&self) -> impl Iterator<Item = &SkippedKey> {
        self.shards.iter().flat_map(|outcome| outcome.skipped.iter())
    }

    /// Events copied from non-seed shards (trace pairs plus clouds).
    pub fn events_merged(&self) -> usize {
        self.shards
            .iter()
            .map(|outcome| outcome.traces_copied + outcome.clouds_copied)
            .sum()
    }

    /// Reads a report written by [`MergeReport::store`].
    pub fn load(path: &Path) -> Result<Self, ShardError> {
        let bytes = fs::read(path).map_err(|err| {
            ShardError::Serde(ErrorInfo::new(codes::STORE_READ, err.to_string()).with_path(path))
        })?;
        from_json_slice(&bytes).map_err(|err| match err {
            ShardError::Serde(info) => ShardError::Serde(info.with_path(path)),
            other => other,
        })
    }

    /// Writes the report as canonical JSON.
    pub fn store(&self, path: &Path) -> Result<(), ShardError> {
        let bytes = to_canonical_json_bytes(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                ShardError::Serde(
                    ErrorInfo::new(codes::STORE_WRITE, err.to_string()).with_path(parent),
                )
            })?;
        }
        fs::write(path, bytes).map_err(|err| {
            ShardError::Serde(ErrorInfo::new(codes::STORE_WRITE, err.to_string()).with_path(path))
        })
    }
}
