#![deny(missing_docs)]
//! Merge engine for per-run detector event shards.
//!
//! A campaign directory holds one event store per simulation run, each
//! numbering its events from zero. [`merge_campaign`] seeds the merged store
//! with the lexicographically first shard and then appends every other shard
//! with its event indices shifted past the merged store's high-water mark.

pub mod config;
pub mod counters;
pub mod discovery;
pub mod engine;
pub mod key;
pub mod report;
pub mod seed;
pub mod verify;

pub use config::{MergeConfig, MergeLayout};
pub use counters::{read_counters, write_counters, Counters, Offset};
pub use discovery::{discover_shards, plan_campaign, MergePlan};
pub use engine::{merge_campaign, merge_shard};
pub use key::{EventKey, EventKind, KeyError};
pub use report::{MergeReport, SeedSummary, ShardOutcome, SkipReason, SkippedKey};
pub use seed::seed_store;
pub use verify::{verify_store, HeaderMismatch, VerifyReport};
