//! Shard discovery: which containers get merged, and in which order.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shard_core::errors::{codes, ErrorInfo, ShardError};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::MergeLayout;

/// Ordered merge schedule for one source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePlan {
    /// Lexicographically first shard; copied verbatim to seed the merged store.
    pub seed: PathBuf,
    /// Remaining shards, in the order their global indices are assigned.
    pub shards: Vec<PathBuf>,
    /// Final location of the merged store.
    pub output: PathBuf,
}

impl MergePlan {
    /// Number of shards including the seed.
    pub fn shard_count(&self) -> usize {
        self.shards.len() + 1
    }
}

fn discovery_error(code: &str, err: impl ToString, path: &Path) -> ShardError {
    ShardError::Discovery(ErrorInfo::new(code, err.to_string()).with_path(path))
}

fn is_file(entry: &DirEntry) -> bool {
    if !entry.path_is_symlink() {
        return entry.file_type().is_file();
    }
    match fs::metadata(entry.path()) {
        Ok(target) => target.is_file(),
        Err(err) => {
            warn!(path = %entry.path().display(), error = %err, "skipping unreadable shard link");
            false
        }
    }
}

fn list_shards(layout: &MergeLayout) -> Result<Vec<PathBuf>, ShardError> {
    let mut shards = Vec::new();
    let walker = WalkDir::new(&layout.source_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Depth 0 is the source directory itself.
            Err(err) if err.depth() == 0 => {
                return Err(discovery_error(codes::READ_DIR, err, &layout.source_dir))
            }
            Err(err) => {
                let path = err.path().unwrap_or(&layout.source_dir).to_path_buf();
                warn!(path = %path.display(), error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.extension().and_then(OsStr::to_str) != Some(layout.extension.as_str()) {
            continue;
        }
        if entry.file_name() == OsStr::new(&layout.output_name) {
            debug!(path = %path.display(), "excluding existing merged output");
            continue;
        }
        if !is_file(&entry) {
            continue;
        }
        shards.push(path.to_path_buf());
    }
    Ok(shards)
}

/// Lists the merge schedule without touching the filesystem.
pub fn plan_campaign(layout: &MergeLayout) -> Result<MergePlan, ShardError> {
    let mut shards = list_shards(layout)?.into_iter();
    let seed = shards.next().ok_or_else(|| {
        ShardError::Discovery(
            ErrorInfo::new(codes::NO_SHARDS_FOUND, "no shard containers found")
                .with_path(&layout.source_dir)
                .with_context("extension", layout.extension.clone()),
        )
    })?;
    Ok(MergePlan {
        seed,
        shards: shards.collect(),
        output: layout.output_path.clone(),
    })
}

/// Plans the merge and removes any previous merged output or stale staging
/// file, so every run rebuilds the merged store from scratch.
pub fn discover_shards(layout: &MergeLayout) -> Result<MergePlan, ShardError> {
    let plan = plan_campaign(layout)?;
    let stale = std::iter::once(&layout.output_path).chain(layout.staging_path.as_ref());
    for path in stale {
        if path.exists() {
            warn!(path = %path.display(), "merged output already exists; it will be overwritten");
            fs::remove_file(path).map_err(|err| discovery_error(codes::REMOVE_OUTPUT, err, path))?;
        }
    }
    Ok(plan)
}
