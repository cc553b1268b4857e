//! Merge configuration and the filesystem layout it resolves to.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shard_core::errors::{codes, ErrorInfo, ShardError};
use shard_core::from_yaml_slice;

/// File stem of the merged store when no output name is configured.
pub const DEFAULT_OUTPUT_STEM: &str = "merged_h5";

/// Suffix appended to the output path while a merge is in progress.
pub const STAGING_SUFFIX: &str = "partial";

/// YAML-configurable parameters governing a campaign merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Directory holding the shard containers; the merged store is written here too.
    pub source_dir: PathBuf,
    /// File name of the merged store. Defaults to `merged_h5.<extension>`.
    #[serde(default)]
    pub output_name: Option<String>,
    /// Container extension to discover, without the dot. Defaults to the backend's.
    #[serde(default)]
    pub extension: Option<String>,
    /// Merge into `<output>.partial` and rename on success.
    #[serde(default = "default_staging")]
    pub staging: bool,
    /// Where to write the JSON merge report, if anywhere.
    #[serde(default)]
    pub report: Option<PathBuf>,
    /// Record SHA-256 digests of every shard and of the merged store.
    #[serde(default = "default_hash_inputs")]
    pub hash_inputs: bool,
}

fn default_staging() -> bool {
    true
}

fn default_hash_inputs() -> bool {
    true
}

fn config_error(code: &str, message: impl Into<String>) -> ShardError {
    ShardError::Config(ErrorInfo::new(code, message))
}

impl MergeConfig {
    /// Default configuration for a source directory.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_name: None,
            extension: None,
            staging: default_staging(),
            report: None,
            hash_inputs: default_hash_inputs(),
        }
    }

    /// Reads a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ShardError> {
        let bytes = fs::read(path).map_err(|err| {
            ShardError::Config(ErrorInfo::new(codes::CONFIG_READ, err.to_string()).with_path(path))
        })?;
        from_yaml_slice(&bytes).map_err(|err| {
            ShardError::Config(
                ErrorInfo::new(codes::CONFIG_READ, err.info().message.clone()).with_path(path),
            )
        })
    }

    /// Resolves and validates the paths used by a merge.
    pub fn layout(&self, backend_extension: &str) -> Result<MergeLayout, ShardError> {
        let extension = self
            .extension
            .clone()
            .unwrap_or_else(|| backend_extension.to_string());
        if extension.is_empty() || extension.starts_with('.') {
            return Err(config_error(
                codes::CONFIG_INVALID,
                format!("extension `{extension}` must be non-empty and given without a dot"),
            ));
        }
        let output_name = self
            .output_name
            .clone()
            .unwrap_or_else(|| format!("{DEFAULT_OUTPUT_STEM}.{extension}"));
        if output_name.is_empty() || output_name.contains(|c: char| c == '/' || c == '\\') {
            return Err(config_error(
                codes::CONFIG_INVALID,
                format!("output name `{output_name}` must be a bare file name"),
            ));
        }
        let output_path = self.source_dir.join(&output_name);
        let staging_path = self
            .staging
            .then(|| self.source_dir.join(format!("{output_name}.{STAGING_SUFFIX}")));
        Ok(MergeLayout {
            source_dir: self.source_dir.clone(),
            extension,
            output_name,
            output_path,
            staging_path,
        })
    }
}

/// Resolved filesystem layout of one merge invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeLayout {
    /// Directory scanned for shards; the output lands here too.
    pub source_dir: PathBuf,
    /// Shard extension, without the dot.
    pub extension: String,
    /// Bare file name of the merged store.
    pub output_name: String,
    /// Final location of the merged store.
    pub output_path: PathBuf,
    /// Where the merge runs before the rename, when staging is on.
    pub staging_path: Option<PathBuf>,
}

impl MergeLayout {
    /// The store the engine writes into while shards are being merged.
    pub fn work_path(&self) -> &Path {
        self.staging_path.as_deref().unwrap_or(&self.output_path)
    }
}
