//! Structured error types shared across the shard merge crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ShardError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, dataset names, indices).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Records a filesystem path under the `path` context key.
    pub fn with_path(self, path: &Path) -> Self {
        self.with_context("path", path.display().to_string())
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the merge engine.
///
/// Every variant is fatal for the invocation that produced it. Per-record
/// problems (malformed dataset keys) are reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ShardError {
    /// Source directory scanning and output cleanup.
    #[error("discovery error: {0}")]
    Discovery(ErrorInfo),
    /// Seeding the merged store from the first shard.
    #[error("seed error: {0}")]
    Seed(ErrorInfo),
    /// Container open, read and write failures.
    #[error("store error: {0}")]
    Store(ErrorInfo),
    /// High-water mark and auxiliary counter bookkeeping.
    #[error("counter error: {0}")]
    Counter(ErrorInfo),
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization of reports and container images.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ShardError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ShardError::Discovery(info)
            | ShardError::Seed(info)
            | ShardError::Store(info)
            | ShardError::Counter(info)
            | ShardError::Config(info)
            | ShardError::Serde(info) => info,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }
}

/// Stable error codes emitted by the workspace.
pub mod codes {
    /// The source directory holds no shard containers.
    pub const NO_SHARDS_FOUND: &str = "discovery.no_shards_found";
    /// The source directory could not be listed.
    pub const READ_DIR: &str = "discovery.read_dir";
    /// A pre-existing merged output could not be removed.
    pub const REMOVE_OUTPUT: &str = "discovery.remove_output";
    /// The seed shard could not be copied.
    pub const SEED_COPY: &str = "seed.copy";
    /// A container could not be opened.
    pub const STORE_OPEN: &str = "store.open";
    /// A dataset could not be read.
    pub const STORE_READ: &str = "store.read";
    /// A dataset or container image could not be written.
    pub const STORE_WRITE: &str = "store.write";
    /// A dataset with the requested name already exists.
    pub const DATASET_EXISTS: &str = "store.dataset_exists";
    /// The requested dataset does not exist.
    pub const DATASET_MISSING: &str = "store.dataset_missing";
    /// Shape and element count disagree.
    pub const DATASET_SHAPE: &str = "store.dataset_shape";
    /// A mutation was attempted through a read-only handle.
    pub const READ_ONLY: &str = "store.read_only";
    /// The counter record is absent.
    pub const COUNTER_MISSING: &str = "counter.missing";
    /// The counter record holds an unusable value.
    pub const COUNTER_CORRUPT: &str = "counter.corrupt";
    /// A global index left the representable range.
    pub const COUNTER_OVERFLOW: &str = "counter.overflow";
    /// The staged output could not be moved into place.
    pub const FINALIZE: &str = "merge.finalize";
    /// Configuration could not be read.
    pub const CONFIG_READ: &str = "config.read";
    /// Configuration values are invalid.
    pub const CONFIG_INVALID: &str = "config.invalid";
    /// A value could not be encoded as JSON.
    pub const JSON_ENCODE: &str = "serde.json_encode";
    /// A JSON document could not be decoded.
    pub const JSON_DECODE: &str = "serde.json_decode";
    /// A YAML document could not be decoded.
    pub const YAML_DECODE: &str = "serde.yaml_decode";
}
