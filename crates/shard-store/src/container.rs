//! The container trait implemented by every storage backend.

use std::path::Path;

use shard_core::errors::{codes, ErrorInfo, ShardError};

use crate::dataset::Dataset;
use crate::namespace::Namespace;

/// How a container handle may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Shards are opened read-only and never mutated.
    ReadOnly,
    /// The merged store is opened for read-modify-write.
    ReadWrite,
}

/// A typed-array container file organised into [`Namespace`] groups.
///
/// Handles are exclusive: a read-write handle must be closed before the same
/// file is opened again. `close` consumes the handle so a flushed store can
/// not be written through a stale handle.
pub trait Container: Sized {
    /// File extension recognised during shard discovery, without the dot.
    const EXTENSION: &'static str;

    /// Creates an empty container, replacing any existing file.
    fn create(path: &Path) -> Result<Self, ShardError>;

    /// Opens an existing container.
    fn open(path: &Path, mode: AccessMode) -> Result<Self, ShardError>;

    /// Path the handle was opened from.
    fn path(&self) -> &Path;

    /// Dataset names in a namespace, sorted. A missing group lists as empty.
    fn dataset_names(&self, namespace: Namespace) -> Result<Vec<String>, ShardError>;

    /// Reads a full dataset.
    fn read_dataset(&self, namespace: Namespace, name: &str) -> Result<Dataset, ShardError>;

    /// Whether a dataset exists.
    fn contains(&self, namespace: Namespace, name: &str) -> Result<bool, ShardError> {
        Ok(self
            .dataset_names(namespace)?
            .iter()
            .any(|existing| existing == name))
    }

    /// Writes a new dataset. Existing names are never overwritten.
    fn create_dataset(
        &mut self,
        namespace: Namespace,
        name: &str,
        dataset: &Dataset,
    ) -> Result<(), ShardError>;

    /// Removes a dataset.
    fn unlink(&mut self, namespace: Namespace, name: &str) -> Result<(), ShardError>;

    /// Flushes pending writes and releases the handle.
    fn close(self) -> Result<(), ShardError>;
}

pub(crate) fn store_error(code: &str, err: impl ToString, path: &Path) -> ShardError {
    ShardError::Store(ErrorInfo::new(code, err.to_string()).with_path(path))
}

pub(crate) fn read_only_error(path: &Path, namespace: Namespace, name: &str) -> ShardError {
    ShardError::Store(
        ErrorInfo::new(codes::READ_ONLY, "container opened read-only")
            .with_path(path)
            .with_context("dataset", format!("{namespace}/{name}")),
    )
}

pub(crate) fn exists_error(path: &Path, namespace: Namespace, name: &str) -> ShardError {
    ShardError::Store(
        ErrorInfo::new(codes::DATASET_EXISTS, "dataset already exists")
            .with_path(path)
            .with_context("dataset", format!("{namespace}/{name}"))
            .with_hint("global indices collided; check shard ordering and the meta record"),
    )
}

pub(crate) fn missing_error(path: &Path, namespace: Namespace, name: &str) -> ShardError {
    ShardError::Store(
        ErrorInfo::new(codes::DATASET_MISSING, "dataset not found")
            .with_path(path)
            .with_context("dataset", format!("{namespace}/{name}")),
    )
}
