//! Native single-file container backed by a `bincode` image.
//!
//! The whole image is loaded on open and written back on `close`. A
//! read-write handle that is dropped without `close` discards its changes,
//! which leaves the file exactly as the last committed shard left it.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shard_core::errors::codes;
use shard_core::SchemaVersion;
use shard_core::ShardError;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::container::{
    exists_error, missing_error, read_only_error, store_error, AccessMode, Container,
};
use crate::dataset::Dataset;
use crate::namespace::Namespace;

const FORMAT_TAG: &str = "shard-store/native";
const SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreImage {
    format: String,
    schema: SchemaVersion,
    groups: BTreeMap<Namespace, BTreeMap<String, Dataset>>,
}

impl StoreImage {
    fn empty() -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            schema: SCHEMA,
            groups: BTreeMap::new(),
        }
    }
}

/// Native event store container (`.evs`).
#[derive(Debug)]
pub struct NativeContainer {
    path: PathBuf,
    mode: AccessMode,
    image: StoreImage,
    dirty: bool,
}

impl NativeContainer {
    fn load(path: &Path) -> Result<StoreImage, ShardError> {
        let bytes = fs::read(path).map_err(|err| store_error(codes::STORE_OPEN, err, path))?;
        let image: StoreImage = bincode::deserialize(&bytes)
            .map_err(|err| store_error(codes::STORE_OPEN, err, path))?;
        if image.format != FORMAT_TAG {
            return Err(store_error(
                codes::STORE_OPEN,
                format!("unrecognised container format `{}`", image.format),
                path,
            ));
        }
        if !SCHEMA.reads(&image.schema) {
            return Err(store_error(
                codes::STORE_OPEN,
                format!("container schema {} unsupported (reader {SCHEMA})", image.schema),
                path,
            ));
        }
        for datasets in image.groups.values() {
            for dataset in datasets.values() {
                dataset.validate()?;
            }
        }
        Ok(image)
    }

    fn flush(&self) -> Result<(), ShardError> {
        let bytes = bincode::serialize(&self.image)
            .map_err(|err| store_error(codes::STORE_WRITE, err, &self.path))?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(parent)
            .map_err(|err| store_error(codes::STORE_WRITE, err, &self.path))?;
        staged
            .write_all(&bytes)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|err| store_error(codes::STORE_WRITE, err, &self.path))?;
        staged
            .persist(&self.path)
            .map_err(|err| store_error(codes::STORE_WRITE, err.error, &self.path))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "flushed native container");
        Ok(())
    }

    fn ensure_writable(&self, namespace: Namespace, name: &str) -> Result<(), ShardError> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(read_only_error(&self.path, namespace, name)),
        }
    }
}

impl Container for NativeContainer {
    const EXTENSION: &'static str = "evs";

    fn create(path: &Path) -> Result<Self, ShardError> {
        let container = Self {
            path: path.to_path_buf(),
            mode: AccessMode::ReadWrite,
            image: StoreImage::empty(),
            dirty: false,
        };
        container.flush()?;
        Ok(container)
    }

    fn open(path: &Path, mode: AccessMode) -> Result<Self, ShardError> {
        let image = Self::load(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            mode,
            image,
            dirty: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn dataset_names(&self, namespace: Namespace) -> Result<Vec<String>, ShardError> {
        Ok(self
            .image
            .groups
            .get(&namespace)
            .map(|datasets| datasets.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read_dataset(&self, namespace: Namespace, name: &str) -> Result<Dataset, ShardError> {
        self.image
            .groups
            .get(&namespace)
            .and_then(|datasets| datasets.get(name))
            .cloned()
            .ok_or_else(|| missing_error(&self.path, namespace, name))
    }

    fn contains(&self, namespace: Namespace, name: &str) -> Result<bool, ShardError> {
        Ok(self
            .image
            .groups
            .get(&namespace)
            .is_some_and(|datasets| datasets.contains_key(name)))
    }

    fn create_dataset(
        &mut self,
        namespace: Namespace,
        name: &str,
        dataset: &Dataset,
    ) -> Result<(), ShardError> {
        self.ensure_writable(namespace, name)?;
        dataset.validate()?;
        let group = self.image.groups.entry(namespace).or_default();
        if group.contains_key(name) {
            return Err(exists_error(&self.path, namespace, name));
        }
        group.insert(name.to_string(), dataset.clone());
        self.dirty = true;
        Ok(())
    }

    fn unlink(&mut self, namespace: Namespace, name: &str) -> Result<(), ShardError> {
        self.ensure_writable(namespace, name)?;
        let removed = self
            .image
            .groups
            .get_mut(&namespace)
            .and_then(|datasets| datasets.remove(name));
        match removed {
            Some(_) => {
                self.dirty = true;
                Ok(())
            }
            None => Err(missing_error(&self.path, namespace, name)),
        }
    }

    fn close(self) -> Result<(), ShardError> {
        if self.mode == AccessMode::ReadWrite && self.dirty {
            self.flush()?;
        }
        Ok(())
    }
}
