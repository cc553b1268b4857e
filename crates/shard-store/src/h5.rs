//! HDF5 backend (`.h5`), enabled with the `hdf5` feature.
//!
//! Groups map one-to-one onto namespaces. Narrow datasets are detected from
//! the stored integer width; everything else is read through a soft
//! conversion to `f64`.

use std::path::{Path, PathBuf};

use hdf5::types::{IntSize, TypeDescriptor};
use hdf5::{File, Group};
use shard_core::errors::codes;
use shard_core::ShardError;
use tracing::debug;

use crate::container::{
    exists_error, missing_error, read_only_error, store_error, AccessMode, Container,
};
use crate::dataset::{ArrayData, Dataset};
use crate::namespace::Namespace;

/// HDF5 event store container.
pub struct Hdf5Container {
    path: PathBuf,
    mode: AccessMode,
    file: File,
}

impl Hdf5Container {
    fn group(&self, namespace: Namespace) -> Option<Group> {
        if self.file.link_exists(namespace.as_str()) {
            self.file.group(namespace.as_str()).ok()
        } else {
            None
        }
    }

    fn group_for_write(&self, namespace: Namespace) -> Result<Group, ShardError> {
        match self.group(namespace) {
            Some(group) => Ok(group),
            None => self
                .file
                .create_group(namespace.as_str())
                .map_err(|err| store_error(codes::STORE_WRITE, err, &self.path)),
        }
    }

    fn ensure_writable(&self, namespace: Namespace, name: &str) -> Result<(), ShardError> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(read_only_error(&self.path, namespace, name)),
        }
    }
}

impl Container for Hdf5Container {
    const EXTENSION: &'static str = "h5";

    fn create(path: &Path) -> Result<Self, ShardError> {
        let file = File::create(path).map_err(|err| store_error(codes::STORE_OPEN, err, path))?;
        Ok(Self {
            path: path.to_path_buf(),
            mode: AccessMode::ReadWrite,
            file,
        })
    }

    fn open(path: &Path, mode: AccessMode) -> Result<Self, ShardError> {
        let file = match mode {
            AccessMode::ReadOnly => File::open(path),
            AccessMode::ReadWrite => File::append(path),
        }
        .map_err(|err| store_error(codes::STORE_OPEN, err, path))?;
        Ok(Self {
            path: path.to_path_buf(),
            mode,
            file,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn dataset_names(&self, namespace: Namespace) -> Result<Vec<String>, ShardError> {
        let Some(group) = self.group(namespace) else {
            return Ok(Vec::new());
        };
        let mut names = group
            .member_names()
            .map_err(|err| store_error(codes::STORE_READ, err, &self.path))?;
        names.sort();
        Ok(names)
    }

    fn read_dataset(&self, namespace: Namespace, name: &str) -> Result<Dataset, ShardError> {
        let group = self
            .group(namespace)
            .ok_or_else(|| missing_error(&self.path, namespace, name))?;
        if !group.link_exists(name) {
            return Err(missing_error(&self.path, namespace, name));
        }
        let dataset = group
            .dataset(name)
            .map_err(|err| store_error(codes::STORE_READ, err, &self.path))?;
        let shape = dataset.shape();
        let descriptor = dataset
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(|err| store_error(codes::STORE_READ, err, &self.path))?;
        let data = match descriptor {
            TypeDescriptor::Integer(IntSize::U2) => ArrayData::Int16(
                dataset
                    .read_raw::<i16>()
                    .map_err(|err| store_error(codes::STORE_READ, err, &self.path))?,
            ),
            _ => ArrayData::Float64(
                dataset
                    .read_raw::<f64>()
                    .map_err(|err| store_error(codes::STORE_READ, err, &self.path))?,
            ),
        };
        Dataset::new(shape, data)
    }

    fn create_dataset(
        &mut self,
        namespace: Namespace,
        name: &str,
        dataset: &Dataset,
    ) -> Result<(), ShardError> {
        self.ensure_writable(namespace, name)?;
        let group = self.group_for_write(namespace)?;
        if group.link_exists(name) {
            return Err(exists_error(&self.path, namespace, name));
        }
        let shape = dataset.shape().to_vec();
        let written = match dataset.data() {
            ArrayData::Float64(values) => group
                .new_dataset::<f64>()
                .shape(shape)
                .create(name)
                .and_then(|created| created.write_raw(values.as_slice())),
            ArrayData::Int16(values) => group
                .new_dataset::<i16>()
                .shape(shape)
                .create(name)
                .and_then(|created| created.write_raw(values.as_slice())),
        };
        written.map_err(|err| {
            store_error(codes::STORE_WRITE, format!("{namespace}/{name}: {err}"), &self.path)
        })?;
        debug!(dataset = %format!("{namespace}/{name}"), "wrote hdf5 dataset");
        Ok(())
    }

    fn unlink(&mut self, namespace: Namespace, name: &str) -> Result<(), ShardError> {
        self.ensure_writable(namespace, name)?;
        let group = self
            .group(namespace)
            .ok_or_else(|| missing_error(&self.path, namespace, name))?;
        group
            .unlink(name)
            .map_err(|err| store_error(codes::STORE_WRITE, err, &self.path))
    }

    fn close(self) -> Result<(), ShardError> {
        if self.mode == AccessMode::ReadWrite {
            self.file
                .flush()
                .map_err(|err| store_error(codes::STORE_WRITE, err, &self.path))?;
        }
        self.file
            .close()
            .map_err(|err| store_error(codes::STORE_WRITE, err, &self.path))
    }
}
