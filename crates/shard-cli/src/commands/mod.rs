pub mod merge;
pub mod plan;
pub mod verify;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;
use shard_core::to_canonical_json_bytes;
use shard_merge::MergeConfig;
use shard_store::{Container, NativeContainer};

/// Container format of the shards and the merged store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreFormat {
    /// Native `.evs` containers.
    Native,
    /// HDF5 `.h5` containers; needs the `hdf5` feature.
    Hdf5,
}

impl StoreFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StoreFormat::Native => NativeContainer::EXTENSION,
            StoreFormat::Hdf5 => "h5",
        }
    }
}

#[cfg(not(feature = "hdf5"))]
pub fn hdf5_unavailable() -> Box<dyn Error> {
    "this build has no HDF5 support; rebuild shard-cli with `--features hdf5`".into()
}

/// Merge configuration flags shared by `merge` and `plan`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// YAML configuration describing the merge; flags below override it.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory holding the shard containers.
    #[arg(long, required_unless_present = "config")]
    pub source: Option<PathBuf>,
    /// File name of the merged store inside the source directory.
    #[arg(long)]
    pub output_name: Option<String>,
    /// Shard extension to discover, without the dot.
    #[arg(long)]
    pub extension: Option<String>,
    /// Container format.
    #[arg(long, value_enum, default_value_t = StoreFormat::Native)]
    pub format: StoreFormat,
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<MergeConfig, Box<dyn Error>> {
        let mut config = match (&self.config, &self.source) {
            (Some(path), _) => MergeConfig::load(path)?,
            (None, Some(source)) => MergeConfig::new(source),
            (None, None) => return Err("either --config or --source is required".into()),
        };
        if let Some(source) = &self.source {
            config.source_dir = source.clone();
        }
        if let Some(name) = &self.output_name {
            config.output_name = Some(name.clone());
        }
        if let Some(extension) = &self.extension {
            config.extension = Some(extension.clone());
        }
        Ok(config)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    let bytes = to_canonical_json_bytes(value)?;
    std::io::stdout().write_all(&bytes)?;
    Ok(())
}
