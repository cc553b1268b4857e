use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use shard_merge::{verify_store, VerifyReport};
use shard_store::NativeContainer;

use super::{print_json, StoreFormat};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Merged store to check.
    #[arg(long)]
    pub store: PathBuf,
    /// Container format.
    #[arg(long, value_enum, default_value_t = StoreFormat::Native)]
    pub format: StoreFormat,
}

pub fn run(args: &VerifyArgs) -> Result<(), Box<dyn Error>> {
    let report: VerifyReport = match args.format {
        StoreFormat::Native => verify_store::<NativeContainer>(&args.store)?,
        #[cfg(feature = "hdf5")]
        StoreFormat::Hdf5 => verify_store::<shard_store::Hdf5Container>(&args.store)?,
        #[cfg(not(feature = "hdf5"))]
        StoreFormat::Hdf5 => return Err(super::hdf5_unavailable()),
    };
    print_json(&report)?;
    if !report.is_consistent() {
        return Err(format!("{} failed verification", args.store.display()).into());
    }
    Ok(())
}
