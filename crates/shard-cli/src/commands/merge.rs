use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use shard_merge::{merge_campaign, MergeReport};
use shard_store::NativeContainer;
use tracing::warn;

use super::{print_json, ConfigArgs, StoreFormat};

#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub options: ConfigArgs,
    /// Write the JSON merge report here as well as to stdout.
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Merge directly into the output instead of a `.partial` staging file.
    #[arg(long)]
    pub no_staging: bool,
    /// Skip SHA-256 digests of shards and output.
    #[arg(long)]
    pub no_hash: bool,
}

pub fn run(args: &MergeArgs) -> Result<(), Box<dyn Error>> {
    let mut config = args.options.resolve()?;
    if let Some(report) = &args.report {
        config.report = Some(report.clone());
    }
    if args.no_staging {
        config.staging = false;
    }
    if args.no_hash {
        config.hash_inputs = false;
    }
    let report: MergeReport = match args.options.format {
        StoreFormat::Native => merge_campaign::<NativeContainer>(&config)?,
        #[cfg(feature = "hdf5")]
        StoreFormat::Hdf5 => merge_campaign::<shard_store::Hdf5Container>(&config)?,
        #[cfg(not(feature = "hdf5"))]
        StoreFormat::Hdf5 => return Err(super::hdf5_unavailable()),
    };
    let skipped = report.skipped().count();
    if skipped > 0 {
        warn!(skipped, "some datasets were skipped; see the report for details");
    }
    print_json(&report)
}
