//! Seeding the merged store from the first shard.

use std::fs;
use std::path::Path;

use shard_core::errors::{codes, ErrorInfo, ShardError};
use tracing::info;

/// Copies the seed shard byte-for-byte to become the initial merged store.
///
/// The seed's local indices become global indices unchanged. Returns the
/// number of bytes copied.
pub fn seed_store(seed: &Path, destination: &Path) -> Result<u64, ShardError> {
    let bytes = fs::copy(seed, destination).map_err(|err| {
        ShardError::Seed(
            ErrorInfo::new(codes::SEED_COPY, err.to_string())
                .with_context("seed", seed.display().to_string())
                .with_context("destination", destination.display().to_string()),
        )
    })?;
    info!(seed = %seed.display(), destination = %destination.display(), bytes, "seeded merged store");
    Ok(bytes)
}
