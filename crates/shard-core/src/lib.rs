#![deny(missing_docs)]
#![doc = "Shared error taxonomy, schema descriptors and hashing helpers for the shard merge workspace."]

pub mod errors;
pub mod hash;
pub mod schema;
pub mod serde;

pub use errors::{ErrorInfo, ShardError};
pub use hash::{sha256_bytes, sha256_file};
pub use schema::SchemaVersion;
pub use crate::serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes};
