//! SHA-256 digests recorded in merge reports.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::errors::{codes, ErrorInfo, ShardError};

/// Hex encoded SHA-256 digest of an in-memory buffer.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Streams a file through SHA-256 and returns the hex digest.
pub fn sha256_file(path: &Path) -> Result<String, ShardError> {
    let file = File::open(path).map_err(|err| {
        ShardError::Store(ErrorInfo::new(codes::STORE_OPEN, err.to_string()).with_path(path))
    })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer).map_err(|err| {
            ShardError::Store(ErrorInfo::new(codes::STORE_READ, err.to_string()).with_path(path))
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
