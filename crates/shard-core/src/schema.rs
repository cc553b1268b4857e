//! Version tags stamped into persisted containers and reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `major.minor.patch` tag of a persisted layout.
///
/// Readers accept any payload with the same major version and a minor
/// version no newer than their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when existing readers can no longer decode the layout.
    pub major: u32,
    /// Bumped when fields are added.
    pub minor: u32,
    /// Bumped for fixes that leave the layout unchanged.
    pub patch: u32,
}

impl SchemaVersion {
    /// Builds a version tag; usable in `const` items.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether a reader at `self` can decode a payload written at `written`.
    pub fn reads(&self, written: &SchemaVersion) -> bool {
        self.major == written.major && self.minor >= written.minor
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
