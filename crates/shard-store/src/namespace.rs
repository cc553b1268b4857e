//! The three dataset groups of an event store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical dataset groups inside an event store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Per-event detector traces (`evt<N>_header`, `evt<N>_data`).
    Get,
    /// Per-event reconstructed point clouds (`evt<N>_cloud`).
    Clouds,
    /// The scalar bookkeeping record.
    Meta,
}

impl Namespace {
    /// Group name as stored in the container.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Get => "get",
            Namespace::Clouds => "clouds",
            Namespace::Meta => "meta",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
