//! Per-event dataset keys: `evt<index>_header`, `evt<index>_data`,
//! `evt<index>_cloud`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const PREFIX: &str = "evt";

/// Role of a per-event dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Wide header derived from the raw trace; first element is the event index.
    Header,
    /// Raw detector trace, stored narrow in the merged store.
    Data,
    /// Reconstructed point cloud.
    Cloud,
}

impl EventKind {
    /// Key suffix after the `_` separator.
    pub fn suffix(&self) -> &'static str {
        match self {
            EventKind::Header => "header",
            EventKind::Data => "data",
            EventKind::Cloud => "cloud",
        }
    }
}

/// Why a dataset key could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum KeyError {
    /// The name lacks the `evt` prefix.
    #[error("key does not start with `evt`")]
    MissingPrefix,
    /// No `_` separates index and suffix.
    #[error("key has no `_` between index and suffix")]
    MissingSeparator,
    /// The index is empty or not all digits.
    #[error("`{0}` is not a non-negative base-10 event index")]
    InvalidIndex(String),
    /// The suffix is not `header`, `data` or `cloud`.
    #[error("unknown dataset suffix `{0}`")]
    UnknownSuffix(String),
}

/// A parsed per-event dataset key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    /// Event index, local in a shard and global in the merged store.
    pub index: u64,
    /// Which per-event dataset the key names.
    pub kind: EventKind,
}

impl EventKey {
    /// Key for an index and dataset kind.
    pub fn new(index: u64, kind: EventKind) -> Self {
        Self { index, kind }
    }

    /// Parses a dataset name. Leading zeros in the index are accepted.
    pub fn parse(name: &str) -> Result<Self, KeyError> {
        let rest = name.strip_prefix(PREFIX).ok_or(KeyError::MissingPrefix)?;
        let (digits, suffix) = rest.split_once('_').ok_or(KeyError::MissingSeparator)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyError::InvalidIndex(digits.to_string()));
        }
        let index = digits
            .parse::<u64>()
            .map_err(|_| KeyError::InvalidIndex(digits.to_string()))?;
        let kind = match suffix {
            "header" => EventKind::Header,
            "data" => EventKind::Data,
            "cloud" => EventKind::Cloud,
            other => return Err(KeyError::UnknownSuffix(other.to_string())),
        };
        Ok(Self { index, kind })
    }

    /// Same event, different role.
    pub fn with_kind(&self, kind: EventKind) -> Self {
        Self {
            index: self.index,
            kind,
        }
    }

    /// Canonical dataset name.
    pub fn render(&self) -> String {
        format!("{PREFIX}{}_{}", self.index, self.kind.suffix())
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for EventKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
