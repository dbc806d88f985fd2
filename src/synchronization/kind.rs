use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SyncErr;

/// The closed set of synchronization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    /// No synchronization at all.
    None,
    /// Reduce gradients on the host device, broadcast weights from the first device.
    #[default]
    Simple,
}

impl FromStr for SyncKind {
    type Err = SyncErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SyncKind::None),
            "simple" => Ok(SyncKind::Simple),
            other => Err(SyncErr::UnknownSynchronizerType(other.to_string())),
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncKind::None => f.write_str("none"),
            SyncKind::Simple => f.write_str("simple"),
        }
    }
}
