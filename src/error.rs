use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::device::DeviceId;

/// The result type used across the entire synchronization crate.
pub type Result<T> = std::result::Result<T, SyncErr>;

/// The synchronization crate's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncErr {
    /// The parameter group is malformed, e.g. it has no members or its lists disagree in length.
    Config(String),
    /// A weight or gradient buffer doesn't match the shape of the first weight buffer.
    ShapeMismatch {
        buffer: &'static str,
        index: usize,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    /// The factory was given a type tag it doesn't know about.
    UnknownSynchronizerType(String),
    /// A copy or a peer access setup failed at the device runtime level.
    Device { device: DeviceId, msg: String },
}

impl SyncErr {
    /// Shorthand for building a `SyncErr::Device`.
    pub fn device(device: DeviceId, msg: impl Into<String>) -> Self {
        Self::Device {
            device,
            msg: msg.into(),
        }
    }
}

impl Display for SyncErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncErr::Config(msg) => write!(f, "invalid parameter group: {msg}"),
            SyncErr::ShapeMismatch {
                buffer,
                index,
                got,
                expected,
            } => write!(
                f,
                "shape mismatch in {buffer}[{index}], got {got:?} and expected {expected:?}"
            ),
            SyncErr::UnknownSynchronizerType(kind) => {
                write!(f, "unknown synchronizer type {kind:?}, expected \"none\" or \"simple\"")
            }
            SyncErr::Device { device, msg } => write!(f, "device {device} error: {msg}"),
        }
    }
}

impl Error for SyncErr {}
