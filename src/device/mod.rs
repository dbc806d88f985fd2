mod buffer;
mod copy;
mod local;
mod runtime;

pub use buffer::{DeviceBuffer, element_count};
pub use copy::{CrossDeviceCopy, HostCopy, PeerCopy};
pub use local::LocalRuntime;
pub use runtime::{DeviceKind, DeviceRuntime};

/// Identifies a device inside the host process.
pub type DeviceId = usize;
