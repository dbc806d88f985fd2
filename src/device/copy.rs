use std::sync::Arc;

use super::{DeviceBuffer, DeviceRuntime};
use crate::error::{Result, SyncErr};

/// Moves a fixed amount of elements between two device buffers.
///
/// Every implementation is synchronous, once `copy` returns the data is visible at `dst`.
pub trait CrossDeviceCopy: Send + Sync {
    /// Copies the first `len` elements of `src` into `dst`.
    ///
    /// # Arguments
    /// * `dst` - The destination buffer.
    /// * `src` - The source buffer.
    /// * `len` - The amount of elements to copy.
    ///
    /// # Returns
    /// A `SyncErr::Device` if either buffer is shorter than `len` or the transfer fails.
    fn copy(&self, dst: &DeviceBuffer, src: &DeviceBuffer, len: usize) -> Result<()>;
}

/// The CPU path, every device lives in host memory so there's no route to negotiate,
/// the runtime is still asked whether both devices are healthy.
#[derive(Clone)]
pub struct HostCopy {
    runtime: Arc<dyn DeviceRuntime>,
}

impl HostCopy {
    /// Creates a new `HostCopy` copy strategy.
    ///
    /// # Arguments
    /// * `runtime` - The runtime reporting the health of every device.
    ///
    /// # Returns
    /// A new `HostCopy` instance.
    pub fn new(runtime: Arc<dyn DeviceRuntime>) -> Self {
        Self { runtime }
    }
}

impl CrossDeviceCopy for HostCopy {
    fn copy(&self, dst: &DeviceBuffer, src: &DeviceBuffer, len: usize) -> Result<()> {
        self.runtime.check_transfer(dst.device(), src.device())?;
        copy_elements(dst, src, len)
    }
}

/// The accelerator path, the route between both devices is validated by the runtime
/// before any data moves.
#[derive(Clone)]
pub struct PeerCopy {
    runtime: Arc<dyn DeviceRuntime>,
}

impl PeerCopy {
    /// Creates a new `PeerCopy` copy strategy.
    ///
    /// # Arguments
    /// * `runtime` - The runtime that negotiated peer access for the devices involved.
    ///
    /// # Returns
    /// A new `PeerCopy` instance.
    pub fn new(runtime: Arc<dyn DeviceRuntime>) -> Self {
        Self { runtime }
    }
}

impl CrossDeviceCopy for PeerCopy {
    fn copy(&self, dst: &DeviceBuffer, src: &DeviceBuffer, len: usize) -> Result<()> {
        self.runtime.check_transfer(dst.device(), src.device())?;
        copy_elements(dst, src, len)
    }
}

fn copy_elements(dst: &DeviceBuffer, src: &DeviceBuffer, len: usize) -> Result<()> {
    for buf in [src, dst] {
        if buf.len() < len {
            return Err(SyncErr::device(
                buf.device(),
                format!("copy of {len} elements overruns a buffer of {}", buf.len()),
            ));
        }
    }

    if dst.same_storage(src) {
        return Ok(());
    }

    let src = src.read();
    dst.write()[..len].copy_from_slice(&src[..len]);
    Ok(())
}
