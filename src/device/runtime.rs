use serde::{Deserialize, Serialize};

use super::DeviceId;
use crate::error::Result;

/// The kind of devices a runtime drives, it decides which copy path the synchronizer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Every device is plain host memory, copies are direct memory copies.
    #[default]
    Cpu,
    /// Devices have their own memory, cross-device copies need peer access.
    Accelerator,
}

/// The device runtime collaborator.
///
/// Only the capabilities the synchronizer needs are exposed: finding the host device,
/// negotiating peer access once and validating a transfer route before copying.
pub trait DeviceRuntime: Send + Sync {
    /// The kind of devices this runtime drives.
    fn kind(&self) -> DeviceKind;

    /// The device currently bound to the calling thread, used as the host device
    /// on the accelerator path.
    fn current_device(&self) -> Result<DeviceId>;

    /// Should make `peer` reachable from `host`.
    ///
    /// Must be idempotent, enabling an already enabled pair is not an error.
    ///
    /// # Arguments
    /// * `host` - The staging device.
    /// * `peer` - The device to reach from `host`.
    ///
    /// # Returns
    /// A `SyncErr::Device` if the pair can't be made reachable.
    fn enable_peer_access(&self, host: DeviceId, peer: DeviceId) -> Result<()>;

    /// Should check that a transfer from `src` to `dst` can be carried out right now.
    ///
    /// # Returns
    /// A `SyncErr::Device` if the route isn't reachable or one of the devices failed.
    fn check_transfer(&self, dst: DeviceId, src: DeviceId) -> Result<()>;
}
