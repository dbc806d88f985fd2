use std::collections::HashSet;

use log::debug;
use parking_lot::Mutex;

use super::{DeviceId, DeviceKind, DeviceRuntime};
use crate::error::{Result, SyncErr};

#[derive(Debug, Default)]
struct PeerState {
    enabled: HashSet<(DeviceId, DeviceId)>,
    faulted: HashSet<DeviceId>,
}

/// A `DeviceRuntime` where every device is a region of this process' memory.
///
/// On the accelerator path it keeps the same bookkeeping a real runtime would, a device
/// can only be reached after peer access with the current device was enabled. Devices can
/// be configured to refuse peer access and can be faulted at any time to simulate failures.
#[derive(Debug)]
pub struct LocalRuntime {
    kind: DeviceKind,
    current: DeviceId,
    unreachable: HashSet<DeviceId>,
    state: Mutex<PeerState>,
}

impl LocalRuntime {
    /// Creates a new `LocalRuntime` of the given kind.
    ///
    /// # Arguments
    /// * `kind` - The kind of devices to simulate.
    /// * `current` - The device bound to the calling thread.
    ///
    /// # Returns
    /// A new `LocalRuntime` instance.
    pub fn new(kind: DeviceKind, current: DeviceId) -> Self {
        Self {
            kind,
            current,
            unreachable: HashSet::new(),
            state: Mutex::new(PeerState::default()),
        }
    }

    /// A runtime for plain host memory devices.
    pub fn cpu() -> Self {
        Self::new(DeviceKind::Cpu, 0)
    }

    /// A runtime simulating accelerators with separate memories.
    pub fn accelerator(current: DeviceId) -> Self {
        Self::new(DeviceKind::Accelerator, current)
    }

    /// Makes `device` refuse every peer access request.
    pub fn with_unreachable(mut self, device: DeviceId) -> Self {
        self.unreachable.insert(device);
        self
    }

    /// Marks `device` as failed, every later transfer touching it errors.
    pub fn fault(&self, device: DeviceId) {
        self.state.lock().faulted.insert(device);
    }

    /// Clears a previous `fault`.
    pub fn recover(&self, device: DeviceId) {
        self.state.lock().faulted.remove(&device);
    }

    /// Whether peer access from `host` to `peer` was enabled.
    pub fn peer_enabled(&self, host: DeviceId, peer: DeviceId) -> bool {
        self.state.lock().enabled.contains(&(host, peer))
    }

    /// The amount of enabled peer pairs.
    pub fn peer_count(&self) -> usize {
        self.state.lock().enabled.len()
    }
}

impl DeviceRuntime for LocalRuntime {
    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn current_device(&self) -> Result<DeviceId> {
        Ok(self.current)
    }

    fn enable_peer_access(&self, host: DeviceId, peer: DeviceId) -> Result<()> {
        if host == peer {
            return Ok(());
        }

        if self.unreachable.contains(&peer) {
            return Err(SyncErr::device(
                peer,
                format!("peer access from device {host} is not supported"),
            ));
        }

        if self.state.lock().enabled.insert((host, peer)) {
            debug!("enabled peer access: host={host} peer={peer}");
        }

        Ok(())
    }

    fn check_transfer(&self, dst: DeviceId, src: DeviceId) -> Result<()> {
        let state = self.state.lock();

        for device in [src, dst] {
            if state.faulted.contains(&device) {
                return Err(SyncErr::device(device, "device is not responding"));
            }
        }

        if self.kind == DeviceKind::Cpu || src == dst {
            return Ok(());
        }

        let reachable = |device: DeviceId| {
            device == self.current || state.enabled.contains(&(self.current, device))
        };

        for device in [src, dst] {
            if !reachable(device) {
                return Err(SyncErr::device(
                    device,
                    format!(
                        "not reachable from device {}, peer access was never enabled",
                        self.current
                    ),
                ));
            }
        }

        Ok(())
    }
}
