use std::{collections::HashSet, sync::Arc};

use log::info;

use super::{NullSync, SimpleSync, SyncKind, Synchronizer};
use crate::{
    device::{CrossDeviceCopy, DeviceId, DeviceKind, DeviceRuntime, HostCopy, PeerCopy},
    error::Result,
    group::ParameterGroup,
};

/// Builds `Synchronizer`s for parameter groups, the only way to create one.
///
/// The copy path is picked once from the runtime's `DeviceKind`, callers never
/// branch on the kind of device they run on.
pub struct SyncBuilder {
    runtime: Arc<dyn DeviceRuntime>,
}

impl SyncBuilder {
    /// Creates a new `SyncBuilder`.
    ///
    /// # Arguments
    /// * `runtime` - The device runtime every built synchronizer will use.
    ///
    /// # Returns
    /// A new `SyncBuilder` instance.
    pub fn new(runtime: Arc<dyn DeviceRuntime>) -> Self {
        Self { runtime }
    }

    /// Builds a new `Synchronizer` given its type tag.
    ///
    /// # Arguments
    /// * `type_tag` - Either `"none"` or `"simple"`.
    /// * `group` - The group to synchronize.
    ///
    /// # Returns
    /// A new synchronizer, a `SyncErr::UnknownSynchronizerType` for any other tag or a
    /// `SyncErr::Device` if peer access couldn't be set up.
    pub fn build(&self, type_tag: &str, group: ParameterGroup) -> Result<Box<dyn Synchronizer>> {
        let kind: SyncKind = type_tag.parse()?;
        self.build_kind(kind, group)
    }

    /// Builds a new `Synchronizer` of an already resolved kind and applies a list of
    /// options to it.
    ///
    /// # Arguments
    /// * `kind` - The synchronization strategy.
    /// * `group` - The group to synchronize.
    /// * `params` - Key/value options passed to `Synchronizer::configure` in order.
    ///
    /// # Returns
    /// The same as `build_kind`.
    pub fn build_with_params<I, K, V>(
        &self,
        kind: SyncKind,
        group: ParameterGroup,
        params: I,
    ) -> Result<Box<dyn Synchronizer>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut synchronizer = self.build_kind(kind, group)?;

        for (key, value) in params {
            synchronizer.configure(key.as_ref(), value.as_ref());
        }

        Ok(synchronizer)
    }

    /// Builds a new `Synchronizer` of an already resolved kind.
    ///
    /// # Arguments
    /// * `kind` - The synchronization strategy.
    /// * `group` - The group to synchronize.
    ///
    /// # Returns
    /// A new synchronizer or a `SyncErr::Device` if peer access couldn't be set up.
    pub fn build_kind(&self, kind: SyncKind, group: ParameterGroup) -> Result<Box<dyn Synchronizer>> {
        match kind {
            SyncKind::None => {
                info!(tag = group.tag(); "no synchronization for {} devices", group.len());
                Ok(Box::new(NullSync::new()))
            }
            SyncKind::Simple => {
                let synchronizer = self.build_simple(group)?;
                Ok(Box::new(synchronizer))
            }
        }
    }

    /// Resolves the host device and copy strategy for the runtime and creates a `SimpleSync`.
    fn build_simple(&self, group: ParameterGroup) -> Result<SimpleSync> {
        let (host, copier) = match self.runtime.kind() {
            DeviceKind::Cpu => {
                let copier: Arc<dyn CrossDeviceCopy> =
                    Arc::new(HostCopy::new(Arc::clone(&self.runtime)));
                (0, copier)
            }
            DeviceKind::Accelerator => {
                let host = self.runtime.current_device()?;
                self.enable_peers(host, group.devices())?;
                let copier: Arc<dyn CrossDeviceCopy> =
                    Arc::new(PeerCopy::new(Arc::clone(&self.runtime)));
                (host, copier)
            }
        };

        info!(
            tag = group.tag();
            "simple synchronization for {} devices of {} params, host device {host}",
            group.len(),
            group.nparams()
        );

        Ok(SimpleSync::new(group, host, copier))
    }

    /// Enables peer access from `host` to every distinct device in `devices` that isn't `host`.
    fn enable_peers(&self, host: DeviceId, devices: &[DeviceId]) -> Result<()> {
        let mut enabled = HashSet::new();

        for &device in devices {
            if device != host && enabled.insert(device) {
                self.runtime.enable_peer_access(host, device)?;
            }
        }

        Ok(())
    }
}
