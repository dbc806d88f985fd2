use std::sync::Arc;

use log::{debug, warn};

use super::{ReductionScratch, SyncConfig, Synchronizer};
use crate::{
    device::{CrossDeviceCopy, DeviceId},
    error::Result,
    group::ParameterGroup,
};

/// Reduces every gradient on the host device and broadcasts the sum back, then after the
/// update overwrites every replica's weights with the first device's.
///
/// Weights are never averaged, device `0` of the group is the authority.
pub struct SimpleSync {
    group: ParameterGroup,
    host: DeviceId,
    scratch: Option<ReductionScratch>,
    copier: Arc<dyn CrossDeviceCopy>,
    config: SyncConfig,
}

impl SimpleSync {
    /// Creates a new `SimpleSync` synchronizer.
    ///
    /// Peer access must already be enabled for every device in `group` that isn't `host`.
    ///
    /// # Arguments
    /// * `group` - The validated parameter group.
    /// * `host` - The device where the reduction takes place.
    /// * `copier` - The copy strategy for the current target.
    ///
    /// # Returns
    /// A new `SimpleSync` instance, the scratch is only allocated for groups of
    /// more than one member.
    pub(crate) fn new(
        group: ParameterGroup,
        host: DeviceId,
        copier: Arc<dyn CrossDeviceCopy>,
    ) -> Self {
        let scratch = (group.len() > 1).then(|| ReductionScratch::new(host, group.nparams()));

        Self {
            group,
            host,
            scratch,
            copier,
            config: SyncConfig::default(),
        }
    }

    fn reduce_grads(&self, scratch: &ReductionScratch) -> Result<()> {
        let len = scratch.len();
        let grads = self.group.grads();

        self.copier.copy(scratch.sum(), &grads[0], len)?;

        for grad in &grads[1..] {
            self.copier.copy(scratch.tmp(), grad, len)?;
            scratch.accumulate();
        }

        for grad in grads {
            self.copier.copy(grad, scratch.sum(), len)?;
        }

        Ok(())
    }

    fn broadcast_weights(&self, len: usize) -> Result<()> {
        let weights = self.group.weights();

        for weight in &weights[1..] {
            self.copier.copy(weight, &weights[0], len)?;
        }

        Ok(())
    }
}

impl Synchronizer for SimpleSync {
    fn configure(&mut self, key: &str, value: &str) {
        self.config.set_param(self.group.tag(), key, value);
    }

    fn sync_before_update(&mut self) -> Result<()> {
        let Some(scratch) = &self.scratch else {
            return Ok(());
        };

        let tag = self.group.tag();
        self.reduce_grads(scratch)
            .inspect_err(|e| warn!(tag = tag; "gradient reduction failed: {e}"))?;

        debug!(
            tag = tag;
            "reduced gradients of {} devices on device {}",
            self.group.len(),
            self.host
        );
        Ok(())
    }

    fn sync_after_update(&mut self) -> Result<()> {
        if !self.config.sync_weight {
            return Ok(());
        }

        // Singleton groups never allocate a scratch, there's nothing to broadcast to.
        let Some(scratch) = &self.scratch else {
            return Ok(());
        };

        let tag = self.group.tag();
        self.broadcast_weights(scratch.len())
            .inspect_err(|e| warn!(tag = tag; "weight broadcast failed: {e}"))?;

        debug!(tag = tag; "broadcast weights to {} devices", self.group.len() - 1);
        Ok(())
    }
}
