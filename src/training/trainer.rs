use crate::{
    device::{DeviceBuffer, DeviceId},
    error::{Result, SyncErr},
    group::ParameterGroup,
    synchronization::Synchronizer,
};

use super::Optimizer;

/// Allocates one weight and one gradient buffer per device, all weights start at `init`.
///
/// # Arguments
/// * `tag` - The tag of the resulting group.
/// * `dims` - The shape of every buffer.
/// * `devices` - The devices holding a replica.
/// * `init` - The initial value of every weight.
///
/// # Returns
/// The validated group or an error if `devices` is empty or `dims` has too many elements.
pub fn replicate_group(
    tag: &str,
    dims: &[usize],
    devices: Vec<DeviceId>,
    init: f32,
) -> Result<ParameterGroup> {
    let weights: Vec<DeviceBuffer> = devices
        .iter()
        .map(|&device| DeviceBuffer::filled(device, dims, init))
        .collect::<Result<_>>()?;
    let grads: Vec<DeviceBuffer> = devices
        .iter()
        .map(|&device| DeviceBuffer::zeros(device, dims))
        .collect::<Result<_>>()?;

    ParameterGroup::new(tag, weights, grads, devices)
}

/// Drives the replicas of a group through training iterations.
///
/// Every replica has its own optimizer, the synchronizer is what keeps them consistent.
pub struct ReplicaTrainer<O: Optimizer> {
    group: ParameterGroup,
    optimizers: Vec<O>,
    synchronizer: Box<dyn Synchronizer>,
}

impl<O: Optimizer> ReplicaTrainer<O> {
    /// Creates a new `ReplicaTrainer`.
    ///
    /// # Arguments
    /// * `group` - The replicated parameters, shared with `synchronizer`.
    /// * `synchronizer` - The synchronizer built for `group`.
    /// * `optimizer_factory` - Creates the optimizer of each replica given its index.
    ///
    /// # Returns
    /// A new `ReplicaTrainer` instance.
    pub fn new<OF>(
        group: ParameterGroup,
        synchronizer: Box<dyn Synchronizer>,
        optimizer_factory: OF,
    ) -> Self
    where
        OF: FnMut(usize) -> O,
    {
        let optimizers = (0..group.len()).map(optimizer_factory).collect();

        Self {
            group,
            optimizers,
            synchronizer,
        }
    }

    pub fn group(&self) -> &ParameterGroup {
        &self.group
    }

    /// Runs one training iteration.
    ///
    /// Writes each replica's local gradient, synchronizes gradients, applies every
    /// replica's optimizer and synchronizes weights.
    ///
    /// # Arguments
    /// * `local_grads` - The gradient computed by each replica, in device order.
    ///
    /// # Returns
    /// An error if there's a size mismatch or a synchronization fails.
    pub fn step(&mut self, local_grads: &[Vec<f32>]) -> Result<()> {
        if local_grads.len() != self.group.len() {
            return Err(SyncErr::Config(format!(
                "got {} local gradients for {} replicas",
                local_grads.len(),
                self.group.len()
            )));
        }

        for (buf, grad) in self.group.grads().iter().zip(local_grads) {
            buf.fill_from(grad)?;
        }

        self.synchronizer.sync_before_update()?;

        let replicas = self.group.weights().iter().zip(self.group.grads());
        for ((weights, grad), optimizer) in replicas.zip(&mut self.optimizers) {
            optimizer.step(weights, grad)?;
        }

        self.synchronizer.sync_after_update()
    }

    /// The largest absolute difference between any replica's weights and the first one's.
    pub fn divergence(&self) -> f32 {
        let weights = self.group.weights();
        let reference = weights[0].read();

        weights[1..]
            .iter()
            .flat_map(|w| {
                let w = w.read();
                reference
                    .iter()
                    .zip(w.iter())
                    .map(|(a, b)| (a - b).abs())
                    .collect::<Vec<_>>()
            })
            .fold(0., f32::max)
    }
}
