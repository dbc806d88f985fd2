use crate::{
    device::{DeviceBuffer, DeviceId},
    error::{Result, SyncErr},
};

/// The per-device replicas of one logical parameter tensor.
///
/// Every member `i` holds a weight buffer and a gradient buffer owned by `devices[i]`,
/// all of them with the same shape. The invariants are checked once when the group is
/// created and never again, buffers are never resized afterwards.
#[derive(Debug, Clone)]
pub struct ParameterGroup {
    tag: String,
    weights: Vec<DeviceBuffer>,
    grads: Vec<DeviceBuffer>,
    devices: Vec<DeviceId>,
}

impl ParameterGroup {
    /// Creates a new `ParameterGroup`.
    ///
    /// # Arguments
    /// * `tag` - A human readable name, used to namespace configuration keys.
    /// * `weights` - The weight buffer of each member.
    /// * `grads` - The gradient buffer of each member.
    /// * `devices` - The device of each member.
    ///
    /// # Returns
    /// A new `ParameterGroup`, a `SyncErr::Config` if the group is empty or the lists
    /// disagree, or a `SyncErr::ShapeMismatch` if any buffer differs from `weights[0]`.
    pub fn new(
        tag: impl Into<String>,
        weights: Vec<DeviceBuffer>,
        grads: Vec<DeviceBuffer>,
        devices: Vec<DeviceId>,
    ) -> Result<Self> {
        let tag = tag.into();

        let Some(first) = weights.first() else {
            return Err(SyncErr::Config(format!("group {tag:?} has no members")));
        };

        if weights.len() != grads.len() || weights.len() != devices.len() {
            return Err(SyncErr::Config(format!(
                "group {tag:?} has {} weights, {} grads and {} devices",
                weights.len(),
                grads.len(),
                devices.len()
            )));
        }

        for (buffer, list) in [("weights", &weights), ("grads", &grads)] {
            for (index, buf) in list.iter().enumerate() {
                if buf.dims() != first.dims() || buf.len() != first.len() {
                    return Err(SyncErr::ShapeMismatch {
                        buffer,
                        index,
                        got: buf.dims().to_vec(),
                        expected: first.dims().to_vec(),
                    });
                }

                if buf.device() != devices[index] {
                    return Err(SyncErr::Config(format!(
                        "{buffer}[{index}] of group {tag:?} lives on device {} but the member runs on device {}",
                        buf.device(),
                        devices[index]
                    )));
                }
            }
        }

        Ok(Self {
            tag,
            weights,
            grads,
            devices,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn weights(&self) -> &[DeviceBuffer] {
        &self.weights
    }

    pub fn grads(&self) -> &[DeviceBuffer] {
        &self.grads
    }

    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    /// The amount of members in the group.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false, a group has at least one member.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// The flattened element count shared by every buffer.
    pub fn nparams(&self) -> usize {
        self.weights[0].len()
    }

    /// The shape shared by every buffer.
    pub fn dims(&self) -> &[usize] {
        self.weights[0].dims()
    }
}
