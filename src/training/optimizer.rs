use crate::{
    device::DeviceBuffer,
    error::{Result, SyncErr},
};

/// Applies a replica's synchronized gradient to that replica's weights.
///
/// Every replica owns its optimizer, so stateful optimizers keep one state per device.
pub trait Optimizer {
    /// Updates `weights` in place using `grad`.
    ///
    /// # Arguments
    /// * `weights` - The replica's weights buffer.
    /// * `grad` - The replica's gradient buffer, on the same device as `weights`.
    ///
    /// # Returns
    /// A `SyncErr::Device` if the buffers live on different devices, a `SyncErr::Config`
    /// if they alias each other or a `SyncErr::ShapeMismatch` if their shapes differ.
    fn step(&mut self, weights: &DeviceBuffer, grad: &DeviceBuffer) -> Result<()>;
}

/// Checks that `grad` can be applied to `weights`.
fn check_replica(weights: &DeviceBuffer, grad: &DeviceBuffer) -> Result<()> {
    if weights.device() != grad.device() {
        return Err(SyncErr::device(
            grad.device(),
            format!("gradient can't update weights on device {}", weights.device()),
        ));
    }

    if weights.same_storage(grad) {
        return Err(SyncErr::Config(
            "weights and gradient share the same storage".to_string(),
        ));
    }

    if weights.dims() != grad.dims() {
        return Err(SyncErr::ShapeMismatch {
            buffer: "grads",
            index: grad.device(),
            got: grad.dims().to_vec(),
            expected: weights.dims().to_vec(),
        });
    }

    Ok(())
}

/// Plain gradient descent, `w -= lr * g`.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    fn step(&mut self, weights: &DeviceBuffer, grad: &DeviceBuffer) -> Result<()> {
        check_replica(weights, grad)?;

        let lr = self.learning_rate;
        let grad = grad.read();
        let mut weights = weights.write();

        for (w, g) in weights.iter_mut().zip(grad.iter()) {
            *w -= lr * g;
        }

        Ok(())
    }
}
