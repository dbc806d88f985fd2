//! Keeps the replicas of a model's parameters consistent across the devices of one process.
//!
//! After every device computed its local gradient, `Synchronizer::sync_before_update`
//! leaves the sum of all of them in every gradient buffer. After every device applied its
//! optimizer step, `Synchronizer::sync_after_update` overwrites every replica's weights with
//! the first device's.
//!
//! ```ignore
//! let builder = SyncBuilder::new(Arc::new(LocalRuntime::cpu()));
//! let group = ParameterGroup::new("fc1", weights, grads, vec![0, 1])?;
//! let mut sync = builder.build("simple", group)?;
//!
//! // compute gradients on every device
//! sync.sync_before_update()?;
//! // apply the optimizer on every device
//! sync.sync_after_update()?;
//! ```

pub mod device;
pub mod error;
pub mod group;
pub mod synchronization;
pub mod training;

mod test;

pub use device::{DeviceBuffer, DeviceId, DeviceKind, DeviceRuntime, LocalRuntime};
pub use error::{Result, SyncErr};
pub use group::ParameterGroup;
pub use synchronization::{SyncBuilder, SyncConfig, SyncKind, Synchronizer};
