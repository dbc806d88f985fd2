use serde::{Deserialize, Serialize};

use crate::{
    device::{DeviceId, DeviceKind},
    synchronization::SyncKind,
};

/// The configuration of a simulated data-parallel training run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// The synchronization strategy, `"none"` or `"simple"` in JSON.
    pub synchronizer: SyncKind,
    pub runtime: DeviceKind,
    /// The device bound to the coordinating thread, only used by accelerator runtimes.
    pub current_device: DeviceId,
    pub devices: Vec<DeviceId>,
    pub tag: String,
    pub shape: Vec<usize>,
    pub iterations: usize,
    pub learning_rate: f32,
    pub seed: Option<u64>,
    /// Options passed to the synchronizer right after it's built.
    pub params: Vec<(String, String)>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            synchronizer: SyncKind::Simple,
            runtime: DeviceKind::Cpu,
            current_device: 0,
            devices: vec![0, 1, 2, 3],
            tag: "weights".to_string(),
            shape: vec![4, 4],
            iterations: 10,
            learning_rate: 0.01,
            seed: None,
            params: Vec::new(),
        }
    }
}
