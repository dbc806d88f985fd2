mod config;
mod optimizer;
mod trainer;

pub use config::RunConfig;
pub use optimizer::{GradientDescent, Optimizer};
pub use trainer::{ReplicaTrainer, replicate_group};
