use std::{env, fs, sync::Arc};

use anyhow::{Context, Result};
use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};

use replica_sync::{
    DeviceKind, DeviceRuntime, LocalRuntime, SyncBuilder,
    training::{GradientDescent, ReplicaTrainer, RunConfig, replicate_group},
};

/// Reads the run configuration from the path in the first argument, or the default one.
fn load_config() -> Result<RunConfig> {
    let Some(path) = env::args().nth(1) else {
        return Ok(RunConfig::default());
    };

    let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))
}

/// Generates an independent local gradient for every replica.
fn local_grads(rng: &mut StdRng, replicas: usize, nparams: usize) -> Vec<Vec<f32>> {
    (0..replicas)
        .map(|_| (0..nparams).map(|_| rng.random_range(-1.0..1.0)).collect())
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();

    let config = load_config()?;
    info!("run config: {config:?}");

    let runtime: Arc<dyn DeviceRuntime> = match config.runtime {
        DeviceKind::Cpu => Arc::new(LocalRuntime::cpu()),
        DeviceKind::Accelerator => Arc::new(LocalRuntime::accelerator(config.current_device)),
    };

    let group = replicate_group(&config.tag, &config.shape, config.devices.clone(), 0.)
        .context("creating the parameter group")?;

    let builder = SyncBuilder::new(runtime);
    let params = config.params.iter().map(|(key, value)| (key, value));
    let synchronizer = builder
        .build_with_params(config.synchronizer, group.clone(), params)
        .context("creating the synchronizer")?;

    let lr = config.learning_rate;
    let mut trainer = ReplicaTrainer::new(group, synchronizer, |_| GradientDescent::new(lr));

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let nparams = trainer.group().nparams();
    for iteration in 0..config.iterations {
        let grads = local_grads(&mut rng, config.devices.len(), nparams);
        trainer
            .step(&grads)
            .with_context(|| format!("training iteration {iteration}"))?;

        info!(
            "iteration {iteration}: replica divergence {}",
            trainer.divergence()
        );
    }

    println!("{:?}", trainer.group().weights()[0].to_vec());
    Ok(())
}
