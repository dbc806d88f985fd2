use std::sync::Arc;

use replica_sync::{
    LocalRuntime, SyncBuilder, SyncErr,
    training::{GradientDescent, ReplicaTrainer, RunConfig, replicate_group},
};

fn trainer(config: &RunConfig) -> ReplicaTrainer<GradientDescent> {
    let runtime = Arc::new(LocalRuntime::accelerator(config.current_device));
    let group = replicate_group(&config.tag, &config.shape, config.devices.clone(), 0.).unwrap();
    let params = config.params.iter().map(|(k, v)| (k, v));
    let synchronizer = SyncBuilder::new(runtime)
        .build_with_params(config.synchronizer, group.clone(), params)
        .unwrap();

    let lr = config.learning_rate;
    ReplicaTrainer::new(group, synchronizer, |_| GradientDescent::new(lr))
}

#[test]
fn replicas_stay_identical_over_many_iterations() {
    let config = RunConfig {
        devices: vec![0, 1, 2],
        shape: vec![2],
        learning_rate: 0.5,
        ..RunConfig::default()
    };
    let mut trainer = trainer(&config);

    for step in 0..20 {
        let s = step as f32;
        trainer
            .step(&[vec![s, 1.], vec![-s, 1.], vec![1., 1.]])
            .unwrap();
        assert_eq!(trainer.divergence(), 0.);
    }

    // Every step applies 0.5 * [1, 3].
    let weights = trainer.group().weights()[2].to_vec();
    assert_eq!(weights, [-10., -30.]);
}

#[test]
fn gradient_only_sync_keeps_replicas_consistent_from_equal_start() {
    let config = RunConfig {
        devices: vec![0, 1],
        shape: vec![3],
        params: vec![("weights:sync_weight".to_string(), "0".to_string())],
        ..RunConfig::default()
    };
    let mut trainer = trainer(&config);

    trainer
        .step(&[vec![1., 2., 3.], vec![3., 2., 1.]])
        .unwrap();

    // Same consensus gradient and same optimizer, the replicas never diverge.
    assert_eq!(trainer.divergence(), 0.);
}

#[test]
fn unknown_synchronizer_type() {
    let group = replicate_group("weights", &[2], vec![0, 1], 0.).unwrap();

    let err = SyncBuilder::new(Arc::new(LocalRuntime::cpu()))
        .build("ring", group)
        .err()
        .unwrap();

    assert_eq!(err, SyncErr::UnknownSynchronizerType("ring".to_string()));
}

#[test]
fn json_config_selects_the_synchronizer() {
    let json = r#"{
        "synchronizer": "none",
        "devices": [0, 1],
        "shape": [1],
        "learning_rate": 1.0
    }"#;
    let config: RunConfig = serde_json::from_str(json).unwrap();
    let mut trainer = trainer(&config);

    trainer.step(&[vec![1.], vec![3.]]).unwrap();

    assert_eq!(trainer.divergence(), 2.);
}
