#![cfg(test)]

use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    device::{DeviceBuffer, DeviceId, LocalRuntime},
    error::SyncErr,
    group::ParameterGroup,
    synchronization::SyncBuilder,
};

const TOLERANCE: f32 = 1e-4;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_close(got: &[f32], expected: &[f32]) {
    assert_eq!(got.len(), expected.len());
    for (i, (g, e)) in got.iter().zip(expected).enumerate() {
        assert!(
            (g - e).abs() <= TOLERANCE * e.abs().max(1.),
            "element {i}: got {g}, expected {e}"
        );
    }
}

fn scalar_group(devices: &[DeviceId], weights: &[f32], grads: &[f32]) -> ParameterGroup {
    let weights = devices
        .iter()
        .zip(weights)
        .map(|(&d, &w)| DeviceBuffer::filled(d, &[1], w).unwrap())
        .collect();
    let grads = devices
        .iter()
        .zip(grads)
        .map(|(&d, &g)| DeviceBuffer::filled(d, &[1], g).unwrap())
        .collect();

    ParameterGroup::new("fc", weights, grads, devices.to_vec()).unwrap()
}

fn random_group(rng: &mut StdRng, n: usize, dims: &[usize]) -> ParameterGroup {
    let size: usize = dims.iter().product();
    let mut buffers = |d| {
        let data = (0..size).map(|_| rng.random_range(-10.0..10.0)).collect();
        DeviceBuffer::new(d, dims, data).unwrap()
    };

    let weights = (0..n).map(&mut buffers).collect();
    let grads = (0..n).map(&mut buffers).collect();
    ParameterGroup::new("fc", weights, grads, (0..n).collect()).unwrap()
}

#[test]
fn three_device_scenario() {
    init_logging();
    let builder = SyncBuilder::new(Arc::new(LocalRuntime::cpu()));
    let group = scalar_group(&[0, 1, 2], &[0., 0., 0.], &[1., 2., 3.]);
    let mut sync = builder.build("simple", group.clone()).unwrap();

    sync.sync_before_update().unwrap();
    for grad in group.grads() {
        assert_eq!(grad.to_vec(), [6.]);
    }

    // Only the first device's optimizer step ran.
    group.weights()[0].fill_from(&[101.]).unwrap();
    sync.sync_after_update().unwrap();

    for weight in group.weights() {
        assert_eq!(weight.to_vec(), [101.]);
    }
}

#[test]
fn reduction_matches_sum_for_random_groups() {
    let mut rng = StdRng::seed_from_u64(42);
    let builder = SyncBuilder::new(Arc::new(LocalRuntime::cpu()));

    for n in 2..=5 {
        let group = random_group(&mut rng, n, &[3, 7]);

        let mut expected = vec![0.; group.nparams()];
        for grad in group.grads() {
            for (acc, g) in expected.iter_mut().zip(grad.read().iter()) {
                *acc += g;
            }
        }

        let mut sync = builder.build("simple", group.clone()).unwrap();
        sync.sync_before_update().unwrap();

        let first = group.grads()[0].to_vec();
        assert_close(&first, &expected);
        for grad in group.grads() {
            assert_eq!(grad.to_vec(), first);
        }
    }
}

#[test]
fn singleton_group_is_untouched() {
    let mut rng = StdRng::seed_from_u64(7);
    let builder = SyncBuilder::new(Arc::new(LocalRuntime::cpu()));

    for kind in ["none", "simple"] {
        let group = random_group(&mut rng, 1, &[5]);
        let weight = group.weights()[0].clone();
        let grad = group.grads()[0].clone();
        let (weights_before, grads_before) = (weight.to_vec(), grad.to_vec());

        let mut sync = builder.build(kind, group.clone()).unwrap();
        sync.configure("sync_weight", "1");
        sync.sync_before_update().unwrap();
        sync.sync_after_update().unwrap();

        assert!(group.weights()[0].same_storage(&weight));
        assert!(group.grads()[0].same_storage(&grad));
        assert_eq!(weight.to_vec(), weights_before);
        assert_eq!(grad.to_vec(), grads_before);
    }
}

#[test]
fn weights_follow_first_device_for_any_prior_values() {
    let mut rng = StdRng::seed_from_u64(3);
    let builder = SyncBuilder::new(Arc::new(LocalRuntime::cpu()));
    let group = random_group(&mut rng, 4, &[2, 2]);
    let mut sync = builder.build("simple", group.clone()).unwrap();

    sync.sync_after_update().unwrap();

    let first = group.weights()[0].to_vec();
    for weight in group.weights() {
        assert_eq!(weight.to_vec(), first);
    }
}

#[test]
fn disabled_weight_sync_is_idempotent_noop() {
    let builder = SyncBuilder::new(Arc::new(LocalRuntime::cpu()));
    let group = scalar_group(&[0, 1, 2], &[1., 2., 3.], &[0., 0., 0.]);
    let mut sync = builder.build("simple", group.clone()).unwrap();

    sync.configure("fc:sync_weight", "0");

    sync.sync_after_update().unwrap();
    let once: Vec<_> = group.weights().iter().map(|w| w.to_vec()).collect();
    sync.sync_after_update().unwrap();
    let twice: Vec<_> = group.weights().iter().map(|w| w.to_vec()).collect();

    assert_eq!(once, [[1.0f32], [2.], [3.]]);
    assert_eq!(once, twice);

    sync.configure("sync_weight", "1");
    sync.sync_after_update().unwrap();
    for weight in group.weights() {
        assert_eq!(weight.to_vec(), [1.]);
    }
}

#[test]
fn bogus_and_none_types() {
    let builder = SyncBuilder::new(Arc::new(LocalRuntime::cpu()));

    let group = scalar_group(&[0, 1], &[1., 2.], &[3., 4.]);
    let err = builder.build("bogus", group.clone()).err().unwrap();
    assert_eq!(err, SyncErr::UnknownSynchronizerType("bogus".to_string()));

    for devices in [&[0][..], &[0, 1][..], &[0, 1, 2][..]] {
        let n = devices.len();
        let weights: Vec<f32> = (0..n).map(|i| i as f32).collect();
        let grads: Vec<f32> = (0..n).map(|i| 10. + i as f32).collect();
        let group = scalar_group(devices, &weights, &grads);

        let mut sync = builder.build("none", group.clone()).unwrap();
        sync.sync_before_update().unwrap();
        sync.sync_after_update().unwrap();

        for (i, (w, g)) in group.weights().iter().zip(group.grads()).enumerate() {
            assert_eq!(w.to_vec(), [weights[i]]);
            assert_eq!(g.to_vec(), [grads[i]]);
        }
    }
}

#[test]
fn accelerator_host_outside_the_group() {
    let runtime = Arc::new(LocalRuntime::accelerator(5));
    let builder = SyncBuilder::new(runtime.clone());
    let group = scalar_group(&[0, 1, 2], &[9., 0., 0.], &[1., 2., 3.]);

    let mut sync = builder.build("simple", group.clone()).unwrap();
    assert_eq!(runtime.peer_count(), 3);

    sync.sync_before_update().unwrap();
    sync.sync_after_update().unwrap();

    for (weight, grad) in group.weights().iter().zip(group.grads()) {
        assert_eq!(grad.to_vec(), [6.]);
        assert_eq!(weight.to_vec(), [9.]);
    }
}

#[test]
fn faulted_device_fails_the_sync_call() {
    init_logging();
    let runtime = Arc::new(LocalRuntime::accelerator(0));
    let builder = SyncBuilder::new(runtime.clone());
    let group = scalar_group(&[0, 1, 2], &[0., 0., 0.], &[1., 2., 3.]);
    let mut sync = builder.build("simple", group).unwrap();

    runtime.fault(2);
    assert!(matches!(
        sync.sync_before_update(),
        Err(SyncErr::Device { device: 2, .. })
    ));
    assert!(matches!(
        sync.sync_after_update(),
        Err(SyncErr::Device { device: 2, .. })
    ));

    runtime.recover(2);
    sync.sync_before_update().unwrap();
}

#[test]
fn faulted_device_fails_the_sync_call_on_cpu() {
    let runtime = Arc::new(LocalRuntime::cpu());
    let builder = SyncBuilder::new(runtime.clone());
    let group = scalar_group(&[0, 1, 2], &[5., 0., 0.], &[1., 2., 3.]);
    let mut sync = builder.build("simple", group.clone()).unwrap();

    runtime.fault(2);
    assert!(matches!(
        sync.sync_before_update(),
        Err(SyncErr::Device { device: 2, .. })
    ));
    assert!(matches!(
        sync.sync_after_update(),
        Err(SyncErr::Device { device: 2, .. })
    ));
    assert_eq!(group.grads()[2].to_vec(), [3.]);

    runtime.recover(2);
    sync.sync_before_update().unwrap();
    sync.sync_after_update().unwrap();
    for (weight, grad) in group.weights().iter().zip(group.grads()) {
        assert_eq!(grad.to_vec(), [6.]);
        assert_eq!(weight.to_vec(), [5.]);
    }
}

#[test]
fn malformed_groups_never_reach_the_builder() {
    let weights = vec![DeviceBuffer::zeros(0, &[2]).unwrap(), DeviceBuffer::zeros(1, &[2]).unwrap()];
    let grads = vec![DeviceBuffer::zeros(0, &[2]).unwrap()];
    assert!(matches!(
        ParameterGroup::new("fc", weights, grads, vec![0, 1]),
        Err(SyncErr::Config(_))
    ));

    let weights = vec![DeviceBuffer::zeros(0, &[2]).unwrap(), DeviceBuffer::zeros(1, &[1, 2]).unwrap()];
    let grads = vec![DeviceBuffer::zeros(0, &[2]).unwrap(), DeviceBuffer::zeros(1, &[2]).unwrap()];
    assert!(matches!(
        ParameterGroup::new("fc", weights, grads, vec![0, 1]),
        Err(SyncErr::ShapeMismatch { .. })
    ));
}
