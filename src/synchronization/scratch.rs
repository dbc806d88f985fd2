use rayon::prelude::*;

use crate::device::{DeviceBuffer, DeviceId};

/// Below this amount of elements the accumulation runs on a single thread.
const MIN_PAR_LEN: usize = 1 << 14;

/// Host resident buffers used to reduce the gradients of a group.
///
/// `sum` holds the running reduction and `tmp` stages the gradient being added to it.
#[derive(Debug)]
pub struct ReductionScratch {
    sum: DeviceBuffer,
    tmp: DeviceBuffer,
}

impl ReductionScratch {
    /// Allocates a new `ReductionScratch` on the host device.
    ///
    /// # Arguments
    /// * `host` - The host device.
    /// * `len` - The flattened element count of the group.
    ///
    /// # Returns
    /// A new `ReductionScratch` instance.
    pub fn new(host: DeviceId, len: usize) -> Self {
        Self {
            sum: DeviceBuffer::flat(host, vec![0.; len]),
            tmp: DeviceBuffer::flat(host, vec![0.; len]),
        }
    }

    pub fn sum(&self) -> &DeviceBuffer {
        &self.sum
    }

    pub fn tmp(&self) -> &DeviceBuffer {
        &self.tmp
    }

    pub fn len(&self) -> usize {
        self.sum.len()
    }

    /// Adds `tmp` into `sum` elementwise.
    pub fn accumulate(&self) {
        let tmp = self.tmp.read();
        let mut sum = self.sum.write();

        sum[..]
            .par_iter_mut()
            .zip(tmp[..].par_iter())
            .with_min_len(MIN_PAR_LEN)
            .for_each(|(acc, g)| *acc += g);
    }
}
