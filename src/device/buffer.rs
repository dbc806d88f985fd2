use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use super::DeviceId;
use crate::error::{Result, SyncErr};

/// A handle to a flat block of `f32` elements living on a device.
///
/// Cloning a handle aliases the same storage, this is how the tensor provider and the
/// synchronizer share one buffer. The storage is never resized after creation.
#[derive(Debug, Clone)]
pub struct DeviceBuffer {
    device: DeviceId,
    dims: Arc<[usize]>,
    data: Arc<RwLock<Box<[f32]>>>,
}

impl DeviceBuffer {
    /// Creates a new `DeviceBuffer` from existing data.
    ///
    /// # Arguments
    /// * `device` - The device owning the buffer.
    /// * `dims` - The logical shape of the buffer.
    /// * `data` - The flattened contents, its length must be the product of `dims`.
    ///
    /// # Returns
    /// A new `DeviceBuffer` or a `SyncErr::ShapeMismatch` if `data` doesn't fit `dims`.
    pub fn new(device: DeviceId, dims: &[usize], data: Vec<f32>) -> Result<Self> {
        let size = element_count(dims)?;
        if data.len() != size {
            return Err(SyncErr::ShapeMismatch {
                buffer: "buffer",
                index: 0,
                got: vec![data.len()],
                expected: dims.to_vec(),
            });
        }

        Ok(Self {
            device,
            dims: Arc::from(dims),
            data: Arc::new(RwLock::new(data.into_boxed_slice())),
        })
    }

    /// Creates a new zeroed `DeviceBuffer`.
    ///
    /// # Arguments
    /// * `device` - The device owning the buffer.
    /// * `dims` - The logical shape of the buffer.
    ///
    /// # Returns
    /// A new `DeviceBuffer` or a `SyncErr::Config` if the shape's element count overflows.
    pub fn zeros(device: DeviceId, dims: &[usize]) -> Result<Self> {
        Self::filled(device, dims, 0.)
    }

    /// Creates a new `DeviceBuffer` with every element set to `value`.
    pub fn filled(device: DeviceId, dims: &[usize], value: f32) -> Result<Self> {
        let size = element_count(dims)?;

        Ok(Self {
            device,
            dims: Arc::from(dims),
            data: Arc::new(RwLock::new(vec![value; size].into_boxed_slice())),
        })
    }

    /// Wraps `data` as a one dimensional buffer.
    pub(crate) fn flat(device: DeviceId, data: Vec<f32>) -> Self {
        Self {
            device,
            dims: Arc::from([data.len()]),
            data: Arc::new(RwLock::new(data.into_boxed_slice())),
        }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// The flattened element count.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `self` and `other` alias the same storage.
    pub fn same_storage(&self, other: &DeviceBuffer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Locks the buffer for reading.
    pub fn read(&self) -> MappedRwLockReadGuard<'_, [f32]> {
        RwLockReadGuard::map(self.data.read(), |data| &**data)
    }

    /// Locks the buffer for writing.
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, [f32]> {
        RwLockWriteGuard::map(self.data.write(), |data| &mut **data)
    }

    /// Copies the buffer's contents into a new vector.
    pub fn to_vec(&self) -> Vec<f32> {
        self.read().to_vec()
    }

    /// Overwrites the whole buffer with `values`.
    ///
    /// # Returns
    /// A `SyncErr::ShapeMismatch` if `values` isn't the same size as the buffer.
    pub fn fill_from(&self, values: &[f32]) -> Result<()> {
        let mut data = self.write();
        if data.len() != values.len() {
            return Err(SyncErr::ShapeMismatch {
                buffer: "buffer",
                index: 0,
                got: vec![values.len()],
                expected: self.dims.to_vec(),
            });
        }

        data.copy_from_slice(values);
        Ok(())
    }
}

/// The flattened element count of a buffer shaped `dims`.
///
/// # Returns
/// The product of `dims` or a `SyncErr::Config` if it doesn't fit in a `usize`.
pub fn element_count(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |count, &dim| count.checked_mul(dim))
        .ok_or_else(|| SyncErr::Config(format!("shape {dims:?} has too many elements")))
}
