use super::Synchronizer;
use crate::error::Result;

/// Skips synchronization entirely, every device keeps its own gradients and weights.
#[derive(Debug, Clone)]
pub struct NullSync;

impl NullSync {
    /// Creates a new `NullSync` synchronizer.
    ///
    /// # Returns
    /// A new `NullSync` instance.
    pub(crate) fn new() -> Self {
        Self
    }
}

impl Synchronizer for NullSync {
    fn configure(&mut self, _key: &str, _value: &str) {}

    fn sync_before_update(&mut self) -> Result<()> {
        Ok(())
    }

    fn sync_after_update(&mut self) -> Result<()> {
        Ok(())
    }
}
