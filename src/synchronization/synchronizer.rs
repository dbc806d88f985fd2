use crate::error::Result;

/// Keeps the replicas of a parameter group consistent across devices.
///
/// A training iteration calls `sync_before_update` once every device computed its local
/// gradient and `sync_after_update` once every device applied its optimizer step. Both
/// calls block until every transfer finished. The methods take `&mut self`, calls on one
/// synchronizer are serialized by its single owner.
pub trait Synchronizer: Send {
    /// Applies a runtime option, unknown keys are ignored.
    ///
    /// # Arguments
    /// * `key` - The option name, optionally prefixed with `<tag>:`.
    /// * `value` - The option value.
    fn configure(&mut self, key: &str, value: &str);

    /// Should leave the same consensus gradient in every device's gradient buffer.
    ///
    /// # Returns
    /// A `SyncErr::Device` if any transfer fails, buffers may be partially synchronized.
    fn sync_before_update(&mut self) -> Result<()>;

    /// Should bring every device's weights back in line after the optimizer step.
    ///
    /// # Returns
    /// A `SyncErr::Device` if any transfer fails, buffers may be partially synchronized.
    fn sync_after_update(&mut self) -> Result<()>;
}
