use log::debug;

/// Separates a group's tag from the option name in a namespaced key, e.g. `fc1:sync_weight`.
pub const TAG_SEPARATOR: char = ':';

/// The runtime options of a synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Whether weights are broadcast from the first device after the update,
    /// when disabled only gradients are synchronized.
    pub sync_weight: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { sync_weight: true }
    }
}

impl SyncConfig {
    /// Applies a single key/value option.
    ///
    /// # Arguments
    /// * `tag` - The tag of the owning group, a `<tag>:` prefix in `key` is stripped.
    /// * `key` - The option name.
    /// * `value` - The option value.
    ///
    /// # Returns
    /// Whether the key was recognized, unknown keys are ignored.
    pub fn set_param(&mut self, tag: &str, key: &str, value: &str) -> bool {
        match strip_tag(tag, key) {
            "sync_weight" => {
                self.sync_weight = parse_int(value) != 0;
                debug!(tag = tag; "sync_weight set to {}", self.sync_weight);
                true
            }
            other => {
                debug!(tag = tag; "ignoring unknown option {other:?}");
                false
            }
        }
    }
}

/// Strips a leading `<tag>:` from `key`, if present.
pub fn strip_tag<'a>(tag: &str, key: &'a str) -> &'a str {
    key.strip_prefix(tag)
        .and_then(|rest| rest.strip_prefix(TAG_SEPARATOR))
        .unwrap_or(key)
}

/// Reads the leading integer in `value`, leading whitespace and a sign are allowed and
/// anything after the digits is discarded. A value without digits reads as `0`.
fn parse_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });

    if negative { -magnitude } else { magnitude }
}
