use super::feed::ChangeFeed;
use crate::error::{DexError, Result};

/// Abstract interface for a string-keyed, string-valued durable store.
///
/// One value of an implementing type is one execution context (a "tab"):
/// its writes are announced to other contexts on the same origin, never to
/// itself.
pub trait StorageBackend {
    /// Read a slot. `Ok(None)` if it has never been written or was removed.
    fn read_slot(&self, key: &str) -> Result<Option<String>>;

    /// Write a slot, replacing any previous value.
    /// Fails with [`DexError::QuotaExceeded`] when the origin is full.
    fn write_slot(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot. Removing an absent slot is not an error.
    fn remove_slot(&self, key: &str) -> Result<()>;

    /// All slot keys present on the origin.
    fn keys(&self) -> Result<Vec<String>>;

    /// Open a feed of changes made by other contexts.
    fn subscribe(&self) -> ChangeFeed;

    /// Byte length of a slot's stored value, 0 when absent.
    fn slot_len(&self, key: &str) -> Result<usize> {
        Ok(self.read_slot(key)?.map(|v| v.len()).unwrap_or(0))
    }
}

/// Reject a write that would push the origin past `limit` bytes.
///
/// `others` is the footprint of every slot except `key`; a slot costs the
/// length of its key plus the length of its value.
pub(crate) fn check_quota(
    key: &str,
    value: &str,
    others: usize,
    limit: Option<usize>,
) -> Result<()> {
    let Some(limit) = limit else {
        return Ok(());
    };
    let needed = others + key.len() + value.len();
    if needed > limit {
        return Err(DexError::QuotaExceeded {
            key: key.to_string(),
            needed,
            limit,
        });
    }
    Ok(())
}
