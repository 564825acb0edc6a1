use crate::core::error::Result;

/// Ordered byte-key map with duplicate values per key.
///
/// The engine depends on three guarantees: keys iterate in ascending
/// bytewise order, duplicate values under one key preserve insertion
/// order, and `set_meta` replaces where `put_dup` appends.
pub trait DupStore {
    /// First value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Every duplicate value under `key`, in insertion order.
    fn dup_values(&self, key: &[u8]) -> Vec<Vec<u8>>;

    /// Append one more value under `key`.
    fn put_dup(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Replace all values under `key` with a single value.
    fn set_meta(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    fn get_meta(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.get(key)
    }

    /// Drop `key` and all its values. Missing keys are not an error.
    fn remove(&mut self, key: &[u8]) -> Result<()>;

    /// Cursor positioned at the first entry with key >= `key`, yielding
    /// every (key, value) pair from there in order, duplicates included.
    fn scan_from<'a>(&'a self, key: &[u8]) -> Box<dyn Iterator<Item = (&'a [u8], &'a [u8])> + 'a>;

    /// Flush pending state to the backing medium.
    fn sync(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()> {
        self.sync()
    }
}
