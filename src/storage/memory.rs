use std::collections::BTreeMap;

use crate::core::error::Result;
use crate::storage::store::DupStore;

/// Heap-only store, used by unit tests and throwaway indexes.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }
}

impl DupStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).and_then(|vs| vs.first().cloned())
    }

    fn dup_values(&self, key: &[u8]) -> Vec<Vec<u8>> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    fn put_dup(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.entries
            .entry(key.to_vec())
            .or_default()
            .push(value.to_vec());
        Ok(())
    }

    fn set_meta(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_vec(), vec![value.to_vec()]);
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn scan_from<'a>(&'a self, key: &[u8]) -> Box<dyn Iterator<Item = (&'a [u8], &'a [u8])> + 'a> {
        Box::new(
            self.entries
                .range(key.to_vec()..)
                .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_slice(), v.as_slice()))),
        )
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}
