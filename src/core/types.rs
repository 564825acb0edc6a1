use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Engine-assigned document sequence number, allocated from 1 and never
/// reused. Stored big-endian as a 4-byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        DocId(u32::from_be_bytes(bytes))
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

/// Query result: document id to accumulated integer score.
pub type ScoreMap = HashMap<DocId, i64>;
