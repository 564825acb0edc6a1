//! Disk-backed inverted index for byte streams mixing Big5 double-byte
//! text with Latin alphanumerics, plus a small retrieval chatbot reusing
//! the index as a context-free question/answer store.
//!
//! Ingest runs bytes through the [`analysis`] parser into an ordered
//! token multiset, packs it into per-leading-pair records in [`index`],
//! and appends them as duplicate-key values in the [`storage`] layer,
//! optionally split across shard files by the key's second byte. Queries
//! reparse the text in query mode and walk the same records through the
//! [`query`] evaluator, combining hits under one of four modes with an
//! all-integer [`scoring`] formula.

pub mod analysis;
pub mod chat;
pub mod core;
pub mod index;
pub mod query;
pub mod scoring;
pub mod storage;

pub use crate::chat::bot::ChatBot;
pub use crate::core::config::Config;
pub use crate::core::engine::Engine;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocId, ScoreMap};
pub use crate::query::types::{QueryMode, QUERY_SENTINEL};
