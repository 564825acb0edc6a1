use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use roaring::RoaringBitmap;

use crate::analysis::parser::{self, TokenMap};
use crate::analysis::token::TokenKind;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, ScoreMap};
use crate::index::codec::{self, DELIM};
use crate::query::cache::{CacheStats, QueryCache, QueryKey};
use crate::query::evaluator::{evaluate, PostingSource};
use crate::query::types::QueryMode;
use crate::storage::disk::DiskStore;
use crate::storage::router::{Route, Router};
use crate::storage::store::DupStore;

/// Next document id, 4 bytes big-endian.
pub const META_IDXCOUNT: &[u8] = b"_idxcount";
/// Shard count the index was created with, 4 bytes big-endian.
pub const META_SUBCOUNT: &[u8] = b"_subcount";
/// Concatenated 4-byte ids of deleted documents.
pub const META_DELETED: &[u8] = b"_deleted";

const DOC_KEY_PREFIX: u8 = b'!';
const VAR_PREFIX: u8 = b'-';

/// The index engine: owns the primary store (document keys, counters,
/// variables, unrouted postings) and any shard stores of its slice.
///
/// Ingest: bytes -> parser -> packed records -> routed duplicate-key
/// inserts, document id prepended. Query: bytes -> parser in query mode ->
/// packed records -> evaluator over gathered duplicates.
pub struct Engine {
    config: Config,
    primary: Box<dyn DupStore>,
    shards: HashMap<u32, Box<dyn DupStore>>,
    router: Router,
    idxcount: u32,
    deleted: RoaringBitmap,
    cache: QueryCache,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("idxcount", &self.idxcount)
            .field("shard_count", &self.shards.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Open or create the index at `path` for read-write access.
    pub fn open(path: impl Into<PathBuf>) -> Result<Engine> {
        Engine::open_with_config(Config::new(path))
    }

    /// Open an existing index read-only; fails NotFound if absent.
    pub fn open_read_only(path: impl Into<PathBuf>) -> Result<Engine> {
        Engine::open_with_config(Config::new(path).read_only(true))
    }

    pub fn open_with_config(config: Config) -> Result<Engine> {
        let primary = DiskStore::open(&config.path, config.read_only, config.page_size)?;
        let mut engine = Engine::from_primary(config, Box::new(primary))?;

        if let Some(range) = engine.router.shard_range() {
            for i in range {
                let path = shard_path(&engine.config.path, i);
                let store =
                    DiskStore::open(&path, engine.config.read_only, engine.config.page_size)?;
                engine.shards.insert(i, Box::new(store));
            }
        }
        Ok(engine)
    }

    /// Assemble an engine over caller-supplied stores. The capability
    /// trait is the only thing the engine depends on, so tests run the
    /// full protocol against in-memory stores.
    pub fn with_stores(
        config: Config,
        primary: Box<dyn DupStore>,
        shards: Vec<(u32, Box<dyn DupStore>)>,
    ) -> Result<Engine> {
        let mut engine = Engine::from_primary(config, primary)?;
        engine.shards.extend(shards);
        Ok(engine)
    }

    fn from_primary(config: Config, mut primary: Box<dyn DupStore>) -> Result<Engine> {
        let subcount = match primary.get_meta(META_SUBCOUNT) {
            Some(bytes) => meta_u32(&bytes, "_subcount")?,
            None => {
                if !config.read_only {
                    primary.set_meta(META_SUBCOUNT, &config.subcount.to_be_bytes())?;
                }
                config.subcount
            }
        };
        if subcount != config.subcount {
            debug!(
                "index {} was created with {} shards; configured {} ignored",
                config.path.display(),
                subcount,
                config.subcount
            );
        }

        let idxcount = match primary.get_meta(META_IDXCOUNT) {
            Some(bytes) => meta_u32(&bytes, "_idxcount")?,
            None => 0,
        };

        let mut deleted = RoaringBitmap::new();
        if let Some(bytes) = primary.get_meta(META_DELETED) {
            for chunk in bytes.chunks_exact(4) {
                deleted.insert(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
            }
        }

        let submax = config.submax.unwrap_or_else(|| subcount.saturating_sub(1));
        if subcount > 0 && config.submin > submax {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("empty shard slice {}..={}", config.submin, submax),
            ));
        }
        let router = Router::new(subcount, config.submin, submax);
        let cache = QueryCache::with_budget(config.cache_size);

        Ok(Engine {
            config,
            primary,
            shards: HashMap::new(),
            router,
            idxcount,
            deleted,
            cache,
        })
    }

    /// Index `content` under the caller's `doc_key`. Returns the assigned
    /// id. Ids are burned even when an insert fails partway, so callers
    /// must treat them as opaque and possibly non-contiguous.
    pub fn insert(&mut self, doc_key: &[u8], content: &[u8]) -> Result<DocId> {
        let tokens = parser::extract(content, false);
        self.insert_parsed(doc_key, &tokens)
    }

    /// Index an already-parsed token multiset.
    pub fn insert_tokens(&mut self, doc_key: &[u8], tokens: &TokenMap) -> Result<DocId> {
        for token in tokens.keys() {
            if TokenKind::of(token).is_none() {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    format!("malformed token {:?}", token),
                ));
            }
        }
        self.insert_parsed(doc_key, tokens)
    }

    fn insert_parsed(&mut self, doc_key: &[u8], tokens: &TokenMap) -> Result<DocId> {
        if self.config.read_only {
            return Err(Error::new(
                ErrorKind::ReadOnly,
                format!("index {} opened read-only", self.config.path.display()),
            ));
        }

        self.idxcount += 1;
        let id = DocId(self.idxcount);
        // Counter first: a failed insert burns its id rather than risking
        // a reuse after partial writes.
        self.primary.set_meta(META_IDXCOUNT, &id.to_bytes())?;
        self.cache.clear();

        for record in codec::encode(tokens, &DELIM) {
            let store: &mut Box<dyn DupStore> = match self.router.route(&record.key) {
                Route::Primary => &mut self.primary,
                Route::Shard(i) => self.shards.get_mut(&i).ok_or_else(|| {
                    Error::new(ErrorKind::Internal, format!("shard {} not open", i))
                })?,
                Route::Skip => continue,
            };
            let mut value = Vec::with_capacity(4 + record.value.len());
            value.extend_from_slice(&id.to_bytes());
            value.extend_from_slice(&record.value);
            store.put_dup(&record.key, &value)?;
        }

        // Document-key mapping last, so a failed insert leaves no document.
        self.primary.set_meta(&doc_key_key(id), doc_key)?;
        Ok(id)
    }

    /// Score `text` against the index. Per-token store problems are
    /// logged and the token skipped; the query itself cannot fail.
    pub fn query(&self, text: &[u8], mode: QueryMode, prior: Option<&ScoreMap>) -> ScoreMap {
        let cacheable = prior.map_or(true, |p| p.is_empty());
        let key = QueryKey {
            text: text.to_vec(),
            mode,
        };
        if cacheable {
            if let Some(hit) = self.cache.get(&key) {
                return hit;
            }
        }

        let tokens = parser::extract(text, true);
        let records = codec::encode(&tokens, &DELIM);
        let result = evaluate(
            &RoutedSource { engine: self },
            &records,
            mode,
            prior.cloned().unwrap_or_default(),
        );

        if cacheable {
            self.cache.put(key, result.clone());
        }
        result
    }

    /// Caller-supplied key of a document, unless it was never inserted or
    /// has been deleted.
    pub fn get_key(&self, id: DocId) -> Option<Vec<u8>> {
        self.primary.get(&doc_key_key(id))
    }

    /// Linear inverse of `get_key`.
    pub fn find_key(&self, doc_key: &[u8]) -> Option<DocId> {
        self.doc_entries()
            .find(|(_, key)| key == doc_key)
            .map(|(id, _)| id)
    }

    /// Every live document, in id order.
    pub fn list_keys(&self) -> Vec<(DocId, Vec<u8>)> {
        self.doc_entries().collect()
    }

    fn doc_entries(&self) -> impl Iterator<Item = (DocId, Vec<u8>)> + '_ {
        self.primary
            .scan_from(&[DOC_KEY_PREFIX])
            .take_while(|(k, _)| k.first() == Some(&DOC_KEY_PREFIX))
            .filter(|(k, _)| k.len() == 5)
            .map(|(k, v)| {
                (
                    DocId::from_bytes([k[1], k[2], k[3], k[4]]),
                    v.to_vec(),
                )
            })
    }

    /// Drop the document-key mapping and record the id as deleted.
    /// Postings stay behind; queries may still score the id and callers
    /// filter with `is_deleted`.
    pub fn delete(&mut self, doc_key: &[u8]) -> Result<DocId> {
        let id = self.find_key(doc_key).ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("no document keyed {:?}", String::from_utf8_lossy(doc_key)),
            )
        })?;
        self.delete_id(id)?;
        Ok(id)
    }

    pub fn delete_id(&mut self, id: DocId) -> Result<()> {
        if self.config.read_only {
            return Err(Error::new(
                ErrorKind::ReadOnly,
                format!("index {} opened read-only", self.config.path.display()),
            ));
        }
        if self.get_key(id).is_none() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("document {} not found", id.value()),
            ));
        }

        self.deleted.insert(id.value());
        let mut bytes = Vec::with_capacity(self.deleted.len() as usize * 4);
        for deleted_id in &self.deleted {
            bytes.extend_from_slice(&deleted_id.to_be_bytes());
        }
        self.primary.set_meta(META_DELETED, &bytes)?;
        self.primary.remove(&doc_key_key(id))?;
        self.cache.clear();
        Ok(())
    }

    pub fn is_deleted(&self, id: DocId) -> bool {
        self.deleted.contains(id.value())
    }

    /// Store a named scalar under the variable namespace.
    pub fn set_var(&mut self, name: &[u8], value: &[u8]) -> Result<()> {
        self.primary.set_meta(&var_key(name), value)
    }

    pub fn get_var(&self, name: &[u8]) -> Option<Vec<u8>> {
        self.primary.get_meta(&var_key(name))
    }

    /// Highest id handed out so far.
    pub fn idxcount(&self) -> u32 {
        self.idxcount
    }

    pub fn subcount(&self) -> u32 {
        match self.router {
            Router::Enabled { subcount, .. } => subcount,
            Router::Disabled => 0,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn sync(&mut self) -> Result<()> {
        self.primary.sync()?;
        for shard in self.shards.values_mut() {
            shard.sync()?;
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        self.sync()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(err) = self.sync() {
            warn!("sync on drop failed for {}: {}", self.config.path.display(), err);
        }
    }
}

/// Posting lookups routed across the primary and shard stores.
struct RoutedSource<'a> {
    engine: &'a Engine,
}

impl PostingSource for RoutedSource<'_> {
    fn matched(&self, key: &[u8]) -> Option<Vec<Vec<u8>>> {
        match self.engine.router.route(key) {
            Route::Primary => Some(self.engine.primary.dup_values(key)),
            Route::Shard(i) => match self.engine.shards.get(&i) {
                Some(shard) => Some(shard.dup_values(key)),
                None => {
                    warn!("shard {} not open; token skipped", i);
                    None
                }
            },
            Route::Skip => None,
        }
    }
}

fn doc_key_key(id: DocId) -> [u8; 5] {
    let b = id.to_bytes();
    [DOC_KEY_PREFIX, b[0], b[1], b[2], b[3]]
}

fn var_key(name: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + name.len());
    key.push(VAR_PREFIX);
    key.extend_from_slice(name);
    key
}

fn shard_path(path: &Path, i: u32) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(format!(".{}", i));
    PathBuf::from(os)
}

fn meta_u32(bytes: &[u8], name: &str) -> Result<u32> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| {
        Error::new(
            ErrorKind::Corrupt,
            format!("meta key {} holds {} bytes, expected 4", name, bytes.len()),
        )
    })?;
    Ok(u32::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemStore;

    fn mem_engine(config: Config) -> Engine {
        let shards = config
            .submax
            .map(|submax| {
                (config.submin..=submax)
                    .map(|i| (i, Box::new(MemStore::new()) as Box<dyn DupStore>))
                    .collect()
            })
            .unwrap_or_default();
        Engine::with_stores(config, Box::new(MemStore::new()), shards).unwrap()
    }

    #[test]
    fn ids_are_sequential_and_keys_recoverable() {
        let mut engine = mem_engine(Config::default());
        for (i, key) in [b"first" as &[u8], b"second", b"third"].iter().enumerate() {
            let id = engine.insert(key, b"some text content").unwrap();
            assert_eq!(id, DocId(i as u32 + 1));
        }
        assert_eq!(engine.idxcount(), 3);
        assert_eq!(engine.get_key(DocId(2)).unwrap(), b"second");
        assert_eq!(engine.find_key(b"third"), Some(DocId(3)));
        assert_eq!(engine.list_keys().len(), 3);
    }

    #[test]
    fn deletion_hides_the_key_but_not_the_postings() {
        let mut engine = mem_engine(Config::default());
        engine.insert(b"doc", b"hello world").unwrap();
        engine.delete(b"doc").unwrap();

        assert!(engine.get_key(DocId(1)).is_none());
        assert!(engine.is_deleted(DocId(1)));
        // Postings survive; the score map still carries the dead id.
        let score = engine.query(b"hello", QueryMode::Fuzzy, None);
        assert!(score[&DocId(1)] > 0);

        let err = engine.delete(b"doc").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn variables_round_trip() {
        let mut engine = mem_engine(Config::default());
        engine.set_var(b"owner", b"amber").unwrap();
        assert_eq!(engine.get_var(b"owner").unwrap(), b"amber");
        assert!(engine.get_var(b"missing").is_none());
    }

    #[test]
    fn malformed_caller_tokens_are_rejected() {
        let mut engine = mem_engine(Config::default());
        let mut tokens = TokenMap::new();
        tokens.insert(vec![0xA4], 1);
        let err = engine.insert_tokens(b"doc", &tokens).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn out_of_slice_tokens_are_dropped() {
        let config = Config::default().shards(4, 1, Some(2));
        let mut engine = mem_engine(config);

        // 0xA4A4: residue 0, outside the 1..=2 slice.
        engine.insert(b"outside", &[0xA4, 0xA4]).unwrap();
        assert!(engine.query(&[0xA4, 0xA4], QueryMode::Part, None).is_empty());

        // 0xA4A5: residue 1, lands in shard 1 and round-trips.
        engine.insert(b"inside", &[0xA4, 0xA5]).unwrap();
        let score = engine.query(&[0xA4, 0xA5], QueryMode::Part, None);
        assert!(score[&DocId(2)] > 0);
    }

    #[test]
    fn repeated_queries_hit_the_cache() {
        let mut engine = mem_engine(Config::default());
        engine.insert(b"doc", b"cache me").unwrap();

        let first = engine.query(b"cache", QueryMode::Fuzzy, None);
        let second = engine.query(b"cache", QueryMode::Fuzzy, None);
        assert_eq!(first, second);
        assert_eq!(engine.cache_stats().hit_count, 1);

        // Mutation invalidates.
        engine.insert(b"doc2", b"cache busting").unwrap();
        engine.query(b"cache", QueryMode::Fuzzy, None);
        assert_eq!(engine.cache_stats().hit_count, 1);
    }
}
