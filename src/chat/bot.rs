use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use regex::bytes::Regex;

use crate::core::config::Config;
use crate::core::engine::Engine;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::query::types::{QueryMode, QUERY_SENTINEL};

/// Context-free question/answer retriever over an [`Engine`].
///
/// Entries pair a response (`doc_key`) with trigger text; `input` scores
/// the incoming line against the triggers partial-match style and answers
/// with the best live entry, falling back to a canned random line.
pub struct ChatBot {
    pub name: String,
    engine: Engine,
    synonyms: Vec<(Regex, Vec<u8>)>,
    random_outputs: Vec<Vec<u8>>,
    nextone: bool,
}

impl std::fmt::Debug for ChatBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBot").field("name", &self.name).finish_non_exhaustive()
    }
}

impl ChatBot {
    /// Open the bot's index. Without `writable`, a missing index file is
    /// NotFound.
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>, writable: bool) -> Result<ChatBot> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if !writable && !path.exists() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("no bot index at {}", path.display()),
            ));
        }
        let engine = Engine::open_with_config(Config::new(path).read_only(!writable))?;
        Ok(ChatBot {
            name: name.into(),
            engine,
            synonyms: Vec::new(),
            random_outputs: Vec::new(),
            nextone: false,
        })
    }

    /// Rewrite rule applied to every incoming line before querying.
    pub fn add_synonym(&mut self, pattern: &str, replacement: &[u8]) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|err| {
            Error::new(ErrorKind::InvalidArgument, format!("bad synonym pattern: {}", err))
        })?;
        self.synonyms.push((regex, replacement.to_vec()));
        Ok(())
    }

    /// Canned lines for when nothing in the index matches.
    pub fn set_random_outputs(&mut self, outputs: Vec<Vec<u8>>) {
        self.random_outputs = outputs;
    }

    /// Answer with the entry after the matched one instead of the match
    /// itself. Kept for compatibility with existing clients.
    pub fn set_nextone(&mut self, nextone: bool) {
        self.nextone = nextone;
    }

    /// Index `content` as a response, triggered by `trigger` when given,
    /// else by the content itself.
    pub fn add_entry(&mut self, content: &[u8], trigger: Option<&[u8]>) -> Result<DocId> {
        self.engine.insert(content, trigger.unwrap_or(content))
    }

    /// Answer one line. Never fails: an empty or errored lookup falls
    /// back to the random-output list, and `None` only means the bot has
    /// nothing configured to say at all.
    pub fn input(&self, say: &[u8], avoid: &[DocId]) -> Option<Vec<u8>> {
        let mut text = say.to_vec();
        for (regex, replacement) in &self.synonyms {
            text = regex.replace_all(&text, replacement.as_slice()).into_owned();
        }
        text.extend_from_slice(&QUERY_SENTINEL);

        let score = self.engine.query(&text, QueryMode::Part, None);
        let mut hits: Vec<(DocId, i64)> = score.into_iter().collect();
        // Descending score; ascending id keeps ties deterministic.
        hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for (id, _) in hits {
            let id = if self.nextone {
                DocId(id.value() % self.engine.idxcount() + 1)
            } else {
                id
            };
            if avoid.contains(&id) || self.engine.is_deleted(id) {
                continue;
            }
            if let Some(key) = self.engine.get_key(id) {
                return Some(key);
            }
        }

        self.random_outputs
            .choose(&mut rand::thread_rng())
            .cloned()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}
