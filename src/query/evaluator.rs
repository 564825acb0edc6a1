use log::warn;

use crate::analysis::token::SINGLE_MARK;
use crate::core::types::ScoreMap;
use crate::index::codec::{Record, DELIM};
use crate::index::posting::Posting;
use crate::query::types::QueryMode;
use crate::scoring::scorer::{hit_score, miss_score};
use crate::storage::store::DupStore;

/// Where the evaluator reads postings from. Returning `None` skips the
/// token entirely (routed out of this engine's slice, or the store
/// failed and logged).
pub trait PostingSource {
    fn matched(&self, key: &[u8]) -> Option<Vec<Vec<u8>>>;
}

/// Any unrouted store serves postings directly.
impl<S: DupStore> PostingSource for S {
    fn matched(&self, key: &[u8]) -> Option<Vec<Vec<u8>>> {
        Some(self.dup_values(key))
    }
}

/// Run packed query records against a posting source.
///
/// Tokens arrive in sorted order; for each, every duplicate value under
/// the token key is gathered, then each 3-byte query group is scored
/// against them. The `!!` group scores by stored length (the query held a
/// bare character, so any posting under its leading pair counts); full
/// trailing pairs score by term frequency. Scores are normalized by the
/// total query weight at the end.
pub fn evaluate(
    source: &impl PostingSource,
    records: &[Record],
    mode: QueryMode,
    prior: ScoreMap,
) -> ScoreMap {
    let mut score = prior;
    let mut words: i64 = 0;

    for record in records {
        let Some(matched) = source.matched(&record.key) else {
            continue;
        };
        let postings: Vec<Posting> = matched
            .iter()
            .filter_map(|value| match Posting::parse(value) {
                Ok(posting) => Some(posting),
                Err(err) => {
                    warn!(
                        "skipping posting under key {:?}: {}",
                        String::from_utf8_lossy(&record.key),
                        err
                    );
                    None
                }
            })
            .collect();

        // Staging map for the conjunctive mode; survivors of this token.
        let mut next = ScoreMap::new();

        let payload = &record.value[DELIM.len()..];
        for triple in payload.chunks_exact(3) {
            let trail = [triple[0], triple[1]];
            let weight = triple[2] as i64;
            words += weight;

            if trail == SINGLE_MARK {
                // Bare-character query: weight every posting by its share
                // of the total stored bytes under this lead.
                let wordcount: i64 = postings.iter().map(|p| p.stored_len() as i64).sum();
                if wordcount == 0 {
                    continue;
                }
                for posting in &postings {
                    let add = hit_score(posting.stored_len() as i64, wordcount, weight);
                    apply_hit(mode, &mut score, &mut next, posting, add);
                }
            } else {
                let tfs: Vec<Option<i64>> =
                    postings.iter().map(|p| p.tf(&trail).map(i64::from)).collect();
                let wordcount: i64 = tfs.iter().flatten().sum();

                for (posting, tf) in postings.iter().zip(&tfs) {
                    match tf {
                        Some(tf) => {
                            let add = hit_score(*tf, wordcount, weight);
                            apply_hit(mode, &mut score, &mut next, posting, add);
                        }
                        None if mode == QueryMode::Part => {
                            *score.entry(posting.doc_id).or_insert(0) += miss_score(words);
                        }
                        None => {}
                    }
                }
            }
        }

        if mode == QueryMode::Exact {
            score = next;
            if score.is_empty() {
                // No document can satisfy the remaining conjuncts.
                return score;
            }
        }
    }

    if words > 1 {
        for value in score.values_mut() {
            *value /= words;
        }
    }
    score
}

fn apply_hit(mode: QueryMode, score: &mut ScoreMap, next: &mut ScoreMap, posting: &Posting, add: i64) {
    let doc = posting.doc_id;
    match mode {
        QueryMode::Fuzzy | QueryMode::Part => {
            *score.entry(doc).or_insert(0) += add;
        }
        QueryMode::Exact => {
            if score.is_empty() {
                next.insert(doc, add);
            } else if let Some(&carried) = score.get(&doc) {
                next.insert(doc, add + carried);
            }
        }
        QueryMode::Not => {
            score.remove(&doc);
        }
    }
}
