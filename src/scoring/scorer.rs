//! Integer scoring formula.
//!
//! A hit is rewarded for shared presence (the constant term), for the
//! posting's share of the total term frequency under the matched key, and
//! for the query-side weight. All arithmetic is integral; truncation is
//! part of the contract, since promoting to floats would change
//! tie-breaking.

/// Scale applied to the relative-frequency part of a hit.
pub const HIT_SCALE: i64 = 800;

/// Flat reward for any hit.
pub const HIT_BASE: i64 = 200;

/// Numerator of the consolation score a partial match hands to postings
/// that matched the key but not the trailing pair.
pub const MISS_NUMERATOR: i64 = 50;

/// Score contribution of one matched posting.
///
/// `weight` is the query-side frequency of the token; `wordcount` must be
/// the sum of `tf` over every matched posting, and must be positive.
pub fn hit_score(tf: i64, wordcount: i64, weight: i64) -> i64 {
    (tf * HIT_SCALE / wordcount + HIT_BASE) * weight
}

/// Consolation contribution for a key-only match under PART mode.
/// `words` is the running total of query-side weights, always >= 1 by the
/// time a triple is scored.
pub fn miss_score(words: i64) -> i64 {
    MISS_NUMERATOR / words
}
