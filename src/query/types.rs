/// How matched postings combine into the result map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Accumulate hit scores; silence on a miss.
    Fuzzy,
    /// Like Fuzzy, but key-only matches earn a small consolation score.
    Part,
    /// Conjunctive subset: each token narrows the candidate map, and an
    /// empty intermediate map short-circuits. Not a literal-text check;
    /// callers wanting verbatim matches must re-verify.
    Exact,
    /// Remove matched documents from the prior map.
    Not,
}

/// Two-byte tail appended to query text before parsing, producing a final
/// single-character token that keeps weight totals consistent across
/// queries.
pub const QUERY_SENTINEL: [u8; 2] = [0xA4, 0x3F];
