use std::collections::BTreeMap;

use crate::analysis::token::{is_ascii_alnum, is_big5_lead, is_big5_word, MAXKEY, SINGLE_MARK};

/// Ordered token multiset: token bytes to occurrence count, iterated in
/// ascending bytewise order.
pub type TokenMap = BTreeMap<Vec<u8>, u32>;

/// Extract weighted tokens from a mixed Big5/Latin byte buffer in one
/// linear pass.
///
/// Emits three token shapes: adjacent Big5 bigrams (4 bytes), lone Big5
/// characters padded with `!!`, and lowercased ASCII alphanumeric runs of
/// two or more bytes. A run of N consecutive Big5 word characters yields
/// N-1 rolling bigrams plus a padded single for the run's final character;
/// with `query` set that single is suppressed whenever the character
/// already participated in a bigram, so query token totals stay flat.
///
/// Scanning stops at the first NUL byte. An incomplete trailing pair is
/// ignored.
pub fn extract(bytes: &[u8], query: bool) -> TokenMap {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = &bytes[..end];
    let at = |i: usize| -> u8 {
        if i < text.len() {
            text[i]
        } else {
            0
        }
    };

    let mut tokens = TokenMap::new();
    let mut p = 0usize;

    while at(p) != 0 {
        if is_big5_lead(at(p)) {
            p += 2;
            if is_big5_word(at(p)) {
                // A full word pair follows; the char before it opens the
                // bigram run only if it is itself a word char (the 0xA1-0xA3
                // punctuation rows never appear in bigrams).
                if is_big5_word(at(p - 2)) && p + 2 <= text.len() {
                    bump(&mut tokens, &text[p - 2..p + 2]);
                }
                p += 2;
                while is_big5_word(at(p)) {
                    if p + 2 <= text.len() {
                        bump(&mut tokens, &text[p - 2..p + 2]);
                    }
                    p += 2;
                }
                // Pad the run's final character as a single, except in query
                // mode when it already closed a bigram.
                if !(query && is_big5_word(at(p - 4))) && p <= text.len() {
                    bump_single(&mut tokens, &text[p - 2..p]);
                }
            } else if is_big5_word(at(p - 2)) && p <= text.len() {
                // Isolated word char with no word pair after it.
                bump_single(&mut tokens, &text[p - 2..p]);
            }
        } else if is_ascii_alnum(at(p)) {
            let start = p;
            while is_ascii_alnum(at(p)) {
                p += 1;
            }
            if p - start > 1 {
                let len = (p - start).min(MAXKEY);
                let word: Vec<u8> = text[start..start + len]
                    .iter()
                    .map(|b| b.to_ascii_lowercase())
                    .collect();
                *tokens.entry(word).or_insert(0) += 1;
            }
        } else {
            p += 1;
        }
    }

    tokens
}

fn bump(tokens: &mut TokenMap, token: &[u8]) {
    *tokens.entry(token.to_vec()).or_insert(0) += 1;
}

fn bump_single(tokens: &mut TokenMap, pair: &[u8]) {
    let mut token = Vec::with_capacity(4);
    token.extend_from_slice(pair);
    token.extend_from_slice(&SINGLE_MARK);
    *tokens.entry(token).or_insert(0) += 1;
}
