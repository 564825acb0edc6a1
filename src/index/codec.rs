use crate::analysis::parser::TokenMap;
use crate::analysis::token::{is_big5_lead, LATIN_MARK};

/// Seed written ahead of the packed triples. On disk the engine prepends
/// the document id, so stored values read `id || delim || triples`.
pub const DELIM: [u8; 4] = *b"    ";

/// Frequencies are capped at one byte below the Big5 word range.
pub const FREQ_CAP: u32 = 0xA3;

/// One packed record: the store key (a Big5 leading pair or a Latin word)
/// plus its delim-prefixed payload of 3-byte groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

pub fn clamp_freq(freq: u32) -> u8 {
    freq.min(FREQ_CAP) as u8
}

/// Pack an ordered token multiset into records.
///
/// Consecutive Big5 tokens sharing a leading pair coalesce into a single
/// record whose payload carries one `(trailing_pair, freq)` triple per
/// token; padded singles group like any bigram, contributing a `!!`
/// triple. Latin words become their own record with the two-space marker.
/// Big5-lead tokens that are not exactly 4 bytes are dropped.
pub fn encode(tokens: &TokenMap, delim: &[u8; 4]) -> Vec<Record> {
    let mut records = Vec::new();
    let mut pending: Option<Record> = None;

    for (token, &freq) in tokens {
        if is_big5_lead(token[0]) {
            if token.len() != 4 {
                continue;
            }
            let (lead, trail) = token.split_at(2);
            match &mut pending {
                Some(record) if record.key == lead => {
                    record.value.extend_from_slice(trail);
                    record.value.push(clamp_freq(freq));
                }
                slot => {
                    if let Some(record) = slot.take() {
                        records.push(record);
                    }
                    let mut value = Vec::with_capacity(delim.len() + 3);
                    value.extend_from_slice(delim);
                    value.extend_from_slice(trail);
                    value.push(clamp_freq(freq));
                    *slot = Some(Record {
                        key: lead.to_vec(),
                        value,
                    });
                }
            }
        } else {
            // Latin tokens sort below the Big5 range, but flush anyway so
            // arbitrary caller-supplied maps stay correct.
            if let Some(record) = pending.take() {
                records.push(record);
            }
            let mut value = Vec::with_capacity(delim.len() + 3);
            value.extend_from_slice(delim);
            value.extend_from_slice(&LATIN_MARK);
            value.push(clamp_freq(freq));
            records.push(Record {
                key: token.clone(),
                value,
            });
        }
    }

    if let Some(record) = pending.take() {
        records.push(record);
    }
    records
}
