use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;

/// Bytes ahead of the triples in a stored value: document id plus delim.
pub const HEADER_LEN: usize = 8;

/// One `(trailing_pair, freq)` group.
pub const TRIPLE_LEN: usize = 3;

/// Decoded view over one on-disk posting value.
///
/// Layout: `id(4, big-endian) || delim(4) || (trail_pair(2) || freq(1))+`.
/// Latin words store a single group whose pair is two spaces; padded
/// singles store a `!!` pair.
#[derive(Debug, Clone, Copy)]
pub struct Posting<'a> {
    pub doc_id: DocId,
    payload: &'a [u8],
    total_len: usize,
}

impl<'a> Posting<'a> {
    pub fn parse(value: &'a [u8]) -> Result<Posting<'a>> {
        if value.len() < HEADER_LEN + TRIPLE_LEN {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("posting value too short: {} bytes", value.len()),
            ));
        }
        if (value.len() - HEADER_LEN) % TRIPLE_LEN != 0 {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("posting payload misaligned: {} bytes", value.len()),
            ));
        }
        let doc_id = DocId::from_bytes([value[0], value[1], value[2], value[3]]);
        Ok(Posting {
            doc_id,
            payload: &value[HEADER_LEN..],
            total_len: value.len(),
        })
    }

    /// Full stored length, the weight used by leading-pair-only scoring.
    pub fn stored_len(&self) -> usize {
        self.total_len
    }

    pub fn triples(&self) -> impl Iterator<Item = ([u8; 2], u8)> + 'a {
        self.payload
            .chunks_exact(TRIPLE_LEN)
            .map(|t| ([t[0], t[1]], t[2]))
    }

    /// Term frequency of one trailing pair within this posting, if present.
    pub fn tf(&self, trail: &[u8; 2]) -> Option<u8> {
        self.triples()
            .find(|(pair, _)| pair == trail)
            .map(|(_, freq)| freq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(id: u32, payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&id.to_be_bytes());
        v.extend_from_slice(b"    ");
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn decodes_id_and_triples() {
        let v = value(7, &[0xA4, 0xE5, 2, 0x21, 0x21, 1]);
        let posting = Posting::parse(&v).unwrap();
        assert_eq!(posting.doc_id, DocId(7));
        assert_eq!(
            posting.triples().collect::<Vec<_>>(),
            vec![([0xA4, 0xE5], 2), ([0x21, 0x21], 1)]
        );
        assert_eq!(posting.tf(&[0xA4, 0xE5]), Some(2));
        assert_eq!(posting.tf(&[0xA4, 0xA4]), None);
        assert_eq!(posting.stored_len(), 14);
    }

    #[test]
    fn short_values_are_corrupt() {
        let err = Posting::parse(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Corrupt);
        let err = Posting::parse(&value(1, &[])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Corrupt);
    }

    #[test]
    fn misaligned_payloads_are_corrupt() {
        let err = Posting::parse(&value(1, &[0xA4, 0xE5, 2, 0x00])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Corrupt);
    }

    #[test]
    fn freq_bytes_cannot_false_match_a_pair() {
        // A freq byte equal to a trail byte must not shift the scan.
        let v = value(1, &[0xA4, 0xA4, 0xA4, 0xA4, 0xE5, 1]);
        let posting = Posting::parse(&v).unwrap();
        assert_eq!(posting.tf(&[0xA4, 0xE5]), None);
        assert_eq!(posting.tf(&[0xA4, 0xA4]), Some(0xA4));
    }
}
