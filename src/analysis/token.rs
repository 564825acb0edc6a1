/// Longest Latin token kept, in bytes.
pub const MAXKEY: usize = 32;

/// Padding byte for single-character tokens: a lone Big5 character is
/// emitted as its two bytes followed by `!!`.
pub const SINGLE_PAD: u8 = 0x21;

/// Trailing-pair marker of a single-character token.
pub const SINGLE_MARK: [u8; 2] = [SINGLE_PAD, SINGLE_PAD];

/// Trailing-pair marker of a Latin word record.
pub const LATIN_MARK: [u8; 2] = *b"  ";

/// First byte of a double-byte character (includes the punctuation rows).
pub fn is_big5_lead(byte: u8) -> bool {
    byte > 0xA0
}

/// First byte of an indexable double-byte character. The rows between
/// 0xA1 and 0xA3 hold punctuation and are scanned over but never emitted.
pub fn is_big5_word(byte: u8) -> bool {
    byte > 0xA3
}

pub fn is_ascii_alnum(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte.is_ascii_uppercase() || byte.is_ascii_digit()
}

/// The three token shapes the parser produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Two adjacent Big5 characters, 4 bytes.
    Bigram,
    /// One Big5 character padded with `!!`, 4 bytes.
    Single,
    /// Lowercased ASCII alphanumeric run, 2..=MAXKEY bytes.
    Word,
}

impl TokenKind {
    pub fn of(token: &[u8]) -> Option<TokenKind> {
        match token {
            [lead, _, a, b] if is_big5_word(*lead) => {
                if [*a, *b] == SINGLE_MARK {
                    Some(TokenKind::Single)
                } else if is_big5_word(*a) {
                    Some(TokenKind::Bigram)
                } else {
                    None
                }
            }
            word if (2..=MAXKEY).contains(&word.len())
                && word.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()) =>
            {
                Some(TokenKind::Word)
            }
            _ => None,
        }
    }
}
