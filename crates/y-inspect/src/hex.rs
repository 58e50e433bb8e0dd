//! Hex transcripts of raw update bytes.

use thiserror::Error;

/// Rejected transcript text; nothing is converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("invalid hex input: odd length {0}")]
    OddLength(usize),
    #[error("invalid hex input: unexpected {ch:?} at offset {index}")]
    InvalidCharacter { ch: char, index: usize },
}

/// Lowercase, two digits per byte.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Parses a hex transcript. Surrounding whitespace is ignored and either
/// letter case is accepted.
pub fn from_hex(s: &str) -> Result<Vec<u8>, HexError> {
    let s = s.trim();
    hex::decode(s).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => {
            HexError::InvalidCharacter { ch: c, index }
        }
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            HexError::OddLength(s.len())
        }
    })
}
