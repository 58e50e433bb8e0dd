//! Binary buffer primitives for the lib0 encoding used by Yjs updates.
//!
//! [`Reader`] never panics on malformed input: every read is bounds-checked
//! and reports a [`BufferError`]. [`Writer`] appends to a growable buffer.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Largest integer the lib0 variable-length encoding can represent
/// (`Number.MAX_SAFE_INTEGER`).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("unexpected end of buffer")]
    UnexpectedEof,
    #[error("variable-length integer out of range")]
    IntegerOutOfRange,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
}
