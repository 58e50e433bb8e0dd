//! Binary buffer reader with cursor tracking.

use std::str;

use crate::{BufferError, MAX_SAFE_INTEGER};

/// A bounds-checked reader over a byte slice.
///
/// The reader keeps a cursor `x` into `uint8`. Every method validates that
/// enough bytes remain before advancing, so a truncated buffer surfaces as
/// [`BufferError::UnexpectedEof`] rather than a panic.
///
/// # Example
///
/// ```
/// use y_inspect_buffers::Reader;
///
/// let data = [0x96, 0x01, 0x03, b'a', b'b', b'c'];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.var_uint(), Ok(150));
/// assert_eq!(reader.var_string(), Ok("abc"));
/// assert!(reader.is_empty());
/// ```
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader positioned at the start of `uint8`.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Returns the number of unread bytes.
    pub fn size(&self) -> usize {
        self.uint8.len().saturating_sub(self.x)
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        match self.x.checked_add(n) {
            Some(end) if end <= self.uint8.len() => Ok(()),
            _ => Err(BufferError::UnexpectedEof),
        }
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.check(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads `size` raw bytes and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let start = self.x;
        self.x += size;
        Ok(&self.uint8[start..self.x])
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let bytes = self.buf(size)?;
        str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.buf(N)?);
        Ok(out)
    }

    /// Reads a signed 64-bit big-endian integer.
    pub fn i64(&mut self) -> Result<i64, BufferError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    /// Reads a 32-bit big-endian float.
    pub fn f32(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    /// Reads a 64-bit big-endian float.
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    /// Reads an unsigned LEB128-style integer (7 payload bits per byte,
    /// high bit = continuation).
    ///
    /// Values above [`MAX_SAFE_INTEGER`] are rejected.
    pub fn var_uint(&mut self) -> Result<u64, BufferError> {
        let mut num: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let r = self.u8()?;
            num |= ((r & 0x7f) as u64)
                .checked_shl(shift)
                .ok_or(BufferError::IntegerOutOfRange)?;
            if num > MAX_SAFE_INTEGER {
                return Err(BufferError::IntegerOutOfRange);
            }
            if r < 0x80 {
                return Ok(num);
            }
            shift += 7;
            if shift > 53 {
                return Err(BufferError::IntegerOutOfRange);
            }
        }
    }

    /// Reads a signed variable-length integer.
    ///
    /// The first byte carries a continuation bit (0x80), a sign bit (0x40)
    /// and six payload bits; subsequent bytes carry seven payload bits.
    pub fn var_int(&mut self) -> Result<i64, BufferError> {
        let first = self.u8()?;
        let negative = first & 0x40 != 0;
        let mut num = (first & 0x3f) as u64;
        if first & 0x80 != 0 {
            let mut shift: u32 = 6;
            loop {
                let r = self.u8()?;
                num |= ((r & 0x7f) as u64)
                    .checked_shl(shift)
                    .ok_or(BufferError::IntegerOutOfRange)?;
                if num > MAX_SAFE_INTEGER {
                    return Err(BufferError::IntegerOutOfRange);
                }
                if r < 0x80 {
                    break;
                }
                shift += 7;
                if shift > 53 {
                    return Err(BufferError::IntegerOutOfRange);
                }
            }
        }
        let num = num as i64;
        Ok(if negative { -num } else { num })
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn var_string(&mut self) -> Result<&'a str, BufferError> {
        let len = self.var_len()?;
        self.utf8(len)
    }

    /// Reads a length-prefixed byte array.
    pub fn var_buf(&mut self) -> Result<&'a [u8], BufferError> {
        let len = self.var_len()?;
        self.buf(len)
    }

    /// Reads a `var_uint` used as a length and checks it against the bytes
    /// that remain, so a corrupt length can never trigger a huge allocation.
    pub fn var_len(&mut self) -> Result<usize, BufferError> {
        let len = self.var_uint()?;
        if len > self.size() as u64 {
            return Err(BufferError::UnexpectedEof);
        }
        Ok(len as usize)
    }
}
