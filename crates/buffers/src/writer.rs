//! Binary buffer writer backed by a growable vector.

/// Appends lib0-encoded values to an in-memory buffer.
///
/// # Example
///
/// ```
/// use y_inspect_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.var_uint(150);
/// writer.var_string("abc");
/// assert_eq!(writer.flush(), [0x96, 0x01, 0x03, b'a', b'b', b'c']);
/// ```
#[derive(Debug, Default)]
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    /// Takes the written bytes, leaving the writer empty.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    /// Writes raw bytes without a length prefix.
    pub fn buf(&mut self, buf: &[u8]) {
        self.uint8.extend_from_slice(buf);
    }

    /// Writes a signed 64-bit big-endian integer.
    pub fn i64(&mut self, val: i64) {
        self.buf(&val.to_be_bytes());
    }

    /// Writes a 32-bit big-endian float.
    pub fn f32(&mut self, val: f32) {
        self.buf(&val.to_be_bytes());
    }

    /// Writes a 64-bit big-endian float.
    pub fn f64(&mut self, val: f64) {
        self.buf(&val.to_be_bytes());
    }

    /// Writes an unsigned variable-length integer.
    pub fn var_uint(&mut self, mut num: u64) {
        while num > 0x7f {
            self.u8(0x80 | (num & 0x7f) as u8);
            num >>= 7;
        }
        self.u8(num as u8);
    }

    /// Writes a signed variable-length integer (sign in bit 0x40 of the
    /// first byte).
    pub fn var_int(&mut self, num: i64) {
        let negative = num < 0;
        let mut abs = num.unsigned_abs();
        let continued = if abs > 0x3f { 0x80 } else { 0 };
        let sign = if negative { 0x40 } else { 0 };
        self.u8(continued | sign | (abs & 0x3f) as u8);
        abs >>= 6;
        while abs > 0 {
            let continued = if abs > 0x7f { 0x80 } else { 0 };
            self.u8(continued | (abs & 0x7f) as u8);
            abs >>= 7;
        }
    }

    /// Writes a UTF-8 string prefixed with its byte length.
    pub fn var_string(&mut self, s: &str) {
        self.var_uint(s.len() as u64);
        self.buf(s.as_bytes());
    }

    /// Writes a byte array prefixed with its length.
    pub fn var_buf(&mut self, buf: &[u8]) {
        self.var_uint(buf.len() as u64);
        self.buf(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reader;
    use proptest::prelude::*;

    #[test]
    fn test_var_uint_boundaries() {
        let mut writer = Writer::new();
        writer.var_uint(0);
        writer.var_uint(127);
        writer.var_uint(128);
        assert_eq!(writer.flush(), [0x00, 0x7f, 0x80, 0x01]);
    }

    #[test]
    fn test_var_int_negative() {
        let mut writer = Writer::new();
        writer.var_int(-1);
        writer.var_int(-64);
        assert_eq!(writer.flush(), [0x41, 0xc0, 0x01]);
    }

    #[test]
    fn test_flush_resets() {
        let mut writer = Writer::new();
        writer.u8(0x01);
        assert_eq!(writer.flush(), [0x01]);
        writer.u8(0x02);
        assert_eq!(writer.flush(), [0x02]);
        assert!(writer.is_empty());
    }

    #[test]
    fn test_var_string_multibyte() {
        let mut writer = Writer::new();
        writer.var_string("café");
        let data = writer.flush();
        assert_eq!(data[0] as usize, "café".len());
        let mut reader = Reader::new(&data);
        assert_eq!(reader.var_string(), Ok("café"));
    }

    proptest! {
        #[test]
        fn var_uint_reads_back(n in 0u64..=crate::MAX_SAFE_INTEGER) {
            let mut writer = Writer::new();
            writer.var_uint(n);
            let data = writer.flush();
            let mut reader = Reader::new(&data);
            prop_assert_eq!(reader.var_uint(), Ok(n));
            prop_assert!(reader.is_empty());
        }

        #[test]
        fn var_int_reads_back(n in -(crate::MAX_SAFE_INTEGER as i64)..=(crate::MAX_SAFE_INTEGER as i64)) {
            let mut writer = Writer::new();
            writer.var_int(n);
            let data = writer.flush();
            let mut reader = Reader::new(&data);
            prop_assert_eq!(reader.var_int(), Ok(n));
        }
    }
}
