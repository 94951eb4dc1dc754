//! Little-endian primitive readers and writers over byte streams.
//!
//! All fixed-width numeric fields are little-endian. Floating-point values
//! use the IEEE-754 bit layout, except that every NaN is written with the
//! negative quiet-NaN bit pattern (0xFFC00000 / 0xFFF8000000000000) for
//! compatibility with peer implementations.

use std::io::{Read, Write};

use crate::error::{FormatError, Result, UsageError};

/// Bit pattern written for every f32 NaN.
pub(crate) const F32_NAN_BITS: u32 = 0xFFC0_0000;

/// Bit pattern written for every f64 NaN.
pub(crate) const F64_NAN_BITS: u64 = 0xFFF8_0000_0000_0000;

/// Reads SBDF primitive values from an [`io::Read`](std::io::Read) source.
///
/// The caller owns the underlying source; dropping the reader does not close
/// it.
pub struct BinaryReader<R> {
    inner: R,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the underlying byte source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                FormatError::UnexpectedEof.into()
            } else {
                FormatError::Io(e).into()
            }
        })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? == 1)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    /// Reads an f32, preserving the bit pattern exactly. The canonical NaN
    /// written by [`BinaryWriter::write_f32`] comes back as the negative
    /// quiet NaN.
    pub fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(f32::from_bits(u32::from_le_bytes(buf)))
    }

    /// Reads an f64, preserving the bit pattern exactly.
    pub fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(f64::from_bits(u64::from_le_bytes(buf)))
    }

    /// Reads exactly `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Advances the stream by `len` bytes without retaining them.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let copied = std::io::copy(&mut self.inner.by_ref().take(len), &mut std::io::sink())
            .map_err(FormatError::Io)?;
        if copied < len {
            return Err(FormatError::UnexpectedEof.into());
        }
        Ok(())
    }

    /// Reads an `i32` length field, rejecting negative values.
    pub fn read_len(&mut self) -> Result<usize> {
        let n = self.read_i32()?;
        usize::try_from(n).map_err(|_| FormatError::InvalidLength { read: n }.into())
    }

    /// Reads an `i32`-length-prefixed byte blob.
    pub fn read_blob(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    /// Skips over an `i32`-length-prefixed byte blob.
    pub fn skip_blob(&mut self) -> Result<()> {
        let len = self.read_len()?;
        self.skip(len as u64)
    }

    /// Reads an `i32`-length-prefixed UTF-8 string. Decoding is strict.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_blob()?;
        String::from_utf8(bytes)
            .map_err(|e| FormatError::InvalidUtf8(e.utf8_error()).into())
    }

    /// Skips over an `i32`-length-prefixed string.
    pub fn skip_string(&mut self) -> Result<()> {
        self.skip_blob()
    }
}

/// Writes SBDF primitive values to an [`io::Write`](std::io::Write) sink.
///
/// The caller owns the underlying sink; dropping the writer does not close
/// or flush it.
pub struct BinaryWriter<W> {
    inner: W,
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns the underlying byte sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(FormatError::Io)?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(if value { 1 } else { 0 })
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes an f32. Every NaN is canonicalized to the negative quiet-NaN
    /// bit pattern 0xFFC00000.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        let bits = if value.is_nan() {
            F32_NAN_BITS
        } else {
            value.to_bits()
        };
        self.write_bytes(&bits.to_le_bytes())
    }

    /// Writes an f64. Every NaN is canonicalized to the negative quiet-NaN
    /// bit pattern 0xFFF8000000000000.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        let bits = if value.is_nan() {
            F64_NAN_BITS
        } else {
            value.to_bits()
        };
        self.write_bytes(&bits.to_le_bytes())
    }

    /// Writes an `i32` length field.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let n = i32::try_from(len).map_err(|_| UsageError::LengthOverflow { len })?;
        self.write_i32(n)
    }

    /// Writes an `i32`-length-prefixed byte blob.
    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_len(bytes.len())?;
        if !bytes.is_empty() {
            self.write_bytes(bytes)?;
        }
        Ok(())
    }

    /// Writes an `i32`-length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_blob(value.as_bytes())
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(FormatError::Io)?;
        Ok(())
    }
}
