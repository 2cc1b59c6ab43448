//! Little-endian decoding over a borrowed byte buffer.
//!
//! Every read is offset-addressed rather than stream-positioned, since the
//! on-disk records this crate decodes (superblock, group descriptor, inode)
//! are fixed-layout structures with conditional fields at well-known
//! offsets, not a sequential stream.

use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// A read-only view over a buffer, with bounds-checked little-endian reads.
///
/// A short read never silently returns truncated or zeroed data: it fails
/// with [`Error::Malformed`].
pub struct ByteCursor<'a> {
    buf: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn slice_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::malformed("offset overflow"))?;
        self.buf.get(offset..end).ok_or_else(|| {
            Error::malformed(format!(
                "read of {len} bytes at offset {offset} exceeds buffer of {}",
                self.buf.len()
            ))
        })
    }

    /// Reads an unsigned 16-bit little-endian integer at `offset`.
    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.slice_at(offset, 2)?))
    }

    /// Reads an unsigned 32-bit little-endian integer at `offset`.
    ///
    /// Never sign-extends: the return type is unsigned.
    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.slice_at(offset, 4)?))
    }

    /// Reads an unsigned 8-bit integer at `offset`.
    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.slice_at(offset, 1)?[0])
    }

    /// Reads a sub-slice of `len` bytes starting at `offset`.
    pub fn bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        self.slice_at(offset, len)
    }
}
