use bytes::{Buf, BytesMut};

use crate::error::{Result, SectionError};
use crate::layer::{check_nibble, checked_index, NUM_BLOCKS};

/// Bytes backing a full-section nibble array.
pub const PACKED_SIZE: usize = NUM_BLOCKS / 2;

/// Bytes needed to hold `length` nibbles.
#[inline]
pub fn packed_len(length: usize) -> usize {
    (length + 1) / 2
}

#[inline]
pub(crate) fn extract_nibble(index: usize, byte: u8) -> u8 {
    if index & 1 == 0 {
        byte & 0x0F
    } else {
        byte >> 4
    }
}

#[inline]
pub(crate) fn insert_nibble(index: usize, byte: u8, value: u8) -> u8 {
    if index & 1 == 0 {
        (byte & 0xF0) | value
    } else {
        (byte & 0x0F) | (value << 4)
    }
}

/// Fixed-length array of 4-bit values packed two per byte, the even index
/// in the low nibble.
///
/// Writes are read-modify-write on a byte shared by two indices, so one
/// array must not be written from two threads at once; `&mut self` on the
/// setters enforces that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedNibbleArray {
    data: BytesMut,
    length: usize,
}

impl PackedNibbleArray {
    /// Zero-filled array of `length` nibbles.
    pub fn new(length: usize) -> Self {
        PackedNibbleArray {
            data: BytesMut::zeroed(packed_len(length)),
            length,
        }
    }

    /// Zero-filled array covering one section.
    pub fn section() -> Self {
        Self::new(NUM_BLOCKS)
    }

    /// Takes over `buffer` starting at `offset` without copying. Bytes past
    /// the packed length are dropped from the view.
    pub fn wrap(mut buffer: BytesMut, offset: usize, length: usize) -> Result<Self> {
        let required = packed_len(length);
        let available = buffer.len().saturating_sub(offset);
        if offset > buffer.len() || available < required {
            return Err(SectionError::BufferTooSmall {
                required,
                available,
            });
        }
        buffer.advance(offset);
        buffer.truncate(required);
        Ok(PackedNibbleArray {
            data: buffer,
            length,
        })
    }

    /// Copies the first `ceil(length / 2)` bytes of `bytes`.
    pub fn from_slice(bytes: &[u8], length: usize) -> Result<Self> {
        let required = packed_len(length);
        if bytes.len() < required {
            return Err(SectionError::BufferTooSmall {
                required,
                available: bytes.len(),
            });
        }
        Ok(PackedNibbleArray {
            data: BytesMut::from(&bytes[..required]),
            length,
        })
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.length {
            return Err(SectionError::IndexOutOfRange {
                index,
                length: self.length,
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<u8> {
        self.check_index(index)?;
        Ok(self.get_unchecked(index))
    }

    pub fn set(&mut self, index: usize, value: u8) -> Result<()> {
        self.check_index(index)?;
        check_nibble(value)?;
        self.set_unchecked(index, value);
        Ok(())
    }

    /// YZX-addressed read.
    pub fn get_at(&self, x: usize, y: usize, z: usize) -> Result<u8> {
        self.get(checked_index(x, y, z)?)
    }

    /// YZX-addressed write.
    pub fn set_at(&mut self, x: usize, y: usize, z: usize, value: u8) -> Result<()> {
        self.set(checked_index(x, y, z)?, value)
    }

    // index < length and value < 16 are the caller's to guarantee
    #[inline]
    pub(crate) fn get_unchecked(&self, index: usize) -> u8 {
        extract_nibble(index, self.data[index >> 1])
    }

    #[inline]
    pub(crate) fn set_unchecked(&mut self, index: usize, value: u8) {
        let byte = &mut self.data[index >> 1];
        *byte = insert_nibble(index, *byte, value);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> BytesMut {
        self.data
    }

    /// True when every nibble is zero.
    pub fn is_zeroed(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }
}
