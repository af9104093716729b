//! Byte ranges inside a decoded payload, plus the little-endian cursor used
//! to parse headers field by field.

use crate::error::{AssetError, AssetResult};

/// A blob location inside a decompressed asset payload.
///
/// # Layout
/// ```text
/// 0x00: start u64 (offset from the start of the payload)
/// 0x08: length u64
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataRange {
    pub start: u64,
    pub length: u64,
}

impl DataRange {
    pub const SIZE: usize = 16;

    pub const fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// One past the last byte of the range.
    pub fn end(&self) -> AssetResult<u64> {
        self.start
            .checked_add(self.length)
            .ok_or(AssetError::TruncatedData {
                start: self.start,
                length: self.length,
                available: u64::MAX,
            })
    }

    /// Borrow the bytes this range covers, failing if it leaves `payload`.
    pub fn slice<'a>(&self, payload: &'a [u8]) -> AssetResult<&'a [u8]> {
        let truncated = AssetError::TruncatedData {
            start: self.start,
            length: self.length,
            available: payload.len() as u64,
        };
        let end = self.end()?;
        if end > payload.len() as u64 {
            return Err(truncated);
        }
        // Both fit in usize because they are bounded by payload.len().
        Ok(&payload[self.start as usize..end as usize])
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.start.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let mut reader = ByteReader::new(bytes);
        Some(Self {
            start: reader.u64().ok()?,
            length: reader.u64().ok()?,
        })
    }
}

/// Sequential little-endian reader with bounds checks on every field.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Fail unless `count` entries of `entry_size` bytes are still available.
    pub(crate) fn require_table(&self, count: usize, entry_size: usize) -> AssetResult<()> {
        let needed = count
            .checked_mul(entry_size)
            .ok_or_else(|| AssetError::invalid(format!("table of {count} entries overflows")))?;
        if needed > self.remaining() {
            return Err(AssetError::TruncatedData {
                start: self.offset as u64,
                length: needed as u64,
                available: self.bytes.len() as u64,
            });
        }
        Ok(())
    }

    pub(crate) fn take(&mut self, len: usize) -> AssetResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(AssetError::TruncatedData {
                start: self.offset as u64,
                length: len as u64,
                available: self.bytes.len() as u64,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> AssetResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> AssetResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u32(&mut self) -> AssetResult<u32> {
        self.array().map(u32::from_le_bytes)
    }

    pub(crate) fn i32(&mut self) -> AssetResult<i32> {
        self.array().map(i32::from_le_bytes)
    }

    pub(crate) fn u64(&mut self) -> AssetResult<u64> {
        self.array().map(u64::from_le_bytes)
    }

    pub(crate) fn range(&mut self) -> AssetResult<DataRange> {
        Ok(DataRange {
            start: self.u64()?,
            length: self.u64()?,
        })
    }
}
