//! zlib compression of whole asset payloads.
//!
//! # Layout
//! ```text
//! 0x00:        reserved prefix (caller-owned, e.g. the asset magic)
//! prefix+0x00: uncompressed_length u64
//! prefix+0x08: compressed_length u64
//! prefix+0x10: zlib stream (compressed_length bytes)
//! ```
//!
//! The whole record (header table and every blob) is compressed as one
//! stream. Nothing inside the payload is randomly addressable until the
//! stream has been inflated.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::{AssetError, AssetResult, CodecErrorKind};
use crate::formats::range::ByteReader;

/// Fixed deflate level used for every asset.
pub const COMPRESSION_LEVEL: u32 = 9;

/// Size of the two length fields that follow the reserved prefix.
pub const LENGTH_HEADER_SIZE: usize = 16;

/// View of a length-prefixed compressed region inside a larger buffer.
#[derive(Debug, Clone, Copy)]
pub struct CompressedBlob<'a> {
    pub uncompressed_length: u64,
    pub compressed_length: u64,
    pub payload: &'a [u8],
}

impl<'a> CompressedBlob<'a> {
    /// Parse the length fields after `reserved_prefix` bytes of `data`.
    ///
    /// Trailing bytes after the payload are ignored, so this also locates a
    /// record embedded in a larger buffer.
    pub fn parse(data: &'a [u8], reserved_prefix: usize) -> AssetResult<Self> {
        let body = data.get(reserved_prefix..).ok_or(AssetError::TruncatedData {
            start: 0,
            length: reserved_prefix as u64,
            available: data.len() as u64,
        })?;
        let mut reader = ByteReader::new(body);
        let uncompressed_length = reader.u64()?;
        let compressed_length = reader.u64()?;

        let payload_len =
            usize::try_from(compressed_length).map_err(|_| AssetError::TruncatedData {
                start: (reserved_prefix + LENGTH_HEADER_SIZE) as u64,
                length: compressed_length,
                available: data.len() as u64,
            })?;
        let payload = reader.take(payload_len)?;

        Ok(Self {
            uncompressed_length,
            compressed_length,
            payload,
        })
    }

    /// Bytes this blob occupies after the prefix (length fields + payload).
    pub fn encoded_len(&self) -> usize {
        LENGTH_HEADER_SIZE + self.payload.len()
    }
}

/// Worst-case deflate output for `len` input bytes, including zlib framing.
fn compress_bound(len: usize) -> usize {
    let stored = len + (len / (31 * 1024) + 1) * 5;
    let ratio = len + len / 10;
    128 + stored.max(ratio)
}

/// Compress `data` into `[reserved_prefix][u64 len][u64 clen][zlib stream]`.
///
/// The prefix bytes are zeroed; callers overwrite them with their magic.
pub fn compress(data: &[u8], reserved_prefix: usize) -> AssetResult<Vec<u8>> {
    let header_len = reserved_prefix + LENGTH_HEADER_SIZE;
    let capacity = header_len + compress_bound(data.len());

    let mut out = Vec::new();
    out.try_reserve_exact(capacity)
        .map_err(|_| AssetError::Allocation { bytes: capacity })?;
    out.resize(header_len, 0);

    let mut encoder = Compress::new(Compression::new(COMPRESSION_LEVEL), true);
    let status = encoder
        .compress_vec(data, &mut out, FlushCompress::Finish)
        .map_err(|_| AssetError::Compression {
            kind: CodecErrorKind::DataCorrupted,
        })?;
    if status != Status::StreamEnd || encoder.total_in() != data.len() as u64 {
        return Err(AssetError::Compression {
            kind: CodecErrorKind::BufferTooSmall,
        });
    }

    let compressed_length = encoder.total_out();
    out[reserved_prefix..reserved_prefix + 8].copy_from_slice(&(data.len() as u64).to_le_bytes());
    out[reserved_prefix + 8..header_len].copy_from_slice(&compressed_length.to_le_bytes());

    tracing::debug!(
        uncompressed = data.len(),
        compressed = compressed_length,
        "compressed asset payload"
    );
    Ok(out)
}

/// Inflate the blob that follows `reserved_prefix` bytes of `data`.
///
/// Returns exactly `uncompressed_length` bytes or an error; a stream that
/// inflates to any other length is rejected.
pub fn decompress(data: &[u8], reserved_prefix: usize) -> AssetResult<Vec<u8>> {
    let blob = CompressedBlob::parse(data, reserved_prefix)?;
    inflate(&blob)
}

/// Inflate an already located blob.
pub fn inflate(blob: &CompressedBlob<'_>) -> AssetResult<Vec<u8>> {
    let failure = |kind| AssetError::Decompression { kind };

    // One spare byte lets an over-long stream show itself instead of
    // stopping exactly at the declared length.
    let declared = usize::try_from(blob.uncompressed_length)
        .map_err(|_| failure(CodecErrorKind::MemoryExhausted))?;
    let capacity = declared
        .checked_add(1)
        .ok_or(failure(CodecErrorKind::MemoryExhausted))?;

    let mut out = Vec::new();
    out.try_reserve_exact(capacity)
        .map_err(|_| failure(CodecErrorKind::MemoryExhausted))?;

    let mut decoder = Decompress::new(true);
    let status = decoder
        .decompress_vec(blob.payload, &mut out, FlushDecompress::Finish)
        .map_err(|_| failure(CodecErrorKind::DataCorrupted))?;

    match status {
        Status::StreamEnd => {
            if out.len() > declared {
                return Err(failure(CodecErrorKind::BufferTooSmall));
            }
            if out.len() < declared || decoder.total_in() != blob.payload.len() as u64 {
                return Err(failure(CodecErrorKind::DataCorrupted));
            }
        }
        Status::Ok | Status::BufError => {
            let kind = if out.len() >= declared {
                CodecErrorKind::BufferTooSmall
            } else {
                CodecErrorKind::DataCorrupted
            };
            return Err(failure(kind));
        }
    }

    Ok(out)
}
