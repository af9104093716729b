//! Error taxonomy for the asset codec.
//!
//! Every codec, format and stream function returns [`AssetResult`]. Only
//! [`AssetError::Allocation`] is fatal; every other variant rejects a single
//! asset and leaves the caller free to continue with the next one.

use std::path::PathBuf;

/// Result alias used across the crate.
pub type AssetResult<T> = Result<T, AssetError>;

/// Failure category reported by the deflate/inflate layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// The output buffer for a declared length could not be obtained.
    MemoryExhausted,
    /// The stream needs more room than the declared length provides.
    BufferTooSmall,
    /// The stream is malformed, fails its checksum or has the wrong length.
    DataCorrupted,
}

impl std::fmt::Display for CodecErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MemoryExhausted => "memory exhausted",
            Self::BufferTooSmall => "buffer too small",
            Self::DataCorrupted => "data corrupted",
        };
        f.write_str(name)
    }
}

/// Error type for packing and loading assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    #[error("compression failed: {kind}")]
    Compression { kind: CodecErrorKind },

    #[error("decompression failed: {kind}")]
    Decompression { kind: CodecErrorKind },

    #[error("bad magic number: expected {expected:#018x}, found {actual:#018x}")]
    Format { expected: u64, actual: u64 },

    #[error("range {start}+{length} exceeds {available} available bytes")]
    TruncatedData {
        start: u64,
        length: u64,
        available: u64,
    },

    #[error("mip level {level} has zero width")]
    ZeroDimension { level: usize },

    #[error("unsupported texture target {0:#06x}")]
    UnsupportedTarget(u32),

    #[error("unsupported pixel format {0:#06x}")]
    UnsupportedFormat(u32),

    #[error("unsupported component type {0:#06x}")]
    UnsupportedComponentType(u32),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("{blob} holds {actual} bytes but the record declares {expected}")]
    BlobSizeMismatch {
        blob: String,
        expected: u64,
        actual: u64,
    },

    #[error("failed to open {path:?}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} is not a {expected} file (magic {actual_magic:#018x})")]
    FileType {
        path: PathBuf,
        expected: &'static str,
        actual_magic: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AssetError {
    /// Whether the process should stop instead of skipping the asset.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Allocation { .. })
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidHeader(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_allocation_is_fatal() {
        assert!(AssetError::Allocation { bytes: 16 }.is_fatal());
        assert!(
            !AssetError::Decompression {
                kind: CodecErrorKind::DataCorrupted
            }
            .is_fatal()
        );
        assert!(
            !AssetError::Format {
                expected: 1,
                actual: 2
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = AssetError::Format {
            expected: 0xF241_2829_43FF_0001,
            actual: 0,
        };
        assert!(err.to_string().contains("0xf241282943ff0001"));

        let err = AssetError::Decompression {
            kind: CodecErrorKind::BufferTooSmall,
        };
        assert_eq!(err.to_string(), "decompression failed: buffer too small");
    }
}
