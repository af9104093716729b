//! Binary serialization trait for format headers.
//!
//! The fixed-size headers of every Lumen format implement
//! `BinarySerializable`, a uniform view of their size and byte form. Each
//! header keeps its own `to_bytes()` returning a fixed-size array, and the
//! payload decoders read headers through their inherent readers so they can
//! report typed errors; `deserialize` collapses those errors to `None`.

/// Trait for binary-serializable fixed-size format headers.
///
/// # Example
///
/// ```
/// use lumen_assets::formats::{BinarySerializable, DataRange};
///
/// let range = DataRange::new(56, 36);
/// let bytes = range.serialize();
/// assert_eq!(DataRange::deserialize(&bytes), Some(range));
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    fn serialize(&self) -> Vec<u8>;

    /// Returns `None` if the byte slice is too short or holds invalid data.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::DataRange {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::GeometryHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes).ok()
    }
}

impl BinarySerializable for super::PixelHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes).ok()
    }
}

impl BinarySerializable for super::MipRange {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}
