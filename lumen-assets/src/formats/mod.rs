//! Lumen binary asset formats
//!
//! Every single-asset file is an 8-byte magic followed by one compressed
//! record (see [`crate::codec`]). The multi-mesh container concatenates such
//! files behind its own magic and a record count.
//!
//! All headers are little-endian and parsed field by field; no struct is
//! ever overlaid onto a byte buffer.

pub mod container;
pub mod mesh;
pub mod range;
mod serialization;
pub mod texture;

pub use container::{CONTAINER_HEADER_SIZE, ContainerRecords, MeshContainer, encode_many};
pub use mesh::{
    BlobId, BlobSource, DecodedGeometry, GeometryAsset, GeometryDesc, GeometryHeader,
    GeometryRecord, INDEX_WIDTH_THRESHOLD, IndexMode, IndexWidth, MeshBuffers, PrimitiveType,
    load_mesh, pack_mesh, payload_table_size,
};
pub use range::DataRange;
pub use serialization::BinarySerializable;
pub use texture::{
    DecodedTexture, Extent, MipLevel, MipRange, MipSource, PixelHeader, PixelRecord,
    TextureAsset, TextureDesc, load_texture, mip_chain, pack_texture, pixel_table_size,
};

use crate::codec;
use crate::error::{AssetError, AssetResult};

/// Size of the magic number that opens every asset file.
pub const MAGIC_SIZE: usize = 8;

/// File format constants for one family of Lumen assets.
///
/// Single source of truth for magic numbers and file extensions.
#[derive(Debug, Clone, Copy)]
pub struct AssetFormat {
    /// Magic of a single-mesh file
    pub mesh_magic: u64,

    /// Magic of a multi-mesh container
    pub container_magic: u64,

    /// Magic of a texture file
    pub texture_magic: u64,

    /// Mesh file extension without dot
    pub mesh_ext: &'static str,

    /// Container file extension without dot
    pub container_ext: &'static str,

    /// Texture file extension without dot
    pub texture_ext: &'static str,
}

/// The asset format written and read by this crate.
pub const LUMEN_FORMAT: AssetFormat = AssetFormat {
    mesh_magic: 0xF241_2829_43FF_0001,
    container_magic: 0xF242_1917_56FF_0003,
    texture_magic: 0xF242_4133_9FFF_0002,
    mesh_ext: "lmesh",
    container_ext: "lmeshes",
    texture_ext: "ltex",
};

/// Kind of asset identified by its leading magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Mesh,
    MeshContainer,
    Texture,
}

impl AssetKind {
    pub fn from_magic(magic: u64) -> Option<Self> {
        match magic {
            m if m == LUMEN_FORMAT.mesh_magic => Some(Self::Mesh),
            m if m == LUMEN_FORMAT.container_magic => Some(Self::MeshContainer),
            m if m == LUMEN_FORMAT.texture_magic => Some(Self::Texture),
            _ => None,
        }
    }

    pub fn magic(self) -> u64 {
        match self {
            Self::Mesh => LUMEN_FORMAT.mesh_magic,
            Self::MeshContainer => LUMEN_FORMAT.container_magic,
            Self::Texture => LUMEN_FORMAT.texture_magic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::MeshContainer => "mesh container",
            Self::Texture => "texture",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mesh => LUMEN_FORMAT.mesh_ext,
            Self::MeshContainer => LUMEN_FORMAT.container_ext,
            Self::Texture => LUMEN_FORMAT.texture_ext,
        }
    }
}

/// Read the leading magic number of an asset buffer.
pub fn read_magic(bytes: &[u8]) -> AssetResult<u64> {
    let head = bytes.get(..MAGIC_SIZE).ok_or(AssetError::TruncatedData {
        start: 0,
        length: MAGIC_SIZE as u64,
        available: bytes.len() as u64,
    })?;
    let mut magic = [0u8; MAGIC_SIZE];
    magic.copy_from_slice(head);
    Ok(u64::from_le_bytes(magic))
}

/// Fail with [`AssetError::Format`] unless `bytes` opens with `expected`.
pub fn check_magic(bytes: &[u8], expected: u64) -> AssetResult<()> {
    let actual = read_magic(bytes)?;
    if actual != expected {
        return Err(AssetError::Format { expected, actual });
    }
    Ok(())
}

/// Compress an encoded payload and stamp it with `magic`.
pub fn seal(magic: u64, payload: &[u8]) -> AssetResult<Vec<u8>> {
    let mut sealed = codec::compress(payload, MAGIC_SIZE)?;
    sealed[..MAGIC_SIZE].copy_from_slice(&magic.to_le_bytes());
    Ok(sealed)
}

/// Verify `magic` and inflate the payload of a sealed asset.
pub fn unseal(magic: u64, bytes: &[u8]) -> AssetResult<Vec<u8>> {
    check_magic(bytes, magic)?;
    codec::decompress(bytes, MAGIC_SIZE)
}
