//! Binary mesh and texture assets for the Lumen renderer
//!
//! This crate is shared between:
//! - the renderer (loading `.lmesh`, `.lmeshes` and `.ltex` files)
//! - `lumen-export` (the asset pipeline)
//!
//! # Modules
//!
//! - [`codec`] - zlib compression of whole payloads
//! - [`formats`] - mesh, container and texture layouts
//! - [`pixel`] - texture targets, pixel formats and their sizes
//! - [`ingest`] - imported triangle meshes to interleaved blobs
//! - [`stream`] - file reading and writing
//! - [`error`] - error taxonomy

pub mod codec;
pub mod error;
pub mod formats;
pub mod ingest;
pub mod pixel;
pub mod stream;

pub use error::{AssetError, AssetResult, CodecErrorKind};

pub use formats::{
    AssetFormat, AssetKind, BinarySerializable, BlobId, BlobSource, DataRange, Extent,
    GeometryAsset, GeometryDesc, GeometryRecord, IndexMode, IndexWidth, LUMEN_FORMAT, MeshBuffers,
    MeshContainer, MipLevel, MipSource, PixelRecord, PrimitiveType, TextureAsset, TextureDesc,
};

pub use ingest::{IngestedMesh, Topology, TriangleMesh, ingest};

pub use pixel::{
    ComponentType, ExternalFormat, IDENTITY_SWIZZLE, InternalFormat, Swizzle, TextureTarget,
};
