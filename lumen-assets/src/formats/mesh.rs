//! Lumen mesh binary format (.lmesh)
//!
//! # File layout
//! ```text
//! 0x00: magic u64 = 0xF241282943FF0001
//! 0x08: uncompressed_length u64
//! 0x10: compressed_length u64
//! 0x18: zlib payload
//! ```
//!
//! # Payload layout
//! ```text
//! 0x00: primitive_type u32      (GL_TRIANGLES, GL_TRIANGLE_STRIP or 0)
//! 0x04: index_mode u32          (0 = none, 32 = indexed, 33 = indexed with restart)
//! 0x08: restart_value u32
//! 0x0C: index_element_type u32  (GL_UNSIGNED_SHORT or GL_UNSIGNED_INT)
//! 0x10: buffer_count u32        (auxiliary blobs)
//! 0x14: element_count u32
//! 0x18: vertex_blob DataRange
//! 0x28: index_blob DataRange    ({0, 0} when not indexed)
//! 0x38: auxiliary_blob DataRange × buffer_count
//! var:  vertex bytes, index bytes, auxiliary bytes in table order
//! ```

use super::range::{ByteReader, DataRange};
use super::{LUMEN_FORMAT, seal, unseal};
use crate::error::{AssetError, AssetResult};

/// Vertex counts at or above this use 32-bit indices.
pub const INDEX_WIDTH_THRESHOLD: usize = 0xFFFF;

const GL_TRIANGLES: u32 = 0x0004;
const GL_TRIANGLE_STRIP: u32 = 0x0005;
const GL_UNSIGNED_SHORT: u32 = 0x1403;
const GL_UNSIGNED_INT: u32 = 0x1405;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    None,
    Triangles,
    TriangleStrip,
}

impl PrimitiveType {
    pub fn to_raw(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Triangles => GL_TRIANGLES,
            Self::TriangleStrip => GL_TRIANGLE_STRIP,
        }
    }

    pub fn from_raw(raw: u32) -> AssetResult<Self> {
        match raw {
            0 => Ok(Self::None),
            GL_TRIANGLES => Ok(Self::Triangles),
            GL_TRIANGLE_STRIP => Ok(Self::TriangleStrip),
            other => Err(AssetError::invalid(format!(
                "unknown primitive type {other:#06x}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    NoIndex,
    OnlyIndex,
    IndexWithRestart,
}

impl IndexMode {
    pub fn to_raw(self) -> u32 {
        match self {
            Self::NoIndex => 0,
            Self::OnlyIndex => 32,
            Self::IndexWithRestart => 33,
        }
    }

    pub fn from_raw(raw: u32) -> AssetResult<Self> {
        match raw {
            0 => Ok(Self::NoIndex),
            32 => Ok(Self::OnlyIndex),
            33 => Ok(Self::IndexWithRestart),
            other => Err(AssetError::invalid(format!("unknown index mode {other}"))),
        }
    }

    pub fn is_indexed(self) -> bool {
        self != Self::NoIndex
    }
}

/// Width of one element in the index blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    /// Pick the narrowest width for a mesh with `vertex_count` vertices.
    ///
    /// 16-bit indices stop one short of 0xFFFF so the restart sentinel never
    /// collides with a real vertex.
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count >= INDEX_WIDTH_THRESHOLD {
            Self::U32
        } else {
            Self::U16
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Primitive restart value for this width.
    pub fn restart_sentinel(self) -> u32 {
        match self {
            Self::U16 => u32::from(u16::MAX),
            Self::U32 => u32::MAX,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::U16 => GL_UNSIGNED_SHORT,
            Self::U32 => GL_UNSIGNED_INT,
        }
    }

    pub fn from_raw(raw: u32) -> AssetResult<Self> {
        match raw {
            GL_UNSIGNED_SHORT => Ok(Self::U16),
            GL_UNSIGNED_INT => Ok(Self::U32),
            other => Err(AssetError::invalid(format!(
                "unknown index element type {other:#06x}"
            ))),
        }
    }

    /// Encode indices as little-endian elements of this width.
    pub fn encode(self, indices: &[u32]) -> AssetResult<Vec<u8>> {
        let bytes = indices.len() * self.byte_size();
        let mut out = Vec::new();
        out.try_reserve_exact(bytes)
            .map_err(|_| AssetError::Allocation { bytes })?;
        for &index in indices {
            match self {
                Self::U16 => {
                    let narrow = u16::try_from(index).map_err(|_| {
                        AssetError::invalid(format!("index {index} does not fit in 16 bits"))
                    })?;
                    out.extend_from_slice(&narrow.to_le_bytes());
                }
                Self::U32 => out.extend_from_slice(&index.to_le_bytes()),
            }
        }
        Ok(out)
    }

    /// Decode a little-endian index blob of this width.
    pub fn decode(self, bytes: &[u8]) -> Vec<u32> {
        match self {
            Self::U16 => bytes
                .chunks_exact(2)
                .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]])))
                .collect(),
            Self::U32 => bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        }
    }
}

/// Fixed-size part of the mesh payload header (24 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryHeader {
    pub primitive_type: PrimitiveType,
    pub index_mode: IndexMode,
    pub restart_value: u32,
    pub index_width: IndexWidth,
    pub buffer_count: u32,
    pub element_count: u32,
}

impl GeometryHeader {
    pub const SIZE: usize = 24;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.primitive_type.to_raw().to_le_bytes());
        bytes[4..8].copy_from_slice(&self.index_mode.to_raw().to_le_bytes());
        bytes[8..12].copy_from_slice(&self.restart_value.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.index_width.to_raw().to_le_bytes());
        bytes[16..20].copy_from_slice(&self.buffer_count.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.element_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> AssetResult<Self> {
        Self::read(&mut ByteReader::new(bytes))
    }

    fn read(reader: &mut ByteReader<'_>) -> AssetResult<Self> {
        Ok(Self {
            primitive_type: PrimitiveType::from_raw(reader.u32()?)?,
            index_mode: IndexMode::from_raw(reader.u32()?)?,
            restart_value: reader.u32()?,
            index_width: IndexWidth::from_raw(reader.u32()?)?,
            buffer_count: reader.u32()?,
            element_count: reader.u32()?,
        })
    }
}

/// Identifies one blob of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobId {
    Vertex,
    Index,
    Auxiliary(usize),
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex blob"),
            Self::Index => f.write_str("index blob"),
            Self::Auxiliary(i) => write!(f, "auxiliary blob {i}"),
        }
    }
}

/// Where mesh blob bytes come from at pack time.
///
/// The renderer implements this over its GPU buffers (mapping or reading
/// back each buffer); [`MeshBuffers`] implements it over CPU memory.
pub trait BlobSource {
    /// Number of auxiliary blobs, in binding-point order.
    fn auxiliary_count(&self) -> usize;

    /// Length of a blob in bytes, or `None` if the blob does not exist.
    fn blob_len(&self, id: BlobId) -> Option<u64>;

    /// Copy a blob into `out`, which is exactly `blob_len(id)` bytes long.
    fn read_blob(&self, id: BlobId, out: &mut [u8]) -> AssetResult<()>;
}

/// CPU-side mesh blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertices: Vec<u8>,
    pub indices: Option<Vec<u8>>,
    pub auxiliary: Vec<Vec<u8>>,
}

impl MeshBuffers {
    fn get(&self, id: BlobId) -> Option<&[u8]> {
        match id {
            BlobId::Vertex => Some(&self.vertices),
            BlobId::Index => self.indices.as_deref(),
            BlobId::Auxiliary(i) => self.auxiliary.get(i).map(Vec::as_slice),
        }
    }
}

impl BlobSource for MeshBuffers {
    fn auxiliary_count(&self) -> usize {
        self.auxiliary.len()
    }

    fn blob_len(&self, id: BlobId) -> Option<u64> {
        self.get(id).map(|b| b.len() as u64)
    }

    fn read_blob(&self, id: BlobId, out: &mut [u8]) -> AssetResult<()> {
        let blob = self
            .get(id)
            .ok_or_else(|| AssetError::invalid(format!("missing {id}")))?;
        if blob.len() != out.len() {
            return Err(AssetError::BlobSizeMismatch {
                blob: id.to_string(),
                expected: out.len() as u64,
                actual: blob.len() as u64,
            });
        }
        out.copy_from_slice(blob);
        Ok(())
    }
}

/// Header fields of a mesh that are not derived from blob sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryDesc {
    pub primitive_type: PrimitiveType,
    pub index_mode: IndexMode,
    pub index_width: IndexWidth,
    /// Number of indices if indexed, else number of vertices
    pub element_count: u32,
}

/// A decoded or laid-out mesh record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryRecord {
    pub primitive_type: PrimitiveType,
    pub index_mode: IndexMode,
    /// Equals `index_width.restart_sentinel()` when indexed, 0 otherwise
    pub restart_value: u32,
    pub index_width: IndexWidth,
    pub element_count: u32,
    pub vertex_blob: DataRange,
    pub index_blob: Option<DataRange>,
    /// Binding-point order
    pub auxiliary_blobs: Vec<DataRange>,
}

impl GeometryRecord {
    /// Lay out a record for the blobs `source` holds.
    ///
    /// Blobs follow the range table back to back: vertex, index (when
    /// indexed), then auxiliary blobs in order.
    pub fn layout<S: BlobSource + ?Sized>(desc: GeometryDesc, source: &S) -> AssetResult<Self> {
        let missing = |id: BlobId| AssetError::invalid(format!("missing {id}"));
        let aux_count = source.auxiliary_count();
        let mut cursor = payload_table_size(aux_count) as u64;
        let mut next = |length: u64| -> AssetResult<DataRange> {
            let range = DataRange::new(cursor, length);
            cursor = range.end()?;
            Ok(range)
        };

        let vertex_blob = next(
            source
                .blob_len(BlobId::Vertex)
                .ok_or_else(|| missing(BlobId::Vertex))?,
        )?;
        let index_blob = if desc.index_mode.is_indexed() {
            let len = source
                .blob_len(BlobId::Index)
                .ok_or_else(|| missing(BlobId::Index))?;
            Some(next(len)?)
        } else {
            None
        };
        let auxiliary_blobs = (0..aux_count)
            .map(|i| {
                let id = BlobId::Auxiliary(i);
                next(source.blob_len(id).ok_or_else(|| missing(id))?)
            })
            .collect::<AssetResult<Vec<_>>>()?;

        let restart_value = if desc.index_mode.is_indexed() {
            desc.index_width.restart_sentinel()
        } else {
            0
        };

        Ok(Self {
            primitive_type: desc.primitive_type,
            index_mode: desc.index_mode,
            restart_value,
            index_width: desc.index_width,
            element_count: desc.element_count,
            vertex_blob,
            index_blob,
            auxiliary_blobs,
        })
    }

    pub fn desc(&self) -> GeometryDesc {
        GeometryDesc {
            primitive_type: self.primitive_type,
            index_mode: self.index_mode,
            index_width: self.index_width,
            element_count: self.element_count,
        }
    }

    pub fn header(&self) -> AssetResult<GeometryHeader> {
        let buffer_count = u32::try_from(self.auxiliary_blobs.len())
            .map_err(|_| AssetError::invalid("too many auxiliary blobs"))?;
        Ok(GeometryHeader {
            primitive_type: self.primitive_type,
            index_mode: self.index_mode,
            restart_value: self.restart_value,
            index_width: self.index_width,
            buffer_count,
            element_count: self.element_count,
        })
    }

    /// Size of the whole decoded payload this record describes.
    pub fn payload_len(&self) -> AssetResult<u64> {
        let mut end = payload_table_size(self.auxiliary_blobs.len()) as u64;
        for range in self.ranges() {
            end = end.max(range.1.end()?);
        }
        Ok(end)
    }

    /// Every blob range with its id, in payload order.
    pub fn ranges(&self) -> impl Iterator<Item = (BlobId, DataRange)> + '_ {
        std::iter::once((BlobId::Vertex, self.vertex_blob))
            .chain(self.index_blob.map(|r| (BlobId::Index, r)))
            .chain(
                self.auxiliary_blobs
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (BlobId::Auxiliary(i), *r)),
            )
    }

    /// Check the cross-field invariants of the header.
    pub fn validate(&self) -> AssetResult<()> {
        match (self.index_mode.is_indexed(), self.index_blob) {
            (false, Some(_)) => return Err(AssetError::invalid("unindexed mesh has an index blob")),
            (true, None) => return Err(AssetError::invalid("indexed mesh has no index blob")),
            _ => {}
        }

        if self.index_mode.is_indexed() {
            let sentinel = self.index_width.restart_sentinel();
            if self.restart_value != sentinel {
                return Err(AssetError::invalid(format!(
                    "restart value {:#x} does not match the {}-bit sentinel {sentinel:#x}",
                    self.restart_value,
                    self.index_width.byte_size() * 8
                )));
            }
        }

        if let Some(index_blob) = self.index_blob {
            let expected = u64::from(self.element_count) * self.index_width.byte_size() as u64;
            if index_blob.length != expected {
                return Err(AssetError::BlobSizeMismatch {
                    blob: BlobId::Index.to_string(),
                    expected,
                    actual: index_blob.length,
                });
            }
        }

        if self.primitive_type != PrimitiveType::TriangleStrip
            && self.index_mode == IndexMode::IndexWithRestart
        {
            return Err(AssetError::invalid(
                "primitive restart requires a triangle strip",
            ));
        }

        Ok(())
    }
}

/// Bytes taken by the header and range table for `aux_count` auxiliary blobs.
pub fn payload_table_size(aux_count: usize) -> usize {
    GeometryHeader::SIZE + DataRange::SIZE * (2 + aux_count)
}

/// Encode a mesh payload (uncompressed, without magic).
///
/// `record` must come from [`GeometryRecord::layout`] (or an equivalent
/// back-to-back layout); blob bytes are pulled from `source` straight into
/// their offsets.
pub fn encode<S: BlobSource + ?Sized>(record: &GeometryRecord, source: &S) -> AssetResult<Vec<u8>> {
    record.validate()?;
    let header = record.header()?;

    let total = usize::try_from(record.payload_len()?)
        .map_err(|_| AssetError::invalid("mesh payload exceeds addressable memory"))?;
    let mut payload = Vec::new();
    payload
        .try_reserve_exact(total)
        .map_err(|_| AssetError::Allocation { bytes: total })?;

    payload.extend_from_slice(&header.to_bytes());
    payload.extend_from_slice(&record.vertex_blob.to_bytes());
    payload.extend_from_slice(&record.index_blob.unwrap_or_default().to_bytes());
    for range in &record.auxiliary_blobs {
        payload.extend_from_slice(&range.to_bytes());
    }
    payload.resize(total, 0);

    let mut cursor = payload_table_size(record.auxiliary_blobs.len()) as u64;
    for (id, range) in record.ranges() {
        if range.start != cursor {
            return Err(AssetError::invalid(format!(
                "{id} starts at {} instead of {cursor}",
                range.start
            )));
        }
        let actual = source.blob_len(id).unwrap_or(0);
        if actual != range.length {
            return Err(AssetError::BlobSizeMismatch {
                blob: id.to_string(),
                expected: range.length,
                actual,
            });
        }
        let end = range.end()?;
        source.read_blob(id, &mut payload[range.start as usize..end as usize])?;
        cursor = end;
    }

    tracing::debug!(
        bytes = payload.len(),
        elements = record.element_count,
        auxiliary = record.auxiliary_blobs.len(),
        "encoded mesh payload"
    );
    Ok(payload)
}

/// A mesh record with borrowed views into its decoded payload.
#[derive(Debug, Clone)]
pub struct DecodedGeometry<'a> {
    pub record: GeometryRecord,
    payload: &'a [u8],
}

impl<'a> DecodedGeometry<'a> {
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn vertex_bytes(&self) -> &'a [u8] {
        self.bytes(self.record.vertex_blob)
    }

    pub fn index_bytes(&self) -> Option<&'a [u8]> {
        self.record.index_blob.map(|r| self.bytes(r))
    }

    /// Indices widened to `u32`.
    pub fn indices(&self) -> Option<Vec<u32>> {
        self.index_bytes()
            .map(|bytes| self.record.index_width.decode(bytes))
    }

    pub fn auxiliary_bytes(&self, index: usize) -> Option<&'a [u8]> {
        self.record
            .auxiliary_blobs
            .get(index)
            .map(|r| self.bytes(*r))
    }

    // Ranges were bounds-checked by decode().
    fn bytes(&self, range: DataRange) -> &'a [u8] {
        &self.payload[range.start as usize..(range.start + range.length) as usize]
    }
}

/// Decode a mesh payload (uncompressed, without magic).
pub fn decode(payload: &[u8]) -> AssetResult<DecodedGeometry<'_>> {
    let mut reader = ByteReader::new(payload);
    let header = GeometryHeader::read(&mut reader)?;
    let vertex_blob = reader.range()?;
    let index_blob = reader.range()?;

    let aux_count = header.buffer_count as usize;
    reader.require_table(aux_count, DataRange::SIZE)?;
    let auxiliary_blobs = (0..aux_count)
        .map(|_| reader.range())
        .collect::<AssetResult<Vec<_>>>()?;

    let record = GeometryRecord {
        primitive_type: header.primitive_type,
        index_mode: header.index_mode,
        restart_value: header.restart_value,
        index_width: header.index_width,
        element_count: header.element_count,
        vertex_blob,
        index_blob: header.index_mode.is_indexed().then_some(index_blob),
        auxiliary_blobs,
    };

    for (_, range) in record.ranges() {
        range.slice(payload)?;
    }
    record.validate()?;

    Ok(DecodedGeometry { record, payload })
}

/// A mesh that owns its decoded payload.
#[derive(Debug, Clone)]
pub struct GeometryAsset {
    pub record: GeometryRecord,
    payload: Vec<u8>,
}

impl GeometryAsset {
    pub fn from_payload(payload: Vec<u8>) -> AssetResult<Self> {
        let record = decode(&payload)?.record;
        Ok(Self { record, payload })
    }

    pub fn view(&self) -> DecodedGeometry<'_> {
        DecodedGeometry {
            record: self.record.clone(),
            payload: &self.payload,
        }
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Encode, compress and stamp a complete mesh file.
pub fn pack_mesh<S: BlobSource + ?Sized>(record: &GeometryRecord, source: &S) -> AssetResult<Vec<u8>> {
    let payload = encode(record, source)?;
    seal(LUMEN_FORMAT.mesh_magic, &payload)
}

/// Check the magic, decompress and decode a complete mesh file.
pub fn load_mesh(bytes: &[u8]) -> AssetResult<GeometryAsset> {
    let payload = unseal(LUMEN_FORMAT.mesh_magic, bytes)?;
    GeometryAsset::from_payload(payload)
}
