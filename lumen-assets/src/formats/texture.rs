//! Lumen texture binary format (.ltex)
//!
//! # File layout
//! ```text
//! 0x00: magic u64 = 0xF24241339FFF0002
//! 0x08: uncompressed_length u64
//! 0x10: compressed_length u64
//! 0x18: zlib payload
//! ```
//!
//! # Payload layout (packed, no padding)
//! ```text
//! 0x00: target u32
//! 0x04: internal_format u32
//! 0x08: external_format u32
//! 0x0C: component_type u32
//! 0x10: swizzle [u32; 4]
//! 0x20: swizzle_enabled u8
//! 0x21: mip_levels i32
//! 0x25: slices i32              (0 for targets that are not array-like)
//! 0x29: total_byte_size u64
//! 0x31: MipRange × mip_levels   {i32 width, i32 height, i32 depth,
//!                                u64 start, u64 per_slice_length}
//! var:  level 0 bytes (all slices), level 1 bytes, ...
//! ```
//!
//! `per_slice_length` always describes one slice; a level occupies
//! `per_slice_length * max(slices, 1)` bytes.

use super::range::{ByteReader, DataRange};
use super::{LUMEN_FORMAT, seal, unseal};
use crate::error::{AssetError, AssetResult};
use crate::pixel::{
    ComponentType, ExternalFormat, IDENTITY_SWIZZLE, InternalFormat, Swizzle, TextureTarget,
    external_format_byte_size,
};

/// Dimensions of one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height.max(1)) * u64::from(self.depth.max(1))
    }
}

/// Full mip chain for `base`, halving every non-layer dimension down to 1.
///
/// Layer dimensions (the height of 1D arrays, the depth of 2D and cube
/// arrays) stay constant. Multisample targets get a single level.
pub fn mip_chain(target: TextureTarget, base: Extent) -> Vec<Extent> {
    let keeps_height = target == TextureTarget::Texture1DArray;
    let keeps_depth = matches!(
        target,
        TextureTarget::Texture2DArray
            | TextureTarget::CubeMapArray
            | TextureTarget::Texture2DMultisampleArray
    );

    let mut current = Extent::new(base.width, base.height.max(1), base.depth.max(1));
    let mut levels = vec![current];
    if target.is_multisample() || current.width == 0 {
        return levels;
    }

    let halve = |v: u32| (v / 2).max(1);
    loop {
        let next = Extent {
            width: halve(current.width),
            height: if keeps_height {
                current.height
            } else {
                halve(current.height)
            },
            depth: if keeps_depth {
                current.depth
            } else {
                halve(current.depth)
            },
        };
        if next == current {
            return levels;
        }
        levels.push(next);
        current = next;
    }
}

/// One mip level of a texture record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Start of the level and the length of one slice
    pub blob: DataRange,
}

impl MipLevel {
    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height, self.depth)
    }
}

/// Texture fields that are not derived from the mip chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub target: TextureTarget,
    pub internal_format: InternalFormat,
    pub external_format: ExternalFormat,
    pub component_type: ComponentType,
    pub swizzle: Option<[Swizzle; 4]>,
}

/// A decoded or laid-out texture record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRecord {
    pub target: TextureTarget,
    pub internal_format: InternalFormat,
    pub external_format: ExternalFormat,
    pub component_type: ComponentType,
    /// `None` when the swizzle is the identity
    pub swizzle: Option<[Swizzle; 4]>,
    pub mip_levels: Vec<MipLevel>,
    pub slice_count: u32,
}

impl PixelRecord {
    /// Lay out a record for a mip chain, level 0 first.
    pub fn layout(desc: TextureDesc, extents: &[Extent]) -> AssetResult<Self> {
        let first = extents
            .first()
            .ok_or_else(|| AssetError::invalid("texture has no mip levels"))?;
        if let Some(level) = extents.iter().position(|e| e.width == 0) {
            return Err(AssetError::ZeroDimension { level });
        }
        let slice_count = desc.target.slice_count(first.height, first.depth);
        let slices = u64::from(slice_count.max(1));

        let mut cursor = pixel_table_size(extents.len()) as u64;
        let mut mip_levels = Vec::with_capacity(extents.len());
        for extent in extents {
            let level_len = raw_level_len(&desc, *extent)?;
            let blob = DataRange::new(cursor, level_len / slices);
            cursor = cursor
                .checked_add(level_len)
                .ok_or_else(|| AssetError::invalid("texture size overflows"))?;
            mip_levels.push(MipLevel {
                width: extent.width,
                height: extent.height,
                depth: extent.depth,
                blob,
            });
        }

        let record = Self {
            target: desc.target,
            internal_format: desc.internal_format,
            external_format: desc.external_format,
            component_type: desc.component_type,
            swizzle: desc.swizzle.filter(|s| *s != IDENTITY_SWIZZLE),
            mip_levels,
            slice_count,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn desc(&self) -> TextureDesc {
        TextureDesc {
            target: self.target,
            internal_format: self.internal_format,
            external_format: self.external_format,
            component_type: self.component_type,
            swizzle: self.swizzle,
        }
    }

    pub fn swizzle_enabled(&self) -> bool {
        self.swizzle.is_some()
    }

    /// Bytes per pixel of the external data.
    pub fn pixel_size(&self) -> u32 {
        external_format_byte_size(self.external_format, self.component_type)
    }

    /// Bytes stored for level `level` across all slices.
    pub fn level_len(&self, level: usize) -> Option<u64> {
        let mip = self.mip_levels.get(level)?;
        mip.blob.length.checked_mul(u64::from(self.slice_count.max(1)))
    }

    /// Range of a whole level (all slices).
    pub fn level_range(&self, level: usize) -> Option<DataRange> {
        let mip = self.mip_levels.get(level)?;
        Some(DataRange::new(mip.blob.start, self.level_len(level)?))
    }

    pub fn total_byte_size(&self) -> AssetResult<u64> {
        (0..self.mip_levels.len()).try_fold(0u64, |total, level| {
            self.level_len(level)
                .and_then(|len| total.checked_add(len))
                .ok_or_else(|| AssetError::invalid("texture size overflows"))
        })
    }

    pub fn payload_len(&self) -> AssetResult<u64> {
        let mut end = pixel_table_size(self.mip_levels.len()) as u64;
        for level in 0..self.mip_levels.len() {
            let range = self
                .level_range(level)
                .ok_or_else(|| AssetError::invalid("texture size overflows"))?;
            end = end.max(range.end()?);
        }
        Ok(end)
    }

    /// Check the mip chain against the target and pixel format.
    pub fn validate(&self) -> AssetResult<()> {
        let first = self
            .mip_levels
            .first()
            .ok_or_else(|| AssetError::invalid("texture has no mip levels"))?;
        if self.target.is_multisample() && self.mip_levels.len() != 1 {
            return Err(AssetError::invalid(format!(
                "multisample texture has {} mip levels",
                self.mip_levels.len()
            )));
        }
        let expected_slices = self.target.slice_count(first.height, first.depth);
        if self.slice_count != expected_slices {
            return Err(AssetError::invalid(format!(
                "slice count {} does not match {expected_slices} for {:?}",
                self.slice_count, self.target
            )));
        }

        let desc = self.desc();
        let slices = u64::from(self.slice_count.max(1));
        let mut previous: Option<&MipLevel> = None;
        for (level, mip) in self.mip_levels.iter().enumerate() {
            if mip.width == 0 {
                return Err(AssetError::ZeroDimension { level });
            }
            if let Some(prev) = previous {
                if mip.width > prev.width || mip.height > prev.height || mip.depth > prev.depth {
                    return Err(AssetError::invalid(format!(
                        "mip level {level} is larger than level {}",
                        level - 1
                    )));
                }
            }
            if self.target.slice_count(mip.height, mip.depth) != self.slice_count {
                return Err(AssetError::invalid(format!(
                    "mip level {level} changes the layer count"
                )));
            }

            let level_len = raw_level_len(&desc, mip.extent())?;
            if level_len % slices != 0 || mip.blob.length != level_len / slices {
                return Err(AssetError::BlobSizeMismatch {
                    blob: format!("mip level {level}"),
                    expected: level_len / slices,
                    actual: mip.blob.length,
                });
            }
            previous = Some(mip);
        }
        Ok(())
    }

    pub fn header(&self) -> AssetResult<PixelHeader> {
        let mip_levels = i32::try_from(self.mip_levels.len())
            .map_err(|_| AssetError::invalid("too many mip levels"))?;
        let slices = i32::try_from(self.slice_count)
            .map_err(|_| AssetError::invalid("too many slices"))?;
        Ok(PixelHeader {
            target: self.target,
            internal_format: self.internal_format,
            external_format: self.external_format,
            component_type: self.component_type,
            swizzle: self.swizzle.unwrap_or(IDENTITY_SWIZZLE),
            swizzle_enabled: self.swizzle.is_some(),
            mip_levels,
            slices,
            total_byte_size: self.total_byte_size()?,
        })
    }
}

/// Bytes of raw pixel data for one level across all its slices.
fn raw_level_len(desc: &TextureDesc, extent: Extent) -> AssetResult<u64> {
    let pixel_size = u64::from(external_format_byte_size(
        desc.external_format,
        desc.component_type,
    ));
    extent
        .pixel_count()
        .checked_mul(pixel_size)
        .and_then(|len| len.checked_mul(desc.target.face_factor()))
        .ok_or_else(|| AssetError::invalid("mip level size overflows"))
}

/// Bytes taken by the header and mip table for `levels` mip levels.
pub fn pixel_table_size(levels: usize) -> usize {
    PixelHeader::SIZE + MipRange::SIZE * levels
}

/// Fixed-size part of the texture payload header (49 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelHeader {
    pub target: TextureTarget,
    pub internal_format: InternalFormat,
    pub external_format: ExternalFormat,
    pub component_type: ComponentType,
    pub swizzle: [Swizzle; 4],
    pub swizzle_enabled: bool,
    pub mip_levels: i32,
    pub slices: i32,
    pub total_byte_size: u64,
}

impl PixelHeader {
    pub const SIZE: usize = 49;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.target.to_raw().to_le_bytes());
        bytes[4..8].copy_from_slice(&self.internal_format.to_raw().to_le_bytes());
        bytes[8..12].copy_from_slice(&self.external_format.to_raw().to_le_bytes());
        bytes[12..16].copy_from_slice(&self.component_type.to_raw().to_le_bytes());
        for (i, channel) in self.swizzle.iter().enumerate() {
            let at = 16 + i * 4;
            bytes[at..at + 4].copy_from_slice(&channel.to_raw().to_le_bytes());
        }
        bytes[32] = u8::from(self.swizzle_enabled);
        bytes[33..37].copy_from_slice(&self.mip_levels.to_le_bytes());
        bytes[37..41].copy_from_slice(&self.slices.to_le_bytes());
        bytes[41..49].copy_from_slice(&self.total_byte_size.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> AssetResult<Self> {
        Self::read(&mut ByteReader::new(bytes))
    }

    fn read(reader: &mut ByteReader<'_>) -> AssetResult<Self> {
        let target = TextureTarget::from_raw(reader.u32()?)?;
        let internal_format = InternalFormat::from_raw(reader.u32()?)?;
        let external_format = ExternalFormat::from_raw(reader.u32()?)?;
        let component_type = ComponentType::from_raw(reader.u32()?)?;
        let mut swizzle = IDENTITY_SWIZZLE;
        for (i, channel) in swizzle.iter_mut().enumerate() {
            let raw = reader.u32()?;
            *channel = Swizzle::from_raw(raw).map_err(|_| {
                AssetError::invalid(format!(
                    "swizzle channel {} has unknown source {raw:#06x}",
                    ["red", "green", "blue", "alpha"][i]
                ))
            })?;
        }
        let swizzle_enabled = match reader.u8()? {
            0 => false,
            1 => true,
            other => {
                return Err(AssetError::invalid(format!(
                    "swizzle flag must be 0 or 1, found {other}"
                )));
            }
        };
        if swizzle_enabled != (swizzle != IDENTITY_SWIZZLE) {
            return Err(AssetError::invalid(format!(
                "swizzle flag {} disagrees with swizzle {swizzle:?}",
                u8::from(swizzle_enabled)
            )));
        }
        Ok(Self {
            target,
            internal_format,
            external_format,
            component_type,
            swizzle,
            swizzle_enabled,
            mip_levels: reader.i32()?,
            slices: reader.i32()?,
            total_byte_size: reader.u64()?,
        })
    }
}

/// One entry of the mip table (28 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipRange {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub start: u64,
    pub per_slice_length: u64,
}

impl MipRange {
    pub const SIZE: usize = 28;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.width.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.height.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.depth.to_le_bytes());
        bytes[12..20].copy_from_slice(&self.start.to_le_bytes());
        bytes[20..28].copy_from_slice(&self.per_slice_length.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Self::read(&mut ByteReader::new(bytes)).ok()
    }

    fn read(reader: &mut ByteReader<'_>) -> AssetResult<Self> {
        Ok(Self {
            width: reader.i32()?,
            height: reader.i32()?,
            depth: reader.i32()?,
            start: reader.u64()?,
            per_slice_length: reader.u64()?,
        })
    }

    fn from_level(mip: &MipLevel) -> AssetResult<Self> {
        let dim = |v: u32| {
            i32::try_from(v).map_err(|_| AssetError::invalid(format!("dimension {v} too large")))
        };
        Ok(Self {
            width: dim(mip.width)?,
            height: dim(mip.height)?,
            depth: dim(mip.depth)?,
            start: mip.blob.start,
            per_slice_length: mip.blob.length,
        })
    }

    fn to_level(self, level: usize) -> AssetResult<MipLevel> {
        let dim = |v: i32| {
            u32::try_from(v).map_err(|_| {
                AssetError::invalid(format!("mip level {level} has negative dimension {v}"))
            })
        };
        Ok(MipLevel {
            width: dim(self.width)?,
            height: dim(self.height)?,
            depth: dim(self.depth)?,
            blob: DataRange::new(self.start, self.per_slice_length),
        })
    }
}

/// Where mip level bytes come from at pack time.
///
/// The renderer implements this by reading each level back from the GPU
/// texture; a list of CPU buffers (one per level, all slices concatenated)
/// implements it directly.
pub trait MipSource {
    /// Bytes of level `level` across all slices, or `None` if absent.
    fn level_len(&self, level: usize) -> Option<u64>;

    /// Copy level `level` into `out`, which is exactly `level_len` bytes.
    fn read_level(&self, level: usize, out: &mut [u8]) -> AssetResult<()>;
}

impl MipSource for [Vec<u8>] {
    fn level_len(&self, level: usize) -> Option<u64> {
        self.get(level).map(|l| l.len() as u64)
    }

    fn read_level(&self, level: usize, out: &mut [u8]) -> AssetResult<()> {
        let data = self
            .get(level)
            .ok_or_else(|| AssetError::invalid(format!("missing mip level {level}")))?;
        if data.len() != out.len() {
            return Err(AssetError::BlobSizeMismatch {
                blob: format!("mip level {level}"),
                expected: out.len() as u64,
                actual: data.len() as u64,
            });
        }
        out.copy_from_slice(data);
        Ok(())
    }
}

impl MipSource for Vec<Vec<u8>> {
    fn level_len(&self, level: usize) -> Option<u64> {
        self.as_slice().level_len(level)
    }

    fn read_level(&self, level: usize, out: &mut [u8]) -> AssetResult<()> {
        self.as_slice().read_level(level, out)
    }
}

/// Encode a texture payload (uncompressed, without magic).
pub fn encode<S: MipSource + ?Sized>(record: &PixelRecord, source: &S) -> AssetResult<Vec<u8>> {
    record.validate()?;
    let header = record.header()?;

    let total = usize::try_from(record.payload_len()?)
        .map_err(|_| AssetError::invalid("texture payload exceeds addressable memory"))?;
    let mut payload = Vec::new();
    payload
        .try_reserve_exact(total)
        .map_err(|_| AssetError::Allocation { bytes: total })?;

    payload.extend_from_slice(&header.to_bytes());
    for mip in &record.mip_levels {
        payload.extend_from_slice(&MipRange::from_level(mip)?.to_bytes());
    }
    payload.resize(total, 0);

    let mut cursor = pixel_table_size(record.mip_levels.len()) as u64;
    for level in 0..record.mip_levels.len() {
        let range = record
            .level_range(level)
            .ok_or_else(|| AssetError::invalid("texture size overflows"))?;
        if range.start != cursor {
            return Err(AssetError::invalid(format!(
                "mip level {level} starts at {} instead of {cursor}",
                range.start
            )));
        }
        let actual = source.level_len(level).unwrap_or(0);
        if actual != range.length {
            return Err(AssetError::BlobSizeMismatch {
                blob: format!("mip level {level}"),
                expected: range.length,
                actual,
            });
        }
        let end = range.end()?;
        source.read_level(level, &mut payload[range.start as usize..end as usize])?;
        cursor = end;
    }

    tracing::debug!(
        bytes = payload.len(),
        levels = record.mip_levels.len(),
        slices = record.slice_count,
        "encoded texture payload"
    );
    Ok(payload)
}

/// A texture record with borrowed views into its decoded payload.
#[derive(Debug, Clone)]
pub struct DecodedTexture<'a> {
    pub record: PixelRecord,
    payload: &'a [u8],
}

impl<'a> DecodedTexture<'a> {
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// All slices of level `level`.
    pub fn level_bytes(&self, level: usize) -> Option<&'a [u8]> {
        let range = self.record.level_range(level)?;
        Some(&self.payload[range.start as usize..(range.start + range.length) as usize])
    }

    /// One slice of level `level`.
    pub fn slice_bytes(&self, level: usize, slice: usize) -> Option<&'a [u8]> {
        let per_slice = self.record.mip_levels.get(level)?.blob.length as usize;
        if slice >= self.record.slice_count.max(1) as usize {
            return None;
        }
        let level = self.level_bytes(level)?;
        level.get(slice * per_slice..(slice + 1) * per_slice)
    }
}

/// Decode a texture payload (uncompressed, without magic).
pub fn decode(payload: &[u8]) -> AssetResult<DecodedTexture<'_>> {
    let mut reader = ByteReader::new(payload);
    let header = PixelHeader::read(&mut reader)?;

    let levels = usize::try_from(header.mip_levels)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            AssetError::invalid(format!("invalid mip level count {}", header.mip_levels))
        })?;
    let slice_count = u32::try_from(header.slices)
        .map_err(|_| AssetError::invalid(format!("invalid slice count {}", header.slices)))?;

    reader.require_table(levels, MipRange::SIZE)?;
    let mip_levels = (0..levels)
        .map(|level| MipRange::read(&mut reader)?.to_level(level))
        .collect::<AssetResult<Vec<_>>>()?;

    let record = PixelRecord {
        target: header.target,
        internal_format: header.internal_format,
        external_format: header.external_format,
        component_type: header.component_type,
        swizzle: Some(header.swizzle).filter(|s| *s != IDENTITY_SWIZZLE),
        mip_levels,
        slice_count,
    };

    for level in 0..levels {
        let range = record
            .level_range(level)
            .ok_or_else(|| AssetError::invalid("texture size overflows"))?;
        range.slice(payload)?;
    }
    record.validate()?;

    let total = record.total_byte_size()?;
    if total != header.total_byte_size {
        return Err(AssetError::invalid(format!(
            "header declares {} pixel bytes but levels hold {total}",
            header.total_byte_size
        )));
    }

    Ok(DecodedTexture { record, payload })
}

/// A texture that owns its decoded payload.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub record: PixelRecord,
    payload: Vec<u8>,
}

impl TextureAsset {
    pub fn from_payload(payload: Vec<u8>) -> AssetResult<Self> {
        let record = decode(&payload)?.record;
        Ok(Self { record, payload })
    }

    pub fn view(&self) -> DecodedTexture<'_> {
        DecodedTexture {
            record: self.record.clone(),
            payload: &self.payload,
        }
    }
}

/// Encode, compress and stamp a complete texture file.
pub fn pack_texture<S: MipSource + ?Sized>(record: &PixelRecord, source: &S) -> AssetResult<Vec<u8>> {
    let payload = encode(record, source)?;
    seal(LUMEN_FORMAT.texture_magic, &payload)
}

/// Check the magic, decompress and decode a complete texture file.
pub fn load_texture(bytes: &[u8]) -> AssetResult<TextureAsset> {
    let payload = unseal(LUMEN_FORMAT.texture_magic, bytes)?;
    TextureAsset::from_payload(payload)
}
