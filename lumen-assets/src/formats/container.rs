//! Lumen multi-mesh container (.lmeshes)
//!
//! # Layout
//! ```text
//! 0x00: magic u64 = 0xF242191756FF0003
//! 0x08: record_count u32
//! 0x0C: record_0 (a complete .lmesh file: magic + lengths + zlib payload)
//! var:  record_1 ...
//! ```
//!
//! Records are compressed independently. Finding record `n` only reads the
//! length fields of the records before it, and loading it inflates nothing
//! else.

use super::mesh::{GeometryAsset, load_mesh};
use super::{LUMEN_FORMAT, MAGIC_SIZE, check_magic};
use crate::codec::CompressedBlob;
use crate::error::{AssetError, AssetResult};

/// Magic plus record count.
pub const CONTAINER_HEADER_SIZE: usize = MAGIC_SIZE + 4;

/// Concatenate complete mesh files into a container.
pub fn encode_many<B: AsRef<[u8]>>(mesh_files: &[B]) -> AssetResult<Vec<u8>> {
    let count = u32::try_from(mesh_files.len())
        .map_err(|_| AssetError::invalid("too many container records"))?;

    let mut total = CONTAINER_HEADER_SIZE;
    for file in mesh_files {
        let file = file.as_ref();
        // Each record must stand on its own: right magic, intact lengths,
        // and nothing after its payload.
        if record_len(file)? != file.len() {
            return Err(AssetError::invalid("mesh file has trailing bytes"));
        }
        total += file.len();
    }

    let mut out = Vec::new();
    out.try_reserve_exact(total)
        .map_err(|_| AssetError::Allocation { bytes: total })?;
    out.extend_from_slice(&LUMEN_FORMAT.container_magic.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    for file in mesh_files {
        out.extend_from_slice(file.as_ref());
    }

    tracing::debug!(records = count, bytes = out.len(), "encoded mesh container");
    Ok(out)
}

/// Length of the mesh file at the start of `bytes`.
fn record_len(bytes: &[u8]) -> AssetResult<usize> {
    check_magic(bytes, LUMEN_FORMAT.mesh_magic)?;
    let blob = CompressedBlob::parse(bytes, MAGIC_SIZE)?;
    Ok(MAGIC_SIZE + blob.encoded_len())
}

/// Borrowed view of a container.
#[derive(Debug, Clone, Copy)]
pub struct MeshContainer<'a> {
    count: u32,
    body: &'a [u8],
}

impl<'a> MeshContainer<'a> {
    pub fn parse(bytes: &'a [u8]) -> AssetResult<Self> {
        check_magic(bytes, LUMEN_FORMAT.container_magic)?;
        let count_bytes =
            bytes
                .get(MAGIC_SIZE..CONTAINER_HEADER_SIZE)
                .ok_or(AssetError::TruncatedData {
                    start: MAGIC_SIZE as u64,
                    length: 4,
                    available: bytes.len() as u64,
                })?;
        let count = u32::from_le_bytes([
            count_bytes[0],
            count_bytes[1],
            count_bytes[2],
            count_bytes[3],
        ]);
        Ok(Self {
            count,
            body: &bytes[CONTAINER_HEADER_SIZE..],
        })
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Lazily walk the records as complete mesh files.
    pub fn records(&self) -> ContainerRecords<'a> {
        ContainerRecords {
            rest: self.body,
            remaining: self.count,
        }
    }

    /// Locate record `index` without inflating any record.
    pub fn record(&self, index: usize) -> AssetResult<&'a [u8]> {
        if index >= self.len() {
            return Err(AssetError::invalid(format!(
                "record {index} out of range (container holds {})",
                self.count
            )));
        }
        self.records()
            .nth(index)
            .unwrap_or_else(|| Err(AssetError::invalid("container ended early")))
    }

    /// Decompress and decode record `index` only.
    pub fn load(&self, index: usize) -> AssetResult<GeometryAsset> {
        load_mesh(self.record(index)?)
    }

    /// Decode every record, rejecting trailing bytes after the last one.
    pub fn load_all(&self) -> AssetResult<Vec<GeometryAsset>> {
        let mut records = self.records();
        let mut assets = Vec::with_capacity(self.len().min(1024));
        for record in records.by_ref() {
            assets.push(load_mesh(record?)?);
        }
        if !records.rest.is_empty() {
            return Err(AssetError::invalid(format!(
                "{} trailing bytes after the last record",
                records.rest.len()
            )));
        }
        Ok(assets)
    }
}

/// Iterator over the raw records of a [`MeshContainer`].
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct ContainerRecords<'a> {
    rest: &'a [u8],
    remaining: u32,
}

impl<'a> Iterator for ContainerRecords<'a> {
    type Item = AssetResult<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match record_len(self.rest) {
            Ok(len) => {
                let (record, rest) = self.rest.split_at(len);
                self.rest = rest;
                Some(Ok(record))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::mesh::{
        GeometryDesc, GeometryRecord, IndexMode, IndexWidth, MeshBuffers, PrimitiveType,
        pack_mesh,
    };

    fn mesh_file(fill: u8, vertex_len: usize) -> Vec<u8> {
        let buffers = MeshBuffers {
            vertices: vec![fill; vertex_len],
            indices: None,
            auxiliary: vec![],
        };
        let desc = GeometryDesc {
            primitive_type: PrimitiveType::Triangles,
            index_mode: IndexMode::NoIndex,
            index_width: IndexWidth::U16,
            element_count: (vertex_len / 12) as u32,
        };
        let record = GeometryRecord::layout(desc, &buffers).unwrap();
        pack_mesh(&record, &buffers).unwrap()
    }

    #[test]
    fn test_container_layout() {
        let files = [mesh_file(1, 36), mesh_file(2, 72)];
        let container = encode_many(&files).unwrap();

        assert_eq!(&container[0..8], &LUMEN_FORMAT.container_magic.to_le_bytes());
        assert_eq!(&container[8..12], &2u32.to_le_bytes());
        assert_eq!(&container[12..12 + files[0].len()], files[0].as_slice());
        assert_eq!(
            container.len(),
            CONTAINER_HEADER_SIZE + files[0].len() + files[1].len()
        );
    }

    #[test]
    fn test_records_are_independent() {
        let files = [mesh_file(1, 36), mesh_file(2, 72), mesh_file(3, 12)];
        let bytes = encode_many(&files).unwrap();
        let container = MeshContainer::parse(&bytes).unwrap();

        assert_eq!(container.len(), 3);
        assert_eq!(container.record(1).unwrap(), files[1].as_slice());

        let second = container.load(1).unwrap();
        assert_eq!(second.view().vertex_bytes(), &[2u8; 72][..]);

        let all = container.load_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].record.element_count, 1);
    }

    #[test]
    fn test_corrupt_later_record_does_not_block_earlier() {
        let files = [mesh_file(1, 36), mesh_file(2, 72)];
        let mut bytes = encode_many(&files).unwrap();
        let second = CONTAINER_HEADER_SIZE + files[0].len();
        // Break the magic of the second record
        bytes[second] ^= 0xFF;

        let container = MeshContainer::parse(&bytes).unwrap();
        assert!(container.load(0).is_ok());
        assert!(matches!(container.load(1), Err(AssetError::Format { .. })));
        assert!(container.load_all().is_err());
    }

    #[test]
    fn test_empty_container() {
        let bytes = encode_many::<Vec<u8>>(&[]).unwrap();
        let container = MeshContainer::parse(&bytes).unwrap();
        assert!(container.is_empty());
        assert!(container.load_all().unwrap().is_empty());
        assert!(container.record(0).is_err());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(encode_many(&[vec![0u8; 4]]).is_err());

        let mut file = mesh_file(1, 12);
        file.push(0);
        assert!(encode_many(&[file]).is_err());

        let single = mesh_file(1, 12);
        assert!(matches!(
            MeshContainer::parse(&single),
            Err(AssetError::Format { .. })
        ));

        let mut bytes = encode_many(&[mesh_file(1, 12)]).unwrap();
        bytes.extend_from_slice(&[0; 3]);
        let container = MeshContainer::parse(&bytes).unwrap();
        assert!(container.load_all().is_err());
    }
}
