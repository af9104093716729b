use lumen_assets::formats::{mesh, texture};
use lumen_assets::{
    AssetError, CodecErrorKind, ComponentType, Extent, ExternalFormat, InternalFormat,
    PixelRecord, TextureDesc, TextureTarget, Topology, TriangleMesh, codec, ingest,
};
use proptest::prelude::*;

fn mesh_strategy() -> impl Strategy<Value = TriangleMesh> {
    (1usize..64).prop_flat_map(|vertex_count| {
        let position = prop::array::uniform3(-100.0f32..100.0);
        let index = 0..vertex_count as u32;
        (
            prop::collection::vec(position, vertex_count),
            prop::collection::vec(prop::array::uniform3(index), 0..32),
            prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..3),
            any::<bool>(),
        )
            .prop_map(|(positions, faces, auxiliary, indexed)| {
                let mut mesh = TriangleMesh::new(positions);
                if indexed {
                    mesh.topology = Topology::Faces(faces);
                }
                mesh.auxiliary = auxiliary;
                mesh
            })
    })
}

proptest! {
    #[test]
    fn mesh_roundtrip(input in mesh_strategy()) {
        let ingested = ingest(&input).unwrap();
        let file = ingested.pack().unwrap();
        let asset = mesh::load_mesh(&file).unwrap();
        let view = asset.view();

        prop_assert_eq!(&asset.record, &ingested.record);
        prop_assert_eq!(view.vertex_bytes(), ingested.buffers.vertices.as_slice());
        prop_assert_eq!(view.index_bytes(), ingested.buffers.indices.as_deref());
        for (i, aux) in ingested.buffers.auxiliary.iter().enumerate() {
            prop_assert_eq!(view.auxiliary_bytes(i), Some(aux.as_slice()));
        }
    }

    #[test]
    fn codec_roundtrip(data in prop::collection::vec(any::<u8>(), 0..4096), prefix in 0usize..16) {
        let packed = codec::compress(&data, prefix).unwrap();
        prop_assert_eq!(codec::decompress(&packed, prefix).unwrap(), data);
    }

    #[test]
    fn flipped_byte_never_passes_silently(
        data in prop::collection::vec(any::<u8>(), 1..2048),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let mut packed = codec::compress(&data, 0).unwrap();
        let body = codec::LENGTH_HEADER_SIZE;
        let at = body + position.index(packed.len() - body);
        packed[at] ^= mask;

        match codec::decompress(&packed, 0) {
            Ok(out) => {
                prop_assert_eq!(out, data);
            }
            Err(AssetError::Decompression { kind }) => {
                prop_assert_ne!(kind, CodecErrorKind::MemoryExhausted);
            }
            Err(other) => {
                prop_assert!(false, "unexpected error {}", other);
            }
        }
    }

    #[test]
    fn stretched_range_is_truncation(input in mesh_strategy(), extra in 1u64..1024) {
        let ingested = ingest(&input).unwrap();
        let mut payload = mesh::encode(&ingested.record, &ingested.buffers).unwrap();

        // Vertex range length sits right after the 24-byte header and its start
        let at = mesh::GeometryHeader::SIZE + 8;
        let available = payload.len() as u64 - ingested.record.vertex_blob.start;
        payload[at..at + 8].copy_from_slice(&(available + extra).to_le_bytes());

        let truncated = matches!(
            mesh::decode(&payload),
            Err(AssetError::TruncatedData { .. })
        );
        prop_assert!(truncated);
    }

    #[test]
    fn array_levels_store_one_slice(width in 1u32..16, height in 1u32..16, layers in 1u32..8) {
        let desc = TextureDesc {
            target: TextureTarget::Texture2DArray,
            internal_format: InternalFormat::Rgba8,
            external_format: ExternalFormat::Rgba,
            component_type: ComponentType::UnsignedByte,
            swizzle: None,
        };
        let record = PixelRecord::layout(desc, &[Extent::new(width, height, layers)]).unwrap();
        let level_len = u64::from(width * height * layers * 4);

        prop_assert_eq!(record.slice_count, layers);
        prop_assert_eq!(record.mip_levels[0].blob.length, level_len / u64::from(layers));

        let levels = vec![vec![7u8; level_len as usize]];
        let payload = texture::encode(&record, &levels).unwrap();
        let decoded = texture::decode(&payload).unwrap();
        prop_assert_eq!(decoded.level_bytes(0).map(<[u8]>::len), Some(level_len as usize));
    }
}
