//! Triangle mesh ingestion
//!
//! Turns an imported triangle mesh into one interleaved vertex blob, an
//! optional index blob and the matching [`GeometryRecord`].
//!
//! Vertex layout (all `f32`, little-endian, tightly packed):
//! position(3), normal(3), uv channels in order (1..=3 each),
//! color channels in order (4 each), tangent(3) + bitangent(3).
//! Absent attributes take no space.

use crate::error::{AssetError, AssetResult};
use crate::formats::mesh::{
    GeometryDesc, GeometryRecord, IndexMode, IndexWidth, MeshBuffers, PrimitiveType, pack_mesh,
};

/// One texture coordinate channel.
#[derive(Debug, Clone, PartialEq)]
pub struct UvChannel {
    /// Components per vertex (1, 2 or 3)
    pub components: usize,
    /// `vertex_count * components` values
    pub values: Vec<f32>,
}

impl UvChannel {
    pub fn from_2d(uvs: &[[f32; 2]]) -> Self {
        Self {
            components: 2,
            values: uvs.iter().flatten().copied().collect(),
        }
    }
}

/// Per-vertex tangent frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TangentFrame {
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
}

/// How the vertices form triangles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Topology {
    /// Draw the vertices in order as a triangle list.
    #[default]
    None,
    Faces(Vec<[u32; 3]>),
    Strips(Vec<Vec<u32>>),
}

/// Mesh data as delivered by an importer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub uv_channels: Vec<UvChannel>,
    pub color_channels: Vec<Vec<[f32; 4]>>,
    pub tangent_frame: Option<TangentFrame>,
    pub topology: Topology,
    /// Extra blobs stored after the index blob, in order
    pub auxiliary: Vec<Vec<u8>>,
}

impl TriangleMesh {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Interleaved attributes in storage order.
    pub fn layout(&self) -> Vec<VertexAttribute> {
        let mut attributes = Vec::new();
        let mut offset = 0;
        let mut push = |kind, components| {
            attributes.push(VertexAttribute {
                kind,
                components,
                offset,
            });
            offset += components * 4;
        };

        push(AttributeKind::Position, 3);
        if self.normals.is_some() {
            push(AttributeKind::Normal, 3);
        }
        for (i, channel) in self.uv_channels.iter().enumerate() {
            push(AttributeKind::TexCoord(i), channel.components);
        }
        for i in 0..self.color_channels.len() {
            push(AttributeKind::Color(i), 4);
        }
        if self.tangent_frame.is_some() {
            push(AttributeKind::Tangent, 3);
            push(AttributeKind::Bitangent, 3);
        }
        attributes
    }

    /// Bytes per interleaved vertex.
    pub fn vertex_stride(&self) -> usize {
        self.layout()
            .last()
            .map(|a| a.offset + a.components * 4)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Position,
    Normal,
    TexCoord(usize),
    Color(usize),
    Tangent,
    Bitangent,
}

/// Placement of one attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub kind: AttributeKind,
    pub components: usize,
    /// Byte offset from the start of the vertex
    pub offset: usize,
}

/// A mesh ready to be packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedMesh {
    pub record: GeometryRecord,
    pub buffers: MeshBuffers,
}

impl IngestedMesh {
    /// Encode, compress and stamp as a mesh file.
    pub fn pack(&self) -> AssetResult<Vec<u8>> {
        pack_mesh(&self.record, &self.buffers)
    }
}

/// Build the vertex/index blobs and record for `mesh`.
pub fn ingest(mesh: &TriangleMesh) -> AssetResult<IngestedMesh> {
    let vertex_count = mesh.vertex_count();
    let vertices = interleave(mesh)?;
    let index_width = IndexWidth::for_vertex_count(vertex_count);

    let (primitive_type, index_mode, indices) = match &mesh.topology {
        Topology::None => (PrimitiveType::Triangles, IndexMode::NoIndex, None),
        Topology::Faces(faces) => {
            let flat: Vec<u32> = faces.iter().flatten().copied().collect();
            check_indices(&flat, vertex_count)?;
            (PrimitiveType::Triangles, IndexMode::OnlyIndex, Some(flat))
        }
        Topology::Strips(strips) => {
            let sentinel = index_width.restart_sentinel();
            let mut joined = Vec::with_capacity(strips.iter().map(|s| s.len() + 1).sum());
            for (i, strip) in strips.iter().enumerate() {
                check_indices(strip, vertex_count)?;
                if i > 0 {
                    joined.push(sentinel);
                }
                joined.extend_from_slice(strip);
            }
            let mode = if strips.len() > 1 {
                IndexMode::IndexWithRestart
            } else {
                IndexMode::OnlyIndex
            };
            (PrimitiveType::TriangleStrip, mode, Some(joined))
        }
    };

    let element_count = match &indices {
        Some(indices) => indices.len(),
        None => vertex_count,
    };
    let element_count = u32::try_from(element_count)
        .map_err(|_| AssetError::invalid(format!("{element_count} elements exceed u32")))?;

    let buffers = MeshBuffers {
        vertices,
        indices: indices.map(|i| index_width.encode(&i)).transpose()?,
        auxiliary: mesh.auxiliary.clone(),
    };
    let desc = GeometryDesc {
        primitive_type,
        index_mode,
        index_width,
        element_count,
    };
    let record = GeometryRecord::layout(desc, &buffers)?;

    tracing::debug!(
        vertices = vertex_count,
        stride = mesh.vertex_stride(),
        elements = element_count,
        index_width = ?index_width,
        "ingested mesh"
    );
    Ok(IngestedMesh { record, buffers })
}

fn check_indices(indices: &[u32], vertex_count: usize) -> AssetResult<()> {
    match indices.iter().find(|&&i| i as usize >= vertex_count) {
        Some(bad) => Err(AssetError::invalid(format!(
            "index {bad} out of range for {vertex_count} vertices"
        ))),
        None => Ok(()),
    }
}

fn check_len(name: &str, actual: usize, expected: usize) -> AssetResult<()> {
    if actual != expected {
        return Err(AssetError::invalid(format!(
            "{name} has {actual} values, expected {expected}"
        )));
    }
    Ok(())
}

/// Interleave every attribute of `mesh` into one vertex blob.
pub fn interleave(mesh: &TriangleMesh) -> AssetResult<Vec<u8>> {
    let count = mesh.vertex_count();
    if let Some(normals) = &mesh.normals {
        check_len("normals", normals.len(), count)?;
    }
    for (i, channel) in mesh.uv_channels.iter().enumerate() {
        if !(1..=3).contains(&channel.components) {
            return Err(AssetError::invalid(format!(
                "uv channel {i} has {} components",
                channel.components
            )));
        }
        check_len(
            &format!("uv channel {i}"),
            channel.values.len(),
            count * channel.components,
        )?;
    }
    for (i, colors) in mesh.color_channels.iter().enumerate() {
        check_len(&format!("color channel {i}"), colors.len(), count)?;
    }
    if let Some(frame) = &mesh.tangent_frame {
        check_len("tangents", frame.tangents.len(), count)?;
        check_len("bitangents", frame.bitangents.len(), count)?;
    }

    let bytes = count * mesh.vertex_stride();
    let mut out = Vec::new();
    out.try_reserve_exact(bytes)
        .map_err(|_| AssetError::Allocation { bytes })?;

    let mut put = |values: &[f32]| {
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
    };
    for v in 0..count {
        put(&mesh.positions[v]);
        if let Some(normals) = &mesh.normals {
            put(&normals[v]);
        }
        for channel in &mesh.uv_channels {
            let n = channel.components;
            put(&channel.values[v * n..(v + 1) * n]);
        }
        for colors in &mesh.color_channels {
            put(&colors[v]);
        }
        if let Some(frame) = &mesh.tangent_frame {
            put(&frame.tangents[v]);
            put(&frame.bitangents[v]);
        }
    }
    Ok(out)
}
