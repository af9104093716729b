//! glTF/GLB import

use anyhow::{Context, Result};
use glam::{Vec3, Vec4};
use gltf::mesh::Mode;
use lumen_assets::ingest::{TangentFrame, UvChannel};
use lumen_assets::{Topology, TriangleMesh};
use std::path::Path;

/// Read every triangle primitive of every mesh in a glTF/GLB file.
///
/// Primitives that are not triangle lists or strips are skipped with a
/// warning.
pub fn read_gltf(input: &Path) -> Result<Vec<TriangleMesh>> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            let name = mesh.name().unwrap_or("<unnamed>");
            match primitive.mode() {
                Mode::Triangles | Mode::TriangleStrip => {}
                other => {
                    tracing::warn!(
                        "Skipping primitive {} of mesh '{}': unsupported mode {:?}",
                        primitive.index(),
                        name,
                        other
                    );
                    continue;
                }
            }
            let converted = read_primitive(&primitive, &buffers).with_context(|| {
                format!("Failed to read primitive {} of mesh '{}'", primitive.index(), name)
            })?;
            meshes.push(converted);
        }
    }

    anyhow::ensure!(!meshes.is_empty(), "No triangle primitives found in glTF");
    Ok(meshes)
}

fn read_primitive(primitive: &gltf::Primitive<'_>, buffers: &[gltf::buffer::Data]) -> Result<TriangleMesh> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    // Positions (required)
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("No positions in primitive")?
        .collect();
    let mut mesh = TriangleMesh::new(positions);

    mesh.normals = reader.read_normals().map(|iter| iter.collect());

    // Every TEXCOORD_n set, in order
    let mut set = 0;
    while let Some(uvs) = reader.read_tex_coords(set) {
        let uvs: Vec<[f32; 2]> = uvs.into_f32().collect();
        mesh.uv_channels.push(UvChannel::from_2d(&uvs));
        set += 1;
    }

    let mut set = 0;
    while let Some(colors) = reader.read_colors(set) {
        mesh.color_channels.push(colors.into_rgba_f32().collect());
        set += 1;
    }

    // Tangent w is the handedness of the bitangent; a frame needs normals
    if let (Some(normals), Some(tangents)) = (&mesh.normals, reader.read_tangents()) {
        let tangents: Vec<[f32; 4]> = tangents.collect();
        mesh.tangent_frame = Some(tangent_frame(normals, &tangents));
    }

    let indices: Option<Vec<u32>> = reader.read_indices().map(|i| i.into_u32().collect());
    mesh.topology = match (primitive.mode(), indices) {
        (Mode::TriangleStrip, Some(indices)) => Topology::Strips(vec![indices]),
        (Mode::TriangleStrip, None) => {
            Topology::Strips(vec![(0..mesh.vertex_count() as u32).collect()])
        }
        (_, Some(indices)) => Topology::Faces(triangle_faces(&indices)?),
        (_, None) => Topology::None,
    };

    Ok(mesh)
}

/// Group a triangle-list index accessor into faces.
fn triangle_faces(indices: &[u32]) -> Result<Vec<[u32; 3]>> {
    anyhow::ensure!(
        indices.len() % 3 == 0,
        "Triangle list has {} indices, not a multiple of 3",
        indices.len()
    );
    Ok(indices
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect())
}

/// Split glTF vec4 tangents into tangent and bitangent vectors.
pub fn tangent_frame(normals: &[[f32; 3]], tangents: &[[f32; 4]]) -> TangentFrame {
    let (tangents, bitangents) = normals
        .iter()
        .zip(tangents)
        .map(|(n, t)| {
            let t = Vec4::from_array(*t);
            let bitangent = Vec3::from_array(*n).cross(t.truncate()) * t.w;
            (t.truncate().to_array(), bitangent.to_array())
        })
        .unzip();
    TangentFrame {
        tangents,
        bitangents,
    }
}
