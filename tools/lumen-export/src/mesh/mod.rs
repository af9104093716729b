//! Mesh converter (glTF/GLB/OBJ -> .lmesh / .lmeshes)

mod gltf;
mod obj;

pub use gltf::{read_gltf, tangent_frame};
pub use obj::{parse_obj, read_obj};

use anyhow::{Context, Result, bail};
use lumen_assets::formats::encode_many;
use lumen_assets::stream::write_asset_bytes;
use lumen_assets::{AssetKind, TriangleMesh, ingest};
use std::path::{Path, PathBuf};

/// Result of in-memory mesh conversion
pub struct ConvertedModel {
    /// `Mesh` for a single primitive, `MeshContainer` otherwise
    pub kind: AssetKind,
    /// Complete file bytes
    pub bytes: Vec<u8>,
    pub mesh_count: usize,
}

/// Read a mesh source, picking the importer by extension.
pub fn read_source(input: &Path) -> Result<Vec<TriangleMesh>> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "obj" => Ok(vec![read_obj(input)?]),
        "gltf" | "glb" => read_gltf(input),
        _ => bail!(
            "Unsupported mesh format: {:?} (use .obj, .gltf, or .glb)",
            input
        ),
    }
}

/// Convert a mesh source to file bytes without touching the disk.
pub fn convert_to_memory(input: &Path) -> Result<ConvertedModel> {
    let meshes = read_source(input)?;
    let mut files = Vec::with_capacity(meshes.len());
    for (i, mesh) in meshes.iter().enumerate() {
        let ingested = ingest(mesh).with_context(|| format!("Failed to ingest mesh {i}"))?;
        files.push(ingested.pack()?);
    }

    if let [single] = files.as_mut_slice() {
        return Ok(ConvertedModel {
            kind: AssetKind::Mesh,
            bytes: std::mem::take(single),
            mesh_count: 1,
        });
    }
    Ok(ConvertedModel {
        kind: AssetKind::MeshContainer,
        bytes: encode_many(&files)?,
        mesh_count: files.len(),
    })
}

/// Default output path for a converted model of `kind`.
pub fn default_output(input: &Path, kind: AssetKind) -> PathBuf {
    input.with_extension(kind.extension())
}

/// Convert a mesh source and write it next to the input or to `output`.
///
/// Returns the path written.
pub fn convert_mesh(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let model = convert_to_memory(input)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input, model.kind));

    write_asset_bytes(&output, &model.bytes)
        .with_context(|| format!("Failed to write output: {:?}", output))?;
    tracing::info!(
        "Converted {} mesh(es) from {:?} -> {:?} ({} bytes)",
        model.mesh_count,
        input,
        output,
        model.bytes.len()
    );
    Ok(output)
}
