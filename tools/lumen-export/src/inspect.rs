//! Human-readable summaries of asset files

use anyhow::{Context, Result};
use lumen_assets::formats::MeshContainer;
use lumen_assets::stream::{probe, read_file, read_mesh_file, read_texture_file};
use lumen_assets::{AssetKind, GeometryRecord, PixelRecord};
use std::fmt::Write;
use std::path::Path;

/// Decode an asset file and describe its header fields.
pub fn describe(path: &Path) -> Result<String> {
    let kind = probe(path)?;
    let mut out = String::new();
    match kind {
        AssetKind::Mesh => {
            let asset = read_mesh_file(path)?;
            writeln!(out, "{:?}: mesh", path)?;
            describe_mesh(&mut out, &asset.record)?;
        }
        AssetKind::MeshContainer => {
            let bytes = read_file(path, kind)?;
            let container = MeshContainer::parse(&bytes)?;
            writeln!(out, "{:?}: mesh container, {} record(s)", path, container.len())?;
            for (i, asset) in container.load_all()?.iter().enumerate() {
                writeln!(out, "record {i}:")?;
                describe_mesh(&mut out, &asset.record)?;
            }
        }
        AssetKind::Texture => {
            let asset = read_texture_file(path)?;
            writeln!(out, "{:?}: texture", path)?;
            describe_texture(&mut out, &asset.record)
                .with_context(|| format!("Failed to describe {:?}", path))?;
        }
    }
    Ok(out)
}

fn describe_mesh(out: &mut String, record: &GeometryRecord) -> Result<()> {
    writeln!(out, "  primitive:     {:?}", record.primitive_type)?;
    writeln!(out, "  index mode:    {:?}", record.index_mode)?;
    writeln!(out, "  index width:   {:?}", record.index_width)?;
    writeln!(out, "  restart value: {:#x}", record.restart_value)?;
    writeln!(out, "  elements:      {}", record.element_count)?;
    writeln!(
        out,
        "  vertex blob:   {} bytes @ {}",
        record.vertex_blob.length, record.vertex_blob.start
    )?;
    if let Some(index) = record.index_blob {
        writeln!(out, "  index blob:    {} bytes @ {}", index.length, index.start)?;
    }
    for (i, aux) in record.auxiliary_blobs.iter().enumerate() {
        writeln!(out, "  auxiliary {i}:   {} bytes @ {}", aux.length, aux.start)?;
    }
    Ok(())
}

fn describe_texture(out: &mut String, record: &PixelRecord) -> Result<()> {
    writeln!(out, "  target:        {:?}", record.target)?;
    writeln!(out, "  internal:      {:?}", record.internal_format)?;
    writeln!(
        out,
        "  external:      {:?} / {:?} ({} bytes per pixel)",
        record.external_format,
        record.component_type,
        record.pixel_size()
    )?;
    if let Some(swizzle) = record.swizzle {
        writeln!(out, "  swizzle:       {:?}", swizzle)?;
    }
    writeln!(out, "  slices:        {}", record.slice_count)?;
    writeln!(out, "  total bytes:   {}", record.total_byte_size()?)?;
    for (i, mip) in record.mip_levels.iter().enumerate() {
        writeln!(
            out,
            "  mip {i}:         {}x{}x{}, {} bytes per slice",
            mip.width, mip.height, mip.depth, mip.blob.length
        )?;
    }
    Ok(())
}
