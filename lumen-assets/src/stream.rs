//! Asset file I/O.
//!
//! Writers go through a sibling temporary file that is renamed into place,
//! so an interrupted write never leaves a half-written asset under the
//! final name. Readers check the magic before decoding anything and report
//! the path in every error.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{AssetError, AssetResult};
use crate::formats::{
    AssetKind, BlobSource, GeometryAsset, GeometryRecord, MAGIC_SIZE, MeshContainer, MipSource,
    PixelRecord, TextureAsset, encode_many, load_mesh, load_texture, pack_mesh, pack_texture,
    read_magic,
};

/// Pack `record` and write it as a mesh file.
pub fn write_mesh_file<S: BlobSource + ?Sized>(
    path: &Path,
    record: &GeometryRecord,
    source: &S,
) -> AssetResult<()> {
    write_atomic(path, &pack_mesh(record, source)?)
}

/// Write already packed mesh files as one container.
pub fn write_container_file<B: AsRef<[u8]>>(path: &Path, mesh_files: &[B]) -> AssetResult<()> {
    write_atomic(path, &encode_many(mesh_files)?)
}

/// Pack `record` and write it as a texture file.
pub fn write_texture_file<S: MipSource + ?Sized>(
    path: &Path,
    record: &PixelRecord,
    source: &S,
) -> AssetResult<()> {
    write_atomic(path, &pack_texture(record, source)?)
}

pub fn read_mesh_file(path: &Path) -> AssetResult<GeometryAsset> {
    load_mesh(&read_file(path, AssetKind::Mesh)?)
}

/// Read a container and decode every record.
pub fn read_container_file(path: &Path) -> AssetResult<Vec<GeometryAsset>> {
    let bytes = read_file(path, AssetKind::MeshContainer)?;
    MeshContainer::parse(&bytes)?.load_all()
}

pub fn read_texture_file(path: &Path) -> AssetResult<TextureAsset> {
    load_texture(&read_file(path, AssetKind::Texture)?)
}

/// Write complete asset bytes (magic included) produced elsewhere.
pub fn write_asset_bytes(path: &Path, bytes: &[u8]) -> AssetResult<AssetKind> {
    let magic = read_magic(bytes)?;
    let kind = AssetKind::from_magic(magic)
        .ok_or_else(|| AssetError::invalid(format!("unknown asset magic {magic:#018x}")))?;
    write_atomic(path, bytes)?;
    Ok(kind)
}

/// Read a whole file, failing with [`AssetError::FileType`] unless it opens
/// with the magic of `kind`.
pub fn read_file(path: &Path, kind: AssetKind) -> AssetResult<Vec<u8>> {
    let bytes = fs::read(path).map_err(|source| AssetError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let actual_magic = read_magic(&bytes).unwrap_or(0);
    if actual_magic != kind.magic() {
        return Err(AssetError::FileType {
            path: path.to_path_buf(),
            expected: kind.name(),
            actual_magic,
        });
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), kind = kind.name(), "read asset");
    Ok(bytes)
}

/// Identify an asset file from its leading magic without reading the rest.
pub fn probe(path: &Path) -> AssetResult<AssetKind> {
    let mut file = fs::File::open(path).map_err(|source| AssetError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut head = Vec::with_capacity(MAGIC_SIZE);
    (&mut file).take(MAGIC_SIZE as u64).read_to_end(&mut head)?;

    let actual_magic = read_magic(&head).unwrap_or(0);
    AssetKind::from_magic(actual_magic).ok_or_else(|| AssetError::FileType {
        path: path.to_path_buf(),
        expected: "Lumen asset",
        actual_magic,
    })
}

/// Write `bytes` to a temporary file next to `path`, then rename it over
/// `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> AssetResult<()> {
    let open_error = |source| AssetError::FileOpen {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(open_error)?;
    }

    let temp = temp_path(path);
    let result = (|| {
        let mut file = fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp, path)
    })();
    if let Err(source) = result {
        let _ = fs::remove_file(&temp);
        return Err(open_error(source));
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote asset");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".tmp{}", std::process::id()));
    path.with_file_name(name)
}
