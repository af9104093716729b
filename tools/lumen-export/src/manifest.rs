//! Manifest parsing and batch builds
//!
//! Parses assets.toml and converts every listed asset, continuing past
//! failures.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root manifest structure
#[derive(Debug, Deserialize, Default)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub meshes: Vec<MeshEntry>,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Defaults to the manifest's directory
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct MeshEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct TextureEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_mipmaps")]
    pub mipmaps: bool,
}

fn default_mipmaps() -> bool {
    true
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    Ok(manifest)
}

/// Outcome of a batch build
#[derive(Debug, Default)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
    /// Source path and rendered error chain
    pub failed: Vec<(PathBuf, String)>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, source: &Path, result: Result<PathBuf>) {
        match result {
            Ok(path) => self.written.push(path),
            Err(err) => {
                tracing::error!("Failed to convert {:?}: {:#}", source, err);
                self.failed.push((source.to_path_buf(), format!("{err:#}")));
            }
        }
    }
}

/// Build all assets from a manifest.
///
/// Relative source paths resolve against `base_dir` (the manifest's
/// directory); outputs go to the configured output directory, or
/// `output_override` when given.
pub fn build_all(manifest: &Manifest, base_dir: &Path, output_override: Option<&Path>) -> BuildReport {
    let output_dir = output_override
        .map(Path::to_path_buf)
        .or_else(|| manifest.output.dir.as_ref().map(|d| base_dir.join(d)))
        .unwrap_or_else(|| base_dir.to_path_buf());

    let mut report = BuildReport::default();

    for entry in &manifest.meshes {
        let source = base_dir.join(&entry.path);
        let output = entry.output.as_ref().map(|o| output_dir.join(o));
        tracing::info!("Converting mesh: {:?}", source);
        let result = match output {
            Some(output) => crate::mesh::convert_mesh(&source, Some(&output)),
            None => crate::mesh::convert_to_memory(&source).and_then(|model| {
                let name = source.file_name().context("Mesh path has no file name")?;
                let output = output_dir
                    .join(name)
                    .with_extension(model.kind.extension());
                lumen_assets::stream::write_asset_bytes(&output, &model.bytes)
                    .with_context(|| format!("Failed to write output: {:?}", output))?;
                Ok(output)
            }),
        };
        report.record(&source, result);
    }

    for entry in &manifest.textures {
        let source = base_dir.join(&entry.path);
        tracing::info!("Converting texture: {:?}", source);
        let result = source
            .file_name()
            .context("Texture path has no file name")
            .and_then(|name| {
                let output = match &entry.output {
                    Some(o) => output_dir.join(o),
                    None => crate::texture::default_output(&output_dir.join(name)),
                };
                crate::texture::convert_image(&source, Some(&output), entry.mipmaps)
            });
        report.record(&source, result);
    }

    tracing::info!(
        "Build finished: {} written, {} failed",
        report.written.len(),
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest: Manifest = toml::from_str(
            r#"
            [output]
            dir = "build"

            [[meshes]]
            path = "models/crate.glb"
            output = "crate.lmesh"

            [[textures]]
            path = "textures/crate.png"

            [[textures]]
            path = "textures/ui.png"
            mipmaps = false
            "#,
        )
        .unwrap();

        assert_eq!(manifest.output.dir, Some(PathBuf::from("build")));
        assert_eq!(manifest.meshes.len(), 1);
        assert_eq!(manifest.meshes[0].output, Some(PathBuf::from("crate.lmesh")));
        assert!(manifest.textures[0].mipmaps);
        assert!(!manifest.textures[1].mipmaps);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest: Manifest = toml::from_str("").unwrap();
        assert!(manifest.meshes.is_empty());
        assert!(manifest.output.dir.is_none());
    }

    #[test]
    fn test_build_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tri.obj"),
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        )
        .unwrap();
        let manifest: Manifest = toml::from_str(
            r#"
            [[meshes]]
            path = "missing.obj"

            [[meshes]]
            path = "tri.obj"
            "#,
        )
        .unwrap();

        let report = build_all(&manifest, dir.path(), None);
        assert!(!report.is_success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.written, vec![dir.path().join("tri.lmesh")]);
        assert!(dir.path().join("tri.lmesh").exists());
    }
}
