//! Integration tests for lumen-export
//!
//! Tests the full pipeline: generate test assets -> convert -> verify output

mod generate_test_assets;

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

use lumen_assets::stream::{probe, read_container_file, read_mesh_file, read_texture_file};
use lumen_assets::{AssetKind, ExternalFormat, IndexMode, IndexWidth, InternalFormat, PrimitiveType, Swizzle};

/// Test triangle OBJ -> .lmesh conversion
#[test]
fn test_triangle_obj_to_lmesh() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("triangle.obj");
    let mesh_path = dir.path().join("triangle.lmesh");

    generate_test_assets::generate_triangle_obj(&obj_path).expect("Failed to generate OBJ");
    lumen_export(&["genmodel", path_str(&obj_path), "-o", path_str(&mesh_path)]);

    let asset = read_mesh_file(&mesh_path).expect("Failed to read mesh file");
    let record = &asset.record;
    assert_eq!(record.primitive_type, PrimitiveType::Triangles);
    assert_eq!(record.index_mode, IndexMode::OnlyIndex);
    assert_eq!(record.index_width, IndexWidth::U16);
    assert_eq!(record.element_count, 3);
    assert_eq!(record.vertex_blob.length, 36);
    assert_eq!(record.index_blob.map(|r| r.length), Some(6));
}

/// Test cube OBJ with normals and UVs, default output path
#[test]
fn test_cube_obj_default_output() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("cube.obj");
    generate_test_assets::generate_cube_obj(&obj_path).expect("Failed to generate OBJ");

    lumen_export(&["genmodel", path_str(&obj_path)]);

    let mesh_path = dir.path().join("cube.lmesh");
    let asset = read_mesh_file(&mesh_path).expect("Failed to read mesh file");
    // position + normal + uv = 32 bytes per vertex, 4 unique corners per face
    assert_eq!(asset.record.vertex_blob.length, 24 * 32);
    assert_eq!(asset.record.element_count, 36);
}

/// Test glTF with two primitives -> .lmeshes container
#[test]
fn test_gltf_primitives_to_container() {
    let dir = tempdir().expect("Failed to create temp dir");
    let gltf_path = dir.path().join("pair.gltf");
    generate_test_assets::generate_two_primitive_gltf(&gltf_path)
        .expect("Failed to generate glTF");

    lumen_export(&["genmodel", path_str(&gltf_path)]);

    let container_path = dir.path().join("pair.lmeshes");
    assert_eq!(probe(&container_path).unwrap(), AssetKind::MeshContainer);
    let meshes = read_container_file(&container_path).expect("Failed to read container");
    assert_eq!(meshes.len(), 2);

    assert_eq!(meshes[0].record.primitive_type, PrimitiveType::Triangles);
    assert_eq!(meshes[0].view().indices(), Some(vec![0, 1, 2]));

    assert_eq!(meshes[1].record.primitive_type, PrimitiveType::TriangleStrip);
    assert_eq!(meshes[1].record.index_mode, IndexMode::OnlyIndex);
    assert_eq!(meshes[1].view().indices(), Some(vec![0, 1, 2]));
}

/// Test PNG -> .ltex conversion with a full mip chain
#[test]
fn test_png_to_ltex() {
    let dir = tempdir().expect("Failed to create temp dir");
    let png_path = dir.path().join("checker.png");
    let tex_path = dir.path().join("checker.ltex");

    generate_test_assets::generate_checkerboard_png(&png_path).expect("Failed to generate PNG");
    lumen_export(&["gentexture", path_str(&png_path), "-o", path_str(&tex_path)]);

    let asset = read_texture_file(&tex_path).expect("Failed to read texture file");
    let record = &asset.record;
    assert_eq!(record.internal_format, InternalFormat::Rgba8);
    assert_eq!(record.mip_levels.len(), 3);
    assert_eq!((record.mip_levels[0].width, record.mip_levels[0].height), (4, 4));
    assert_eq!(record.total_byte_size().unwrap(), 64 + 16 + 4);

    let view = asset.view();
    assert_eq!(&view.level_bytes(0).unwrap()[0..4], &[255, 0, 0, 255]);
}

/// Test greyscale PNG -> single channel texture with swizzle
#[test]
fn test_grey_png_without_mipmaps() {
    let dir = tempdir().expect("Failed to create temp dir");
    let png_path = dir.path().join("grey.png");
    generate_test_assets::generate_grey_png(&png_path).expect("Failed to generate PNG");

    lumen_export(&["gentexture", path_str(&png_path), "--no-mipmaps"]);

    let asset = read_texture_file(&dir.path().join("grey.ltex")).expect("Failed to read texture");
    assert_eq!(asset.record.external_format, ExternalFormat::Red);
    assert_eq!(asset.record.mip_levels.len(), 1);
    assert_eq!(
        asset.record.swizzle,
        Some([Swizzle::Red, Swizzle::Red, Swizzle::Red, Swizzle::One])
    );
    assert_eq!(asset.view().level_bytes(0).unwrap().len(), 16);
}

/// Test inspect output for a mesh
#[test]
fn test_inspect_mesh() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("triangle.obj");
    generate_test_assets::generate_triangle_obj(&obj_path).expect("Failed to generate OBJ");
    lumen_export(&["genmodel", path_str(&obj_path)]);

    let output = lumen_export(&["inspect", path_str(&dir.path().join("triangle.lmesh"))]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mesh"), "{stdout}");
    assert!(stdout.contains("OnlyIndex"), "{stdout}");
    assert!(stdout.contains("elements:      3"), "{stdout}");
}

/// Test that a non-asset file is rejected with a non-zero exit
#[test]
fn test_inspect_rejects_foreign_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let junk = dir.path().join("junk.lmesh");
    std::fs::write(&junk, b"definitely not an asset").unwrap();

    let output = run(&["inspect", path_str(&junk)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a"));
}

/// Test batch build: failures are reported, the rest is still written
#[test]
fn test_build_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    generate_test_assets::generate_triangle_obj(&dir.path().join("triangle.obj")).unwrap();
    generate_test_assets::generate_checkerboard_png(&dir.path().join("checker.png")).unwrap();
    let manifest = dir.path().join("assets.toml");
    std::fs::write(
        &manifest,
        r#"
[output]
dir = "out"

[[meshes]]
path = "triangle.obj"

[[meshes]]
path = "missing.obj"

[[textures]]
path = "checker.png"
mipmaps = false
"#,
    )
    .unwrap();

    let output = run(&["build", path_str(&manifest)]);
    assert!(!output.status.success(), "missing source must fail the build");
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.obj"));

    assert!(read_mesh_file(&dir.path().join("out/triangle.lmesh")).is_ok());
    let texture = read_texture_file(&dir.path().join("out/checker.ltex")).unwrap();
    assert_eq!(texture.record.mip_levels.len(), 1);
}

/// Test the interactive shell over stdin
#[test]
fn test_shell_session() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("triangle.obj");
    generate_test_assets::generate_triangle_obj(&obj_path).unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_lumen-export"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run lumen-export");
    {
        let stdin = child.stdin.as_mut().expect("stdin is piped");
        writeln!(stdin, "genmodel {}", obj_path.display()).unwrap();
        writeln!(stdin, "gentexture {}", dir.path().join("missing.png").display()).unwrap();
        writeln!(stdin, "exit").unwrap();
    }
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("triangle.lmesh"), "{stdout}");
    assert!(stdout.contains("error:"), "{stdout}");
    assert!(dir.path().join("triangle.lmesh").exists());
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lumen-export"))
        .args(args)
        .output()
        .expect("Failed to run lumen-export")
}

// Helper to run lumen-export and require success
fn lumen_export(args: &[&str]) -> Output {
    let output = run(args);
    assert!(
        output.status.success(),
        "lumen-export {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}
