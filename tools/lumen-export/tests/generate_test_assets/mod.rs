//! Test asset generators
//!
//! Writes small OBJ, PNG and glTF sources for the integration tests.

use std::io;
use std::path::Path;

/// Single triangle, positions only
pub fn generate_triangle_obj(path: &Path) -> io::Result<()> {
    std::fs::write(path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")
}

/// Unit cube with per-face normals and texture coordinates
pub fn generate_cube_obj(path: &Path) -> io::Result<()> {
    let mut obj = String::from("# cube\n");
    for z in [0.0, 1.0] {
        for y in [0.0, 1.0] {
            for x in [0.0, 1.0] {
                obj.push_str(&format!("v {x} {y} {z}\n"));
            }
        }
    }
    obj.push_str("vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n");
    obj.push_str("vn 0 0 -1\nvn 0 0 1\nvn 0 -1 0\nvn 0 1 0\nvn -1 0 0\nvn 1 0 0\n");
    let faces = [
        ([1, 3, 4, 2], 1),
        ([5, 6, 8, 7], 2),
        ([1, 2, 6, 5], 3),
        ([3, 7, 8, 4], 4),
        ([1, 5, 7, 3], 5),
        ([2, 4, 8, 6], 6),
    ];
    for (corners, normal) in faces {
        obj.push('f');
        for (i, v) in corners.iter().enumerate() {
            obj.push_str(&format!(" {v}/{}/{normal}", i + 1));
        }
        obj.push('\n');
    }
    std::fs::write(path, obj)
}

/// 4x4 RGBA checkerboard
pub fn generate_checkerboard_png(path: &Path) -> image::ImageResult<()> {
    let img = image::RgbaImage::from_fn(4, 4, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 0, 0, 255])
        } else {
            image::Rgba([0, 255, 0, 255])
        }
    });
    img.save(path)
}

/// 8x2 greyscale gradient
pub fn generate_grey_png(path: &Path) -> image::ImageResult<()> {
    let img = image::GrayImage::from_fn(8, 2, |x, _| image::Luma([(x * 32) as u8]));
    img.save(path)
}

/// One glTF mesh with two primitives sharing a position accessor: an
/// indexed triangle list and an unindexed triangle strip.
pub fn generate_two_primitive_gltf(path: &Path) -> io::Result<()> {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let indices: [u16; 3] = [0, 1, 2];

    let mut bin = Vec::new();
    bin.extend_from_slice(bytemuck::cast_slice(&positions));
    bin.extend_from_slice(bytemuck::cast_slice(&indices));
    bin.extend_from_slice(&[0, 0]); // pad to 4 bytes

    let bin_name = path.with_extension("bin");
    let bin_uri = bin_name
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("buffer.bin")
        .to_string();
    std::fs::write(&bin_name, &bin)?;

    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "buffers": [{{ "uri": "{bin_uri}", "byteLength": {len} }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ],
  "meshes": [{{
    "name": "pair",
    "primitives": [
      {{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "mode": 4 }},
      {{ "attributes": {{ "POSITION": 0 }}, "mode": 5 }}
    ]
  }}],
  "nodes": [{{ "mesh": 0 }}],
  "scenes": [{{ "nodes": [0] }}],
  "scene": 0
}}"#,
        len = bin.len()
    );
    std::fs::write(path, json)
}
