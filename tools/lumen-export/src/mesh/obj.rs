//! Wavefront OBJ import

use anyhow::{Context, Result, bail};
use lumen_assets::{Topology, TriangleMesh, ingest::UvChannel};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Corner of a face: position, texcoord and normal indices (0-based)
type Corner = (usize, Option<usize>, Option<usize>);

/// Read an OBJ file as one triangle mesh.
///
/// Polygons are fan-triangulated. Corners sharing the same
/// position/texcoord/normal triple share one vertex.
pub fn read_obj(input: &Path) -> Result<TriangleMesh> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    parse_obj(BufReader::new(file)).with_context(|| format!("Failed to parse OBJ: {:?}", input))
}

pub fn parse_obj<R: BufRead>(reader: R) -> Result<TriangleMesh> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals_raw: Vec<[f32; 3]> = Vec::new();
    let mut corners: Vec<Corner> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let number = |i: usize| -> Result<f32> {
            let token = parts
                .get(i)
                .with_context(|| format!("line {}: missing component", line_no + 1))?;
            token
                .parse()
                .with_context(|| format!("line {}: bad number {token:?}", line_no + 1))
        };

        match parts[0] {
            "v" => positions.push([number(1)?, number(2)?, number(3)?]),
            "vt" => tex_coords.push([number(1)?, number(2)?]),
            "vn" => normals_raw.push([number(1)?, number(2)?, number(3)?]),
            "f" => {
                let face = parts[1..]
                    .iter()
                    .map(|v| parse_corner(v, positions.len(), tex_coords.len(), normals_raw.len()))
                    .collect::<Option<Vec<_>>>()
                    .with_context(|| format!("line {}: bad face {line:?}", line_no + 1))?;
                if face.len() < 3 {
                    bail!("line {}: face has fewer than 3 corners", line_no + 1);
                }
                for i in 1..face.len() - 1 {
                    corners.extend([face[0], face[i], face[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if corners.is_empty() {
        bail!("No faces found in OBJ file");
    }

    // Attributes are kept only when every corner provides them
    let has_uvs = corners.iter().all(|c| c.1.is_some());
    let has_normals = corners.iter().all(|c| c.2.is_some());
    if !has_uvs && corners.iter().any(|c| c.1.is_some()) {
        tracing::warn!("Some OBJ faces lack texture coordinates; dropping them");
    }
    if !has_normals && corners.iter().any(|c| c.2.is_some()) {
        tracing::warn!("Some OBJ faces lack normals; dropping them");
    }

    let mut unique: HashMap<Corner, u32> = HashMap::new();
    let mut final_positions = Vec::new();
    let mut final_uvs = Vec::new();
    let mut final_normals = Vec::new();
    let mut indices = Vec::with_capacity(corners.len());

    for corner in corners {
        let key = (
            corner.0,
            corner.1.filter(|_| has_uvs),
            corner.2.filter(|_| has_normals),
        );
        let next = final_positions.len() as u32;
        let index = *unique.entry(key).or_insert_with(|| {
            final_positions.push(positions[key.0]);
            if let Some(t) = key.1 {
                final_uvs.push(tex_coords[t]);
            }
            if let Some(n) = key.2 {
                final_normals.push(normals_raw[n]);
            }
            next
        });
        indices.push(index);
    }

    let mut mesh = TriangleMesh::new(final_positions);
    if has_normals {
        mesh.normals = Some(final_normals);
    }
    if has_uvs {
        mesh.uv_channels.push(UvChannel::from_2d(&final_uvs));
    }
    mesh.topology = Topology::Faces(
        indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect(),
    );
    Ok(mesh)
}

/// Parse "v", "v/vt", "v//vn" or "v/vt/vn", resolving negative indices.
fn parse_corner(s: &str, positions: usize, tex_coords: usize, normals: usize) -> Option<Corner> {
    let mut parts = s.split('/');
    let v = resolve(parts.next()?, positions)?;
    let vt = match parts.next() {
        Some(t) if !t.is_empty() => Some(resolve(t, tex_coords)?),
        _ => None,
    };
    let vn = match parts.next() {
        Some(n) if !n.is_empty() => Some(resolve(n, normals)?),
        _ => None,
    };
    Some((v, vt, vn))
}

fn resolve(token: &str, count: usize) -> Option<usize> {
    let raw: i64 = token.parse().ok()?;
    let index = if raw < 0 {
        count.checked_sub(raw.unsigned_abs() as usize)?
    } else {
        (raw as usize).checked_sub(1)?
    };
    (index < count).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_is_fan_triangulated() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = parse_obj(obj.as_bytes()).unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(
            mesh.topology,
            Topology::Faces(vec![[0, 1, 2], [0, 2, 3]])
        );
        assert!(mesh.normals.is_none());
        assert!(mesh.uv_channels.is_empty());
    }

    #[test]
    fn test_full_corners() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";
        let mesh = parse_obj(obj.as_bytes()).unwrap();
        assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(3));
        assert_eq!(mesh.uv_channels[0].components, 2);
        assert_eq!(mesh.uv_channels[0].values, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let mesh = parse_obj(obj.as_bytes()).unwrap();
        assert_eq!(mesh.topology, Topology::Faces(vec![[0, 1, 2]]));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse_obj("v 0 0 0\n".as_bytes()).is_err());
        assert!(parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 3\n".as_bytes()).is_err());
        assert!(parse_obj("v 0 zero 0\n".as_bytes()).is_err());
    }
}
