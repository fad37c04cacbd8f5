//! Wavefront OBJ reader
//!
//! Positions are kept as written and become control points one-to-one.
//! Faces are fan-triangulated. `vt`/`vn` references turn into per-corner
//! attributes, kept only when every corner of the mesh has one.

use super::MeshData;
use crate::buffer::IndexingConvention;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Load an OBJ file
pub fn load_obj(input: &Path) -> Result<MeshData> {
    let text = fs::read_to_string(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    let mesh = parse_obj(&text).with_context(|| format!("Failed to parse OBJ: {:?}", input))?;

    tracing::debug!(
        "Loaded OBJ {:?}: {} positions, {} triangles",
        input,
        mesh.positions.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// One face corner: position, optional texture coordinate and normal indices
type Corner = (usize, Option<usize>, Option<usize>);

/// Parse OBJ source text
pub fn parse_obj(text: &str) -> Result<MeshData> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals_raw: Vec<[f32; 3]> = Vec::new();

    let mut indices: Vec<u32> = Vec::new();
    let mut corner_uvs: Vec<Option<[f32; 2]>> = Vec::new();
    let mut corner_normals: Vec<Option<[f32; 3]>> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" => positions.push(parse_floats(&parts[1..], line_no)?),
            "vt" => {
                // The optional w component is ignored
                let [u, v, _] = parse_floats_padded::<3>(&parts[1..], 2, line_no)?;
                tex_coords.push([u, v]);
            }
            "vn" => normals_raw.push(parse_floats(&parts[1..], line_no)?),
            "f" => {
                let face: Vec<Corner> = parts[1..]
                    .iter()
                    .map(|s| {
                        parse_obj_vertex(s, positions.len(), tex_coords.len(), normals_raw.len())
                            .with_context(|| format!("line {line_no}: bad face vertex {s:?}"))
                    })
                    .collect::<Result<_>>()?;

                if face.len() < 3 {
                    bail!("line {line_no}: face has {} vertices, need at least 3", face.len());
                }

                // Fan triangulation, valid for convex polygons
                for i in 1..face.len() - 1 {
                    for &(vi, vti, vni) in [&face[0], &face[i], &face[i + 1]] {
                        let vi = u32::try_from(vi)
                            .with_context(|| format!("line {line_no}: index {vi} too large"))?;
                        indices.push(vi);
                        corner_uvs.push(lookup(&tex_coords, vti, "texture coordinate", line_no)?);
                        corner_normals.push(lookup(&normals_raw, vni, "normal", line_no)?);
                    }
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        bail!("No vertices found in OBJ file");
    }
    if indices.is_empty() {
        bail!("No faces found in OBJ file");
    }

    Ok(MeshData {
        positions,
        indices,
        uvs: complete(corner_uvs, "texture coordinates"),
        normals: complete(corner_normals, "normals"),
    })
}

/// Keep a per-corner attribute only if every corner has a value
fn complete<T>(values: Vec<Option<T>>, what: &str) -> Option<(Vec<T>, IndexingConvention)> {
    let present = values.iter().filter(|v| v.is_some()).count();
    if present == 0 {
        return None;
    }
    if present < values.len() {
        tracing::warn!(
            "OBJ {} given for {} of {} corners, dropping them",
            what,
            present,
            values.len()
        );
        return None;
    }
    let values: Option<Vec<T>> = values.into_iter().collect();
    values.map(|v| (v, IndexingConvention::PerCorner))
}

fn lookup<T: Copy>(values: &[T], index: Option<usize>, what: &str, line_no: usize) -> Result<Option<T>> {
    match index {
        None => Ok(None),
        Some(i) => values.get(i).copied().map(Some).with_context(|| {
            format!("line {line_no}: {what} index {} out of range", i + 1)
        }),
    }
}

fn parse_floats<const N: usize>(parts: &[&str], line_no: usize) -> Result<[f32; N]> {
    parse_floats_padded(parts, N, line_no)
}

/// Parse up to `N` numbers, requiring at least `required`; missing ones are 0
fn parse_floats_padded<const N: usize>(parts: &[&str], required: usize, line_no: usize) -> Result<[f32; N]> {
    if parts.len() < required {
        bail!("line {line_no}: expected {required} numbers, got {}", parts.len());
    }
    let mut out = [0.0; N];
    for (slot, s) in out.iter_mut().zip(parts) {
        *slot = s
            .parse()
            .with_context(|| format!("line {line_no}: invalid number {s:?}"))?;
    }
    Ok(out)
}

/// Parse an OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
///
/// Indices are 1-based; negative values count back from the most recent entry.
fn parse_obj_vertex(s: &str, positions: usize, tex_coords: usize, normals: usize) -> Option<Corner> {
    let mut parts = s.split('/');

    let vi = resolve_index(parts.next()?, positions)?;
    let vti = match parts.next().filter(|p| !p.is_empty()) {
        Some(p) => Some(resolve_index(p, tex_coords)?),
        None => None,
    };
    let vni = match parts.next().filter(|p| !p.is_empty()) {
        Some(p) => Some(resolve_index(p, normals)?),
        None => None,
    };

    Some((vi, vti, vni))
}

fn resolve_index(s: &str, count: usize) -> Option<usize> {
    let raw: i64 = s.parse().ok()?;
    match raw {
        0 => None,
        r if r > 0 => usize::try_from(r - 1).ok(),
        r => usize::try_from(count as i64 + r).ok(),
    }
}
