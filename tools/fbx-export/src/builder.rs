//! Indexed mesh construction from a validated geometry buffer
//!
//! Storage per attribute:
//!
//! | Attribute | Input        | Mapping           | Stored values |
//! |-----------|--------------|-------------------|---------------|
//! | UV        | per corner   | `ByPolygonVertex` | `uvs[c]`          |
//! | UV        | per vertex   | `ByPolygonVertex` | `uvs[indices[c]]` |
//! | Normal    | per corner   | `ByPolygonVertex` | `normals[c]`      |
//! | Normal    | per vertex   | `ByControlPoint`  | `normals[v]`      |

use crate::buffer::{BufferLayout, GeometryBuffer, IndexingConvention};
use crate::error::{ExportError, Result};
use fbx_common::{MappingMode, Mesh, NormalElement, UvElement};
use glam::{DVec2, DVec3, Vec2, Vec3};

/// Name of the UV set written on every mesh, referenced by its texture
pub const UV_SET_NAME: &str = "UVChannel_1";

/// Build a detached mesh from `buffer`, which `adapt` produced `layout` for
pub fn build_mesh(name: &str, buffer: &GeometryBuffer<'_>, layout: &BufferLayout) -> Result<Mesh> {
    let mut mesh = Mesh::new(name);

    mesh.init_control_points(layout.vertex_count);
    for (i, p) in buffer.positions.iter().enumerate() {
        mesh.set_control_point_at(Vec3::from_array(*p).as_dvec3(), i);
    }

    for triangle in buffer.indices.chunks_exact(3) {
        mesh.begin_polygon();
        for &vertex in triangle {
            mesh.add_polygon(vertex);
        }
        mesh.end_polygon();
    }

    let uvs = buffer.uvs.zip(layout.uv);
    let normals = buffer.normals.zip(layout.normal);

    if uvs.is_some() || normals.is_some() {
        let index = if mesh.layer_count() == 0 {
            mesh.create_layer()
        } else {
            0
        };
        let layer = mesh
            .layer_mut(index)
            .ok_or_else(|| ExportError::geometry(format!("mesh {name:?} has no layer {index}")))?;

        if let Some((attr, _)) = uvs {
            let mut element = UvElement::new(UV_SET_NAME, MappingMode::ByPolygonVertex);
            for corner in 0..buffer.indices.len() {
                let uv = attr.at_corner(corner, buffer.indices).copied().unwrap_or_default();
                element.push(Vec2::from_array(uv).as_dvec2());
            }
            layer.set_uvs(element);
        }

        if let Some((attr, convention)) = normals {
            let element = match convention {
                IndexingConvention::PerVertex => {
                    let mut element = NormalElement::new("", MappingMode::ByControlPoint);
                    for n in attr.values {
                        element.push(Vec3::from_array(*n).as_dvec3());
                    }
                    element
                }
                IndexingConvention::PerCorner => {
                    let mut element = NormalElement::new("", MappingMode::ByPolygonVertex);
                    for corner in 0..buffer.indices.len() {
                        let n = attr.at_corner(corner, buffer.indices).copied().unwrap_or_default();
                        element.push(Vec3::from_array(n).as_dvec3());
                    }
                    element
                }
            };
            layer.set_normals(element);
        }
    }

    mesh.validate_layers()
        .map_err(|mismatch| ExportError::geometry(format!("mesh {name:?}: {mismatch}")))?;

    tracing::debug!(
        "Built mesh {:?}: {} control points, {} triangles, uv={:?}, normal={:?}",
        name,
        mesh.control_points_count(),
        mesh.polygon_count(),
        layout.uv,
        layout.normal
    );
    Ok(mesh)
}

/// Per-corner UV values of a built mesh, or `None` without a UV layer
pub fn corner_uvs(mesh: &Mesh) -> Option<Vec<DVec2>> {
    let uvs = mesh.layer(0)?.uvs()?;
    match uvs.mapping_mode() {
        MappingMode::ByPolygonVertex => Some(uvs.direct().to_vec()),
        MappingMode::ByControlPoint => Some(
            mesh.polygons()
                .flatten()
                .map(|&v| uvs.direct().get(v as usize).copied().unwrap_or_default())
                .collect(),
        ),
    }
}

/// Per-corner normal values of a built mesh, or `None` without normals
pub fn corner_normals(mesh: &Mesh) -> Option<Vec<DVec3>> {
    let normals = mesh.layer(0)?.normals()?;
    match normals.mapping_mode() {
        MappingMode::ByPolygonVertex => Some(normals.direct().to_vec()),
        MappingMode::ByControlPoint => Some(
            mesh.polygons()
                .flatten()
                .map(|&v| normals.direct().get(v as usize).copied().unwrap_or_default())
                .collect(),
        ),
    }
}
