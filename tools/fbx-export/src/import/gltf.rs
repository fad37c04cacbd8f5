//! glTF/GLB reader: every triangle primitive of every mesh

use super::{MeshData, MeshPart};
use crate::buffer::IndexingConvention;
use anyhow::{Context, Result};
use std::path::Path;

/// Load a glTF or GLB file, one part per triangle primitive
///
/// Parts are named `<mesh>_<n>` with `n` the primitive index; an unnamed mesh
/// is called `mesh<i>`. Positions, `TEXCOORD_0` and `NORMAL` are read as
/// per-vertex data. A primitive without an index accessor is treated as a
/// plain triangle list. Primitives in other modes are skipped with a warning.
pub fn load_gltf(input: &Path) -> Result<Vec<MeshPart>> {
    let (document, buffers, _images) =
        ::gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let mut parts = Vec::new();
    for mesh in document.meshes() {
        let mesh_name = mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));

        for primitive in mesh.primitives() {
            let name = format!("{}_{}", mesh_name, primitive.index());
            if primitive.mode() != ::gltf::mesh::Mode::Triangles {
                tracing::warn!(
                    "Skipping primitive {} of {:?}: mode {:?} is not a triangle list",
                    name,
                    input,
                    primitive.mode()
                );
                continue;
            }
            let data = read_primitive(&primitive, &buffers)
                .with_context(|| format!("Failed to read primitive {}", name))?;
            tracing::debug!(
                "Loaded glTF primitive {}: {} positions, {} triangles, uvs={}, normals={}",
                name,
                data.positions.len(),
                data.triangle_count(),
                data.uvs.is_some(),
                data.normals.is_some()
            );
            parts.push(MeshPart { name, data });
        }
    }

    if parts.is_empty() {
        anyhow::bail!("No triangle primitives found in glTF: {:?}", input);
    }
    Ok(parts)
}

fn read_primitive(primitive: &::gltf::Primitive<'_>, buffers: &[::gltf::buffer::Data]) -> Result<MeshData> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("No positions in primitive")?
        .collect();

    let uvs: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().collect());

    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|iter| iter.collect());

    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => {
            let count = u32::try_from(positions.len())
                .context("Too many vertices for an unindexed primitive")?;
            (0..count).collect()
        }
    };

    Ok(MeshData {
        positions,
        indices,
        uvs: uvs.map(|v| (v, IndexingConvention::PerVertex)),
        normals: normals.map(|v| (v, IndexingConvention::PerVertex)),
    })
}
