//! Single-file conversion: one mesh file in, one FBX scene out

use crate::export::ExportRequest;
use crate::import::{self, MeshPart};
use crate::scene::SceneWriter;
use anyhow::{Context, Result};
use fbx_common::NodeId;
use std::path::Path;

/// Convert a mesh file into an FBX scene
///
/// The scene is named after the input's file stem. A single-part file gives
/// one node named `node` (default: the stem); see [`add_parts`] for files
/// holding several parts.
pub fn convert_mesh_file(
    input: &Path,
    node: Option<&str>,
    texture: Option<&str>,
    request: &ExportRequest,
) -> Result<()> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh");

    let parts = import::load_mesh(input)?;

    let mut writer = SceneWriter::new();
    writer.create_scene(stem);
    let base = match node {
        Some(node) => Some(node),
        None if parts.len() == 1 => Some(stem),
        None => None,
    };
    add_parts(&mut writer, &parts, base, texture.unwrap_or(""))
        .with_context(|| format!("Failed to add meshes from {:?}", input))?;
    writer
        .export(request)
        .with_context(|| format!("Failed to write {:?}", request.output_path))?;

    tracing::info!(
        "Converted {:?}: {} node(s), {} vertices, {} triangles",
        input,
        parts.len(),
        parts.iter().map(|p| p.data.positions.len()).sum::<usize>(),
        parts.iter().map(|p| p.data.triangle_count()).sum::<usize>()
    );
    Ok(())
}

/// Add every part of a file as a sibling node sharing one texture
///
/// With a `base` name, a single part is called `base` and several parts
/// `base_0`, `base_1`, ...; without one each part keeps its own name.
pub fn add_parts(
    writer: &mut SceneWriter,
    parts: &[MeshPart],
    base: Option<&str>,
    texture: &str,
) -> Result<Vec<NodeId>> {
    let mut nodes = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let name = match base {
            Some(base) if parts.len() == 1 => base.to_string(),
            Some(base) => format!("{base}_{i}"),
            None => part.name.clone(),
        };
        let node = writer
            .add_mesh_with_material(&name, &part.data.as_buffer(), texture)
            .with_context(|| format!("Failed to add mesh {:?}", name))?;
        nodes.push(node);
    }
    Ok(nodes)
}
