//! Mesh loading from OBJ and glTF/GLB files

mod gltf;
mod obj;

pub use self::gltf::load_gltf;
pub use self::obj::{load_obj, parse_obj};

use crate::buffer::{Attribute, GeometryBuffer, IndexingConvention};
use anyhow::{bail, Result};
use std::path::Path;

/// File extensions [`load_mesh`] understands (lowercase)
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["obj", "gltf", "glb"];

/// Owned triangle mesh read from disk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub uvs: Option<(Vec<[f32; 2]>, IndexingConvention)>,
    pub normals: Option<(Vec<[f32; 3]>, IndexingConvention)>,
}

impl MeshData {
    /// Borrow as a tagged geometry buffer
    pub fn as_buffer(&self) -> GeometryBuffer<'_> {
        GeometryBuffer {
            positions: &self.positions,
            indices: &self.indices,
            uvs: self.uvs.as_ref().map(|(values, convention)| Attribute {
                values,
                convention: *convention,
            }),
            normals: self.normals.as_ref().map(|(values, convention)| Attribute {
                values,
                convention: *convention,
            }),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// One named mesh out of a source file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub name: String,
    pub data: MeshData,
}

/// Lowercased extension of `path`, if any
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
}

pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Load every mesh part of a file, picking the reader by file extension
///
/// OBJ files give a single part named after the file stem.
pub fn load_mesh(path: &Path) -> Result<Vec<MeshPart>> {
    match extension(path).as_deref() {
        Some("obj") => {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("mesh")
                .to_string();
            Ok(vec![MeshPart {
                name,
                data: load_obj(path)?,
            }])
        }
        Some("gltf" | "glb") => load_gltf(path),
        _ => bail!(
            "Unsupported mesh format: {:?} (use .obj, .gltf, or .glb)",
            path
        ),
    }
}
