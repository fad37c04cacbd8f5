//! Geometry input buffers and their validation
//!
//! Callers hand over positions, triangle indices and optional UV / normal
//! arrays. Every attribute carries an [`IndexingConvention`] tag saying how
//! its entries are addressed:
//!
//! - `PerCorner`: one entry per triangle corner, `len == indices.len()`
//! - `PerVertex`: one entry per position, `len == positions.len()`
//!
//! [`adapt`] checks the whole buffer and returns the [`BufferLayout`] the mesh
//! builder works from.
//!
//! [`GeometryBuffer::from_flat`] accepts untagged flat `f32`/`i32` arrays and
//! infers each tag from the array length alone:
//!
//! - shorter than both sizings: the attribute is absent
//! - exactly one entry per corner (and not per vertex): `PerCorner`
//! - otherwise at least one entry per vertex: `PerVertex`
//! - otherwise at least one entry per corner: `PerCorner`
//!
//! Trailing entries past the chosen sizing are ignored. When both sizings are
//! equal (`indices.len() == positions.len()`) the indices must be the identity
//! permutation, in which case both readings give the same mesh and `PerVertex`
//! is recorded; any other index order is rejected as ambiguous.

use crate::error::{ExportError, Result};

/// Largest element count addressable by the 32-bit signed indices FBX stores
const MAX_FBX_ELEMENTS: usize = i32::MAX as usize;

/// How an attribute array is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexingConvention {
    /// One value per triangle corner, in index order
    PerCorner,
    /// One value per position, looked up through the triangle indices
    PerVertex,
}

impl IndexingConvention {
    /// Number of values an attribute in this convention must hold
    pub fn expected_len(self, vertex_count: usize, corner_count: usize) -> usize {
        match self {
            IndexingConvention::PerCorner => corner_count,
            IndexingConvention::PerVertex => vertex_count,
        }
    }
}

/// An attribute array tagged with its addressing convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribute<'a, T> {
    pub values: &'a [T],
    pub convention: IndexingConvention,
}

impl<'a, T> Attribute<'a, T> {
    pub fn per_corner(values: &'a [T]) -> Self {
        Self {
            values,
            convention: IndexingConvention::PerCorner,
        }
    }

    pub fn per_vertex(values: &'a [T]) -> Self {
        Self {
            values,
            convention: IndexingConvention::PerVertex,
        }
    }

    /// Value addressed by `corner`, given the triangle index list
    pub fn at_corner(&self, corner: usize, indices: &[u32]) -> Option<&'a T> {
        match self.convention {
            IndexingConvention::PerCorner => self.values.get(corner),
            IndexingConvention::PerVertex => indices
                .get(corner)
                .and_then(|&i| self.values.get(i as usize)),
        }
    }
}

/// Immutable view over one mesh's input arrays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryBuffer<'a> {
    pub positions: &'a [[f32; 3]],
    /// Triangle list, three corners per triangle
    pub indices: &'a [u32],
    pub uvs: Option<Attribute<'a, [f32; 2]>>,
    pub normals: Option<Attribute<'a, [f32; 3]>>,
}

impl<'a> GeometryBuffer<'a> {
    pub fn new(positions: &'a [[f32; 3]], indices: &'a [u32]) -> Self {
        Self {
            positions,
            indices,
            uvs: None,
            normals: None,
        }
    }

    pub fn with_uvs(mut self, uvs: Attribute<'a, [f32; 2]>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    pub fn with_normals(mut self, normals: Attribute<'a, [f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Interpret untagged flat arrays (xyz triples, int indices, uv pairs)
    pub fn from_flat(
        positions: &'a [f32],
        indices: &'a [i32],
        uvs: Option<&'a [f32]>,
        normals: Option<&'a [f32]>,
    ) -> Result<Self> {
        let positions: &[[f32; 3]] = bytemuck::try_cast_slice(positions).map_err(|_| {
            ExportError::geometry(format!(
                "position array has {} floats, not a multiple of 3",
                positions.len()
            ))
        })?;

        if let Some(at) = indices.iter().position(|&i| i < 0) {
            return Err(ExportError::geometry(format!(
                "index {} at position {at} is negative",
                indices[at]
            )));
        }
        let indices: &[u32] = bytemuck::cast_slice(indices);

        let mut buffer = Self::new(positions, indices);

        if let Some(uvs) = uvs {
            let uvs: &[[f32; 2]] = bytemuck::cast_slice(whole_tuples(uvs, 2));
            buffer.uvs = infer_attribute("UV", uvs, positions.len(), indices)?;
        }
        if let Some(normals) = normals {
            let normals: &[[f32; 3]] = bytemuck::cast_slice(whole_tuples(normals, 3));
            buffer.normals = infer_attribute("normal", normals, positions.len(), indices)?;
        }

        Ok(buffer)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn corner_count(&self) -> usize {
        self.indices.len()
    }
}

/// Validated shape of a [`GeometryBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Convention of the UV attribute, `None` when absent
    pub uv: Option<IndexingConvention>,
    /// Convention of the normal attribute, `None` when absent
    pub normal: Option<IndexingConvention>,
}

impl BufferLayout {
    pub fn corner_count(&self) -> usize {
        self.triangle_count * 3
    }
}

/// Validate a buffer and classify its attributes
///
/// Empty attribute arrays count as absent.
pub fn adapt(buffer: &GeometryBuffer<'_>) -> Result<BufferLayout> {
    let vertex_count = buffer.positions.len();
    let corner_count = buffer.indices.len();

    if vertex_count == 0 {
        return Err(ExportError::geometry("mesh has no positions"));
    }
    if corner_count == 0 {
        return Err(ExportError::geometry("mesh has no triangles"));
    }
    if corner_count % 3 != 0 {
        return Err(ExportError::geometry(format!(
            "index count {corner_count} is not a multiple of 3"
        )));
    }
    if vertex_count > MAX_FBX_ELEMENTS || corner_count > MAX_FBX_ELEMENTS {
        return Err(ExportError::geometry(format!(
            "{vertex_count} positions / {corner_count} indices exceed the FBX index range"
        )));
    }
    if let Some((at, &index)) = buffer
        .indices
        .iter()
        .enumerate()
        .find(|&(_, &i)| i as usize >= vertex_count)
    {
        return Err(ExportError::geometry(format!(
            "index {index} at position {at} is out of range for {vertex_count} positions"
        )));
    }

    check_finite("position", buffer.positions.as_flattened())?;
    if let Some(uvs) = buffer.uvs {
        check_finite("UV", uvs.values.as_flattened())?;
    }
    if let Some(normals) = buffer.normals {
        check_finite("normal", normals.values.as_flattened())?;
    }

    let uv = buffer
        .uvs
        .filter(|a| !a.values.is_empty())
        .map(|a| check_attribute("UV", a.values.len(), a.convention, vertex_count, corner_count))
        .transpose()?;
    let normal = buffer
        .normals
        .filter(|a| !a.values.is_empty())
        .map(|a| check_attribute("normal", a.values.len(), a.convention, vertex_count, corner_count))
        .transpose()?;

    Ok(BufferLayout {
        vertex_count,
        triangle_count: corner_count / 3,
        uv,
        normal,
    })
}

fn check_finite(what: &str, values: &[f32]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(at) => Err(ExportError::geometry(format!(
            "{what} component {at} is {}, not a finite number",
            values[at]
        ))),
        None => Ok(()),
    }
}

fn check_attribute(
    what: &str,
    len: usize,
    convention: IndexingConvention,
    vertex_count: usize,
    corner_count: usize,
) -> Result<IndexingConvention> {
    let expected = convention.expected_len(vertex_count, corner_count);
    if len != expected {
        return Err(ExportError::geometry(format!(
            "{what} attribute is tagged {convention:?} and needs {expected} values, got {len}"
        )));
    }
    Ok(convention)
}

/// Drop a trailing partial tuple from a flat float array
fn whole_tuples(values: &[f32], width: usize) -> &[f32] {
    &values[..values.len() - values.len() % width]
}

/// Tag an untagged attribute from its length, trimmed to the chosen sizing
fn infer_attribute<'a, T>(
    what: &str,
    values: &'a [T],
    vertex_count: usize,
    indices: &[u32],
) -> Result<Option<Attribute<'a, T>>> {
    let Some(convention) = infer_convention(what, values.len(), vertex_count, indices)? else {
        if !values.is_empty() {
            tracing::debug!(
                "{what} array of {} values is shorter than {} corners and {vertex_count} vertices; ignoring it",
                values.len(),
                indices.len()
            );
        }
        return Ok(None);
    };
    let expected = convention.expected_len(vertex_count, indices.len());
    Ok(Some(Attribute {
        values: &values[..expected],
        convention,
    }))
}

/// Pick the convention of an untagged attribute from its length
///
/// `None` means the array is too short for either sizing.
fn infer_convention(
    what: &str,
    len: usize,
    vertex_count: usize,
    indices: &[u32],
) -> Result<Option<IndexingConvention>> {
    let corner_count = indices.len();
    let fits_corner = len >= corner_count;
    let fits_vertex = len >= vertex_count;

    if !fits_corner && !fits_vertex {
        return Ok(None);
    }
    if corner_count == vertex_count {
        if is_identity(indices) {
            return Ok(Some(IndexingConvention::PerVertex));
        }
        return Err(ExportError::geometry(format!(
            "{what} array of {len} values fits both one-per-corner and one-per-vertex; \
             tag the attribute explicitly"
        )));
    }
    if len == corner_count || !fits_vertex {
        return Ok(Some(IndexingConvention::PerCorner));
    }
    Ok(Some(IndexingConvention::PerVertex))
}

fn is_identity(indices: &[u32]) -> bool {
    indices.iter().enumerate().all(|(i, &v)| v as usize == i)
}
