//! Indexed polygon mesh with per-layer attribute elements
//!
//! A [`Mesh`] stores unique control points plus polygons that reference them by
//! index. Per-vertex data (UVs, normals) lives in [`LayerElement`]s attached to
//! a [`Layer`]; each element records how its values are addressed.

use glam::{DVec2, DVec3};
use std::fmt;

/// How an attribute element's values map onto the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    /// One value per control point, shared by every corner that uses it
    ByControlPoint,
    /// One value per polygon corner, in polygon order
    ByPolygonVertex,
}

impl MappingMode {
    /// Name used by the FBX `MappingInformationType` field
    pub fn fbx_name(self) -> &'static str {
        match self {
            MappingMode::ByControlPoint => "ByVertice",
            MappingMode::ByPolygonVertex => "ByPolygonVertex",
        }
    }
}

/// How an attribute element's values are referenced
///
/// Only direct storage is produced: values are stored inline per addressed
/// element with no secondary index table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceMode {
    #[default]
    Direct,
}

impl ReferenceMode {
    /// Name used by the FBX `ReferenceInformationType` field
    pub fn fbx_name(self) -> &'static str {
        match self {
            ReferenceMode::Direct => "Direct",
        }
    }
}

/// A named attribute channel with a mapping mode and a direct value array
#[derive(Debug, Clone, PartialEq)]
pub struct LayerElement<T> {
    name: String,
    mapping: MappingMode,
    reference: ReferenceMode,
    direct: Vec<T>,
}

impl<T: Copy + Default> LayerElement<T> {
    pub fn new(name: impl Into<String>, mapping: MappingMode) -> Self {
        Self {
            name: name.into(),
            mapping,
            reference: ReferenceMode::Direct,
            direct: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mapping_mode(&self) -> MappingMode {
        self.mapping
    }

    pub fn set_mapping_mode(&mut self, mapping: MappingMode) {
        self.mapping = mapping;
    }

    pub fn reference_mode(&self) -> ReferenceMode {
        self.reference
    }

    pub fn set_reference_mode(&mut self, reference: ReferenceMode) {
        self.reference = reference;
    }

    /// Resize the direct array, filling new slots with the default value
    pub fn set_count(&mut self, count: usize) {
        self.direct.resize(count, T::default());
    }

    /// Store a value at `index`. Returns `false` when the index is past the
    /// current count.
    pub fn set_at(&mut self, index: usize, value: T) -> bool {
        match self.direct.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, value: T) {
        self.direct.push(value);
    }

    pub fn direct(&self) -> &[T] {
        &self.direct
    }

    pub fn len(&self) -> usize {
        self.direct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty()
    }
}

pub type UvElement = LayerElement<DVec2>;
pub type NormalElement = LayerElement<DVec3>;

/// One attribute layer: at most one UV and one normal channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    uvs: Option<UvElement>,
    normals: Option<NormalElement>,
}

impl Layer {
    pub fn uvs(&self) -> Option<&UvElement> {
        self.uvs.as_ref()
    }

    pub fn set_uvs(&mut self, uvs: UvElement) {
        self.uvs = Some(uvs);
    }

    pub fn normals(&self) -> Option<&NormalElement> {
        self.normals.as_ref()
    }

    pub fn set_normals(&mut self, normals: NormalElement) {
        self.normals = Some(normals);
    }
}

/// An attribute element whose stored length disagrees with its mapping mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerMismatch {
    pub layer: usize,
    pub element: &'static str,
    pub mapping: MappingMode,
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for LayerMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layer {} {} element is mapped {:?} and needs {} values, but stores {}",
            self.layer, self.element, self.mapping, self.expected, self.actual
        )
    }
}

/// Indexed polygon mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    name: String,
    control_points: Vec<DVec3>,
    /// Control point index for every polygon corner, in polygon order
    polygon_vertices: Vec<u32>,
    /// Offset of each polygon's first corner in `polygon_vertices`
    polygon_starts: Vec<usize>,
    open_polygon: Option<usize>,
    layers: Vec<Layer>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocate `count` control points at the origin, discarding existing ones
    pub fn init_control_points(&mut self, count: usize) {
        self.control_points.clear();
        self.control_points.resize(count, DVec3::ZERO);
    }

    /// Set control point `index`. Returns `false` when the index is out of range.
    pub fn set_control_point_at(&mut self, point: DVec3, index: usize) -> bool {
        match self.control_points.get_mut(index) {
            Some(slot) => {
                *slot = point;
                true
            }
            None => false,
        }
    }

    pub fn control_points(&self) -> &[DVec3] {
        &self.control_points
    }

    pub fn control_points_count(&self) -> usize {
        self.control_points.len()
    }

    /// Start a new polygon. An unterminated previous polygon is closed first.
    pub fn begin_polygon(&mut self) {
        if self.open_polygon.is_some() {
            self.end_polygon();
        }
        self.open_polygon = Some(self.polygon_vertices.len());
    }

    /// Append a corner to the open polygon
    pub fn add_polygon(&mut self, control_point: u32) {
        if self.open_polygon.is_none() {
            self.begin_polygon();
        }
        self.polygon_vertices.push(control_point);
    }

    /// Close the open polygon. Polygons without corners are dropped.
    pub fn end_polygon(&mut self) {
        if let Some(start) = self.open_polygon.take() {
            if self.polygon_vertices.len() > start {
                self.polygon_starts.push(start);
            }
        }
    }

    pub fn polygon_count(&self) -> usize {
        self.polygon_starts.len()
    }

    /// Total number of polygon corners across all closed polygons
    pub fn polygon_vertex_count(&self) -> usize {
        self.open_polygon.unwrap_or(self.polygon_vertices.len())
    }

    /// Corners of polygon `polygon`, as control point indices
    pub fn polygon_vertices(&self, polygon: usize) -> Option<&[u32]> {
        let start = *self.polygon_starts.get(polygon)?;
        let end = self
            .polygon_starts
            .get(polygon + 1)
            .copied()
            .unwrap_or_else(|| self.polygon_vertex_count());
        Some(&self.polygon_vertices[start..end])
    }

    /// Iterate polygons in emission order
    pub fn polygons(&self) -> impl Iterator<Item = &[u32]> + '_ {
        (0..self.polygon_count()).filter_map(move |p| self.polygon_vertices(p))
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Append an empty layer and return its index
    pub fn create_layer(&mut self) -> usize {
        self.layers.push(Layer::default());
        self.layers.len() - 1
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Check each element's stored length against its mapping mode
    pub fn validate_layers(&self) -> Result<(), LayerMismatch> {
        let expected_for = |mapping: MappingMode| match mapping {
            MappingMode::ByControlPoint => self.control_points_count(),
            MappingMode::ByPolygonVertex => self.polygon_vertex_count(),
        };

        for (index, layer) in self.layers.iter().enumerate() {
            if let Some(uvs) = layer.uvs() {
                let expected = expected_for(uvs.mapping_mode());
                if uvs.len() != expected {
                    return Err(LayerMismatch {
                        layer: index,
                        element: "UV",
                        mapping: uvs.mapping_mode(),
                        expected,
                        actual: uvs.len(),
                    });
                }
            }
            if let Some(normals) = layer.normals() {
                let expected = expected_for(normals.mapping_mode());
                if normals.len() != expected {
                    return Err(LayerMismatch {
                        layer: index,
                        element: "normal",
                        mapping: normals.mapping_mode(),
                        expected,
                        actual: normals.len(),
                    });
                }
            }
        }
        Ok(())
    }
}
