//! Surface materials and file textures

use crate::error::SceneError;
use crate::ids::TextureId;
use glam::DVec3;

/// Lighting model written to the material's `ShadingModel` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingModel {
    #[default]
    Phong,
    Lambert,
}

impl ShadingModel {
    pub fn fbx_name(self) -> &'static str {
        match self {
            ShadingModel::Phong => "phong",
            ShadingModel::Lambert => "lambert",
        }
    }
}

/// Non-PBR surface material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    shading_model: ShadingModel,
    diffuse: DVec3,
    diffuse_factor: f64,
    /// Texture sources connected to named properties
    connections: Vec<(&'static str, TextureId)>,
}

impl Material {
    /// Diffuse color property, the target of diffuse texture connections
    pub const DIFFUSE: &'static str = "DiffuseColor";
    pub const DIFFUSE_FACTOR: &'static str = "DiffuseFactor";

    const PROPERTIES: [&'static str; 2] = [Self::DIFFUSE, Self::DIFFUSE_FACTOR];

    pub fn new(name: impl Into<String>, shading_model: ShadingModel) -> Self {
        Self {
            name: name.into(),
            shading_model,
            diffuse: DVec3::splat(0.8),
            diffuse_factor: 1.0,
            connections: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shading_model(&self) -> ShadingModel {
        self.shading_model
    }

    pub fn diffuse(&self) -> DVec3 {
        self.diffuse
    }

    /// Set the diffuse color; components are clamped to 0..=1
    pub fn set_diffuse(&mut self, color: DVec3) {
        self.diffuse = color.clamp(DVec3::ZERO, DVec3::ONE);
    }

    pub fn diffuse_factor(&self) -> f64 {
        self.diffuse_factor
    }

    /// Set the diffuse factor, clamped to 0..=1
    pub fn set_diffuse_factor(&mut self, factor: f64) {
        self.diffuse_factor = factor.clamp(0.0, 1.0);
    }

    /// Resolve a property name to its canonical static form
    pub fn find_property(&self, name: &str) -> Option<&'static str> {
        Self::PROPERTIES.iter().copied().find(|p| *p == name)
    }

    /// Connect a texture as a source of the named property
    pub fn connect_texture(&mut self, property: &str, texture: TextureId) -> Result<(), SceneError> {
        let property = self
            .find_property(property)
            .ok_or_else(|| SceneError::UnknownProperty {
                material: self.name.clone(),
                property: property.to_string(),
            })?;
        self.connections.push((property, texture));
        Ok(())
    }

    /// Texture connections as (property, texture) pairs
    pub fn connections(&self) -> &[(&'static str, TextureId)] {
        &self.connections
    }

    /// First texture connected to the named property
    pub fn connected_texture(&self, property: &str) -> Option<TextureId> {
        self.connections
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, t)| *t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureUse {
    #[default]
    Standard,
    ShadowMap,
    LightMap,
}

impl TextureUse {
    pub fn fbx_value(self) -> i32 {
        match self {
            TextureUse::Standard => 0,
            TextureUse::ShadowMap => 1,
            TextureUse::LightMap => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingType {
    Null,
    Planar,
    Spherical,
    Cylindrical,
    Box,
    Face,
    #[default]
    Uv,
}

impl MappingType {
    pub fn fbx_value(self) -> i32 {
        match self {
            MappingType::Null => 0,
            MappingType::Planar => 1,
            MappingType::Spherical => 2,
            MappingType::Cylindrical => 3,
            MappingType::Box => 4,
            MappingType::Face => 5,
            MappingType::Uv => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialUse {
    #[default]
    ModelMaterial,
    DefaultMaterial,
}

impl MaterialUse {
    pub fn fbx_value(self) -> i32 {
        match self {
            MaterialUse::ModelMaterial => 0,
            MaterialUse::DefaultMaterial => 1,
        }
    }
}

/// Texture backed by an image file on disk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    name: String,
    file_name: String,
    texture_use: TextureUse,
    mapping_type: MappingType,
    material_use: MaterialUse,
    uv_set: Option<String>,
}

impl Texture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = file_name.into();
    }

    pub fn texture_use(&self) -> TextureUse {
        self.texture_use
    }

    pub fn set_texture_use(&mut self, texture_use: TextureUse) {
        self.texture_use = texture_use;
    }

    pub fn mapping_type(&self) -> MappingType {
        self.mapping_type
    }

    pub fn set_mapping_type(&mut self, mapping_type: MappingType) {
        self.mapping_type = mapping_type;
    }

    pub fn material_use(&self) -> MaterialUse {
        self.material_use
    }

    pub fn set_material_use(&mut self, material_use: MaterialUse) {
        self.material_use = material_use;
    }

    /// UV set sampled by this texture, if any
    pub fn uv_set(&self) -> Option<&str> {
        self.uv_set.as_deref()
    }

    pub fn set_uv_set(&mut self, uv_set: impl Into<String>) {
        self.uv_set = Some(uv_set.into());
    }
}
