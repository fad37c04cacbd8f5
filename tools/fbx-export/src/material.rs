//! Material and texture naming and construction

use crate::builder::UV_SET_NAME;
use fbx_common::{MappingType, Material, MaterialUse, ShadingModel, Texture, TextureUse};
use glam::DVec3;

/// Material name used when no texture path is given
pub const PLACEHOLDER_MATERIAL: &str = "Mat";

/// Texture name used when a texture path has no usable file stem
pub const PLACEHOLDER_TEXTURE: &str = "Tex";

/// Names and texture path for one mesh node's shading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialBinding {
    pub material_name: String,
    pub texture: Option<TextureBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub name: String,
    pub path: String,
}

impl MaterialBinding {
    /// Derive names from a texture path. An empty path means no texture.
    ///
    /// `"tex/wood.png"` gives material `wood_mat` and texture `wood_tex`.
    pub fn from_texture_path(path: &str) -> Self {
        if path.is_empty() {
            return Self {
                material_name: PLACEHOLDER_MATERIAL.to_string(),
                texture: None,
            };
        }

        let (material_name, texture_name) = match texture_base_name(path) {
            Some(base) => (format!("{base}_mat"), format!("{base}_tex")),
            None => (PLACEHOLDER_MATERIAL.to_string(), PLACEHOLDER_TEXTURE.to_string()),
        };

        Self {
            material_name,
            texture: Some(TextureBinding {
                name: texture_name,
                path: path.to_string(),
            }),
        }
    }

    /// Detached material plus optional texture. The caller connects the texture
    /// to [`Material::DIFFUSE`] once it has a handle for it.
    pub fn build(&self, has_uvs: bool) -> (Material, Option<Texture>) {
        let mut material = Material::new(&self.material_name, ShadingModel::Phong);
        material.set_diffuse(DVec3::ONE);
        material.set_diffuse_factor(1.0);

        let texture = self.texture.as_ref().map(|binding| {
            let mut texture = Texture::new(&binding.name);
            texture.set_file_name(&binding.path);
            texture.set_texture_use(TextureUse::Standard);
            texture.set_mapping_type(MappingType::Uv);
            texture.set_material_use(MaterialUse::ModelMaterial);
            if has_uvs {
                texture.set_uv_set(UV_SET_NAME);
            }
            texture
        });

        (material, texture)
    }
}

/// File name of `path` without its extension
///
/// Both `/` and `\` separate directories, whatever the host platform.
pub fn texture_base_name(path: &str) -> Option<&str> {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = match file.rfind('.') {
        Some(0) | None => file,
        Some(dot) => &file[..dot],
    };
    Some(stem).filter(|s| !s.is_empty())
}
