//! Scene assembly: one current scene, meshes appended under its root

use crate::buffer::{adapt, GeometryBuffer};
use crate::builder::build_mesh;
use crate::error::{ExportError, Result};
use crate::export::{export_scene, ExportRequest};
use crate::material::MaterialBinding;
use fbx_common::{AxisSystem, Manager, Material, Mesh, Node, NodeId, Scene, SystemUnit, Texture};

/// Unit of every scene this writer creates
pub const SCENE_UNIT: SystemUnit = SystemUnit::M;

/// Axis convention of every scene this writer creates
pub const SCENE_AXIS: AxisSystem = AxisSystem::MAYA_Y_UP;

/// Owns the writer manager and the current scene
///
/// ```no_run
/// use fbx_export::{Attribute, ExportRequest, GeometryBuffer, SceneWriter};
///
/// let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
/// let uvs = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
/// let buffer = GeometryBuffer::new(&positions, &[0, 1, 2]).with_uvs(Attribute::per_vertex(&uvs));
///
/// let mut writer = SceneWriter::new();
/// writer.create_scene("Stage");
/// writer.add_mesh_with_material("tri", &buffer, "tex/wood.png")?;
/// writer.export(&ExportRequest::new("stage.fbx"))?;
/// # Ok::<(), fbx_export::ExportError>(())
/// ```
#[derive(Debug, Default)]
pub struct SceneWriter {
    manager: Manager,
    scene: Option<Scene>,
}

impl SceneWriter {
    /// Writer with the default binary and ASCII formats registered
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manager(manager: Manager) -> Self {
        Self {
            manager,
            scene: None,
        }
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Replace the current scene with an empty one
    ///
    /// The previous scene and everything it owns is dropped, so handles it
    /// issued are dead from here on.
    pub fn create_scene(&mut self, name: &str) {
        let mut scene = Scene::new(name);
        let settings = scene.global_settings_mut();
        settings.set_system_unit(SCENE_UNIT);
        settings.set_axis_system(SCENE_AXIS);

        if let Some(old) = self.scene.replace(scene) {
            tracing::debug!(
                "Discarded scene {:?} with {} nodes",
                old.name(),
                old.node_count() - 1
            );
        }
        tracing::debug!("Created scene {:?}", name);
    }

    /// Append one mesh node, with its material and optional texture, under
    /// the scene root
    ///
    /// Either everything is attached or the scene is left exactly as it was.
    pub fn add_mesh_with_material(
        &mut self,
        node_name: &str,
        buffer: &GeometryBuffer<'_>,
        texture_path: &str,
    ) -> Result<NodeId> {
        let scene = self.scene.as_mut().ok_or_else(|| {
            ExportError::PreconditionViolation(format!(
                "cannot add mesh {node_name:?} before a scene is created"
            ))
        })?;

        let layout = adapt(buffer)?;
        let mesh = build_mesh(node_name, buffer, &layout)?;
        let binding = MaterialBinding::from_texture_path(texture_path);
        let (material, texture) = binding.build(layout.uv.is_some());

        let checkpoint = scene.checkpoint();
        let result = commit(scene, node_name, mesh, material, texture);
        if result.is_err() {
            scene.rollback(checkpoint);
        }
        let node = result?;

        tracing::debug!(
            "Added node {:?}: {} vertices, {} triangles, material {:?}",
            node_name,
            layout.vertex_count,
            layout.triangle_count,
            binding.material_name
        );
        Ok(node)
    }

    /// [`add_mesh_with_material`](Self::add_mesh_with_material) over untagged
    /// flat arrays; attribute conventions are inferred from array lengths
    pub fn add_mesh_with_material_flat(
        &mut self,
        node_name: &str,
        positions: &[f32],
        indices: &[i32],
        uvs: Option<&[f32]>,
        normals: Option<&[f32]>,
        texture_path: &str,
    ) -> Result<NodeId> {
        if self.scene.is_none() {
            return Err(ExportError::PreconditionViolation(format!(
                "cannot add mesh {node_name:?} before a scene is created"
            )));
        }
        let buffer = GeometryBuffer::from_flat(positions, indices, uvs, normals)?;
        self.add_mesh_with_material(node_name, &buffer, texture_path)
    }

    /// Write the current scene
    pub fn export(&self, request: &ExportRequest) -> Result<()> {
        let scene = self.scene.as_ref().ok_or_else(|| {
            ExportError::PreconditionViolation("cannot export before a scene is created".to_string())
        })?;
        export_scene(&self.manager, scene, request)
    }
}

/// Move the detached objects into the scene and link the node under the root
fn commit(
    scene: &mut Scene,
    node_name: &str,
    mesh: Mesh,
    mut material: Material,
    texture: Option<Texture>,
) -> Result<NodeId> {
    if let Some(texture) = texture {
        let texture = scene.add_texture(texture)?;
        material.connect_texture(Material::DIFFUSE, texture)?;
    }
    let mesh = scene.add_mesh(mesh)?;
    let material = scene.add_material(material)?;

    let mut node = Node::new(node_name);
    node.set_node_attribute(mesh);
    node.add_material(material);
    let node = scene.add_node(node)?;
    scene.add_child(scene.root_node(), node)?;
    Ok(node)
}
