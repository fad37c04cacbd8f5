//! Scene document: an arena owning every node, mesh, material and texture
//!
//! Objects are added by value and referenced afterwards through the typed
//! handles in [`crate::ids`]. Nothing is shared between scenes; dropping a
//! [`Scene`] tears down everything it owns.

use crate::error::SceneError;
use crate::ids::{MaterialId, MeshId, NodeId, TextureId};
use crate::material::{Material, Texture};
use crate::mesh::Mesh;

/// Largest arena size addressable by a `u32` handle
const ARENA_LIMIT: usize = u32::MAX as usize;

/// Length unit of the scene, stored as its size in centimeters (FBX convention)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemUnit {
    scale_factor: f64,
}

impl SystemUnit {
    pub const MM: SystemUnit = SystemUnit { scale_factor: 0.1 };
    pub const CM: SystemUnit = SystemUnit { scale_factor: 1.0 };
    pub const DM: SystemUnit = SystemUnit { scale_factor: 10.0 };
    pub const M: SystemUnit = SystemUnit { scale_factor: 100.0 };
    pub const KM: SystemUnit = SystemUnit { scale_factor: 100_000.0 };
    pub const INCH: SystemUnit = SystemUnit { scale_factor: 2.54 };
    pub const FOOT: SystemUnit = SystemUnit { scale_factor: 30.48 };

    /// Size of one unit in centimeters
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}

impl Default for SystemUnit {
    fn default() -> Self {
        SystemUnit::CM
    }
}

/// One signed coordinate axis: axis index (0 = X, 1 = Y, 2 = Z) and sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedAxis {
    pub axis: i32,
    pub sign: i32,
}

impl SignedAxis {
    const fn new(axis: i32, sign: i32) -> Self {
        Self { axis, sign }
    }
}

/// Handedness and orientation of the scene's coordinate frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSystem {
    pub up: SignedAxis,
    pub front: SignedAxis,
    pub coord: SignedAxis,
}

impl AxisSystem {
    /// Right-handed, Y up (Maya, Motion Builder default)
    pub const MAYA_Y_UP: AxisSystem = AxisSystem {
        up: SignedAxis::new(1, 1),
        front: SignedAxis::new(2, 1),
        coord: SignedAxis::new(0, 1),
    };

    /// Right-handed, Z up
    pub const MAYA_Z_UP: AxisSystem = AxisSystem {
        up: SignedAxis::new(2, 1),
        front: SignedAxis::new(1, -1),
        coord: SignedAxis::new(0, 1),
    };

    /// Right-handed, Z up, parity odd (3ds Max)
    pub const MAX: AxisSystem = AxisSystem {
        up: SignedAxis::new(2, 1),
        front: SignedAxis::new(1, -1),
        coord: SignedAxis::new(0, 1),
    };

    /// Right-handed, Y up (OpenGL)
    pub const OPEN_GL: AxisSystem = AxisSystem::MAYA_Y_UP;
}

impl Default for AxisSystem {
    fn default() -> Self {
        AxisSystem::MAYA_Y_UP
    }
}

/// Scene-wide settings written to the FBX `GlobalSettings` section
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalSettings {
    system_unit: SystemUnit,
    axis_system: AxisSystem,
}

impl GlobalSettings {
    pub fn system_unit(&self) -> SystemUnit {
        self.system_unit
    }

    pub fn set_system_unit(&mut self, unit: SystemUnit) {
        self.system_unit = unit;
    }

    pub fn axis_system(&self) -> AxisSystem {
        self.axis_system
    }

    pub fn set_axis_system(&mut self, axis: AxisSystem) {
        self.axis_system = axis;
    }
}

/// Scene graph node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    name: String,
    mesh: Option<MeshId>,
    materials: Vec<MaterialId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mesh attribute of this node, if any
    pub fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    /// Attach a mesh as this node's attribute, replacing any previous one
    pub fn set_node_attribute(&mut self, mesh: MeshId) {
        self.mesh = Some(mesh);
    }

    pub fn materials(&self) -> &[MaterialId] {
        &self.materials
    }

    pub fn add_material(&mut self, material: MaterialId) {
        self.materials.push(material);
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Scene document
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    name: String,
    global_settings: GlobalSettings,
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
}

impl Scene {
    /// Create a scene containing only its root node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            global_settings: GlobalSettings::default(),
            nodes: vec![Node::new("RootNode")],
            meshes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn global_settings(&self) -> &GlobalSettings {
        &self.global_settings
    }

    pub fn global_settings_mut(&mut self) -> &mut GlobalSettings {
        &mut self.global_settings
    }

    pub fn root_node(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a detached node; link it with [`Scene::add_child`]
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, SceneError> {
        push_slot(&mut self.nodes, node, NodeId::KIND).map(NodeId)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> Result<MeshId, SceneError> {
        push_slot(&mut self.meshes, mesh, MeshId::KIND).map(MeshId)
    }

    pub fn add_material(&mut self, material: Material) -> Result<MaterialId, SceneError> {
        push_slot(&mut self.materials, material, MaterialId::KIND).map(MaterialId)
    }

    pub fn add_texture(&mut self, texture: Texture) -> Result<TextureId, SceneError> {
        push_slot(&mut self.textures, texture, TextureId::KIND).map(TextureId)
    }

    /// Append `child` to `parent`'s child list
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if child.index() >= self.nodes.len() {
            return Err(SceneError::InvalidHandle(child.to_string()));
        }
        if child == self.root_node() || child == parent {
            return Err(SceneError::InvalidHandle(format!(
                "{child} cannot be parented under {parent}"
            )));
        }
        let parent_node = self
            .nodes
            .get_mut(parent.index())
            .ok_or_else(|| SceneError::InvalidHandle(parent.to_string()))?;
        parent_node.children.push(child);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.index())
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.index())
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.index())
    }

    /// All nodes, root first
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes
            .iter()
            .enumerate()
            .map(|(i, m)| (MeshId(i as u32), m))
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i as u32), m))
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureId, &Texture)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(i, t)| (TextureId(i as u32), t))
    }

    /// Number of nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Record the current arena sizes
    pub fn checkpoint(&self) -> SceneCheckpoint {
        SceneCheckpoint {
            nodes: self.nodes.len(),
            meshes: self.meshes.len(),
            materials: self.materials.len(),
            textures: self.textures.len(),
        }
    }

    /// Drop every object added since `checkpoint`, along with child links to
    /// dropped nodes. Handles issued after the checkpoint become dead.
    pub fn rollback(&mut self, checkpoint: SceneCheckpoint) {
        // The root survives any rollback
        let nodes = checkpoint.nodes.max(1);
        self.nodes.truncate(nodes);
        self.meshes.truncate(checkpoint.meshes);
        self.materials.truncate(checkpoint.materials);
        self.textures.truncate(checkpoint.textures);
        for node in &mut self.nodes {
            node.children.retain(|c| c.index() < nodes);
        }
    }

    /// Parent of every node reachable from the root, indexed by node slot
    pub fn parents(&self) -> Vec<Option<NodeId>> {
        let mut parents = vec![None; self.nodes.len()];
        for (id, node) in self.nodes() {
            for child in node.children() {
                if let Some(slot) = parents.get_mut(child.index()) {
                    *slot = Some(id);
                }
            }
        }
        parents
    }
}

/// Arena sizes captured by [`Scene::checkpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneCheckpoint {
    nodes: usize,
    meshes: usize,
    materials: usize,
    textures: usize,
}

fn push_slot<T>(arena: &mut Vec<T>, value: T, kind: &'static str) -> Result<u32, SceneError> {
    let index = arena.len();
    if index >= ARENA_LIMIT {
        return Err(SceneError::ArenaFull { kind, count: index });
    }
    arena.push(value);
    Ok(index as u32)
}
