//! Scene graph and FBX 7.4 writers shared by the FBX export tools
//!
//! # Modules
//!
//! - [`scene`] - Arena-owned scene document, nodes and global settings
//! - [`mesh`] - Indexed polygon mesh with attribute layers
//! - [`material`] - Phong/Lambert materials and file textures
//! - [`fbx`] - FBX record tree, binary and ASCII encodings, binary reader
//! - [`io`] - Writer registry, exporter and IO settings

pub mod error;
pub mod fbx;
pub mod ids;
pub mod io;
pub mod material;
pub mod mesh;
pub mod scene;

pub use error::{DecodeError, EncodeError, SceneError};
pub use ids::{MaterialId, MeshId, NodeId, TextureId};
pub use io::{
    ExportStatus, Exporter, FormatEncoder, IoSettings, Manager, WriterFormat, WriterRegistry,
    EXP_FBX_EMBEDDED,
};
pub use material::{Material, MappingType, MaterialUse, ShadingModel, Texture, TextureUse};
pub use mesh::{Layer, LayerElement, LayerMismatch, MappingMode, Mesh, NormalElement, ReferenceMode, UvElement};
pub use scene::{AxisSystem, GlobalSettings, Node, Scene, SceneCheckpoint, SignedAxis, SystemUnit};

// Binary FBX reader, used by tools and tests to verify written files
pub use fbx::binary;
