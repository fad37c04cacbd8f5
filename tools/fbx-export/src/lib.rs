//! fbx-export library
//!
//! Binds flat geometry buffers (positions, triangle indices, optional UVs and
//! normals) into an FBX scene and writes it as binary or ASCII FBX.
//!
//! - [`buffer`] - Input validation and indexing conventions
//! - [`builder`] - Indexed mesh and attribute layer construction
//! - [`material`] - Material/texture naming and binding
//! - [`scene`] - [`SceneWriter`], the current scene and its assembly
//! - [`export`] - Writer format selection and serialization
//! - [`import`], [`manifest`], [`batch`] - File-based tooling used by the CLI

pub mod batch;
pub mod buffer;
pub mod builder;
pub mod convert;
pub mod error;
pub mod export;
pub mod import;
pub mod manifest;
pub mod material;
pub mod scene;

pub use buffer::{adapt, Attribute, BufferLayout, GeometryBuffer, IndexingConvention};
pub use builder::{build_mesh, UV_SET_NAME};
pub use error::ExportError;
pub use export::{export_scene, select_writer_format, ExportRequest};
pub use material::{MaterialBinding, PLACEHOLDER_MATERIAL};
pub use scene::SceneWriter;

// Re-export the scene graph so callers need only one dependency
pub use fbx_common;
