//! Typed failures of the scene writer

use fbx_common::SceneError;

/// Failure of a [`SceneWriter`](crate::SceneWriter) operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    /// Malformed or inconsistent input buffers
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Operation invoked out of order, e.g. adding a mesh before creating a scene
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// The scene graph could not allocate an object
    #[error("resource creation failed: {0}")]
    ResourceCreationFailure(String),

    /// The writer could not be initialized; carries the writer's diagnostic
    #[error("export initialization failed: {0}")]
    ExportInit(String),

    /// The writer failed while serializing; carries the writer's diagnostic
    #[error("export failed: {0}")]
    ExportWrite(String),
}

impl ExportError {
    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        ExportError::InvalidGeometry(message.into())
    }
}

impl From<SceneError> for ExportError {
    fn from(err: SceneError) -> Self {
        ExportError::ResourceCreationFailure(err.to_string())
    }
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
