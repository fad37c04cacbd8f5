//! Writer format negotiation and scene serialization

use crate::error::{ExportError, Result};
use fbx_common::{Exporter, Manager, Scene, WriterRegistry, EXP_FBX_EMBEDDED};
use std::path::PathBuf;

/// Marker searched for (case-insensitively) in writer descriptions
const TEXT_ENCODING_MARKER: &str = "ascii";

/// One-shot export configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub output_path: PathBuf,
    /// Prefer a text encoding when one is registered
    pub textual: bool,
    /// Pack referenced texture files into the output
    pub embed_textures: bool,
}

impl ExportRequest {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            textual: false,
            embed_textures: false,
        }
    }

    pub fn textual(mut self, textual: bool) -> Self {
        self.textual = textual;
        self
    }

    pub fn embed_textures(mut self, embed: bool) -> Self {
        self.embed_textures = embed;
        self
    }
}

/// Choose the writer format for a request
///
/// Textual requests take the first FBX writer whose description mentions
/// ASCII; everything else, including textual requests no writer can serve,
/// resolves to the native writer. `None` only when no native writer exists.
pub fn select_writer_format(registry: &WriterRegistry, textual: bool) -> Option<usize> {
    if textual {
        let ascii = (0..registry.writer_format_count()).find(|&i| {
            registry.writer_is_fbx(i)
                && registry
                    .writer_format_description(i)
                    .is_some_and(|d| d.to_ascii_lowercase().contains(TEXT_ENCODING_MARKER))
        });
        if ascii.is_some() {
            return ascii;
        }
        tracing::debug!("No ASCII FBX writer registered, using the native writer");
    }
    registry.native_writer_format()
}

/// Serialize `scene` as described by `request`
///
/// The exporter, and with it the output file, is released before this
/// returns on every path.
pub fn export_scene(manager: &Manager, scene: &Scene, request: &ExportRequest) -> Result<()> {
    let registry = manager.registry();
    let format = select_writer_format(registry, request.textual).ok_or_else(|| {
        ExportError::ExportInit("no native writer format is registered".to_string())
    })?;

    let mut settings = manager.io_settings().clone();
    settings.set_bool_prop(EXP_FBX_EMBEDDED, request.embed_textures);

    let mut exporter = Exporter::initialize(manager, &request.output_path, format, &settings)
        .map_err(|status| ExportError::ExportInit(status.error_string()))?;
    exporter
        .export(scene)
        .map_err(|status| ExportError::ExportWrite(status.error_string()))?;

    tracing::info!(
        "Exported scene {:?} to {} ({})",
        scene.name(),
        request.output_path.display(),
        registry.writer_format_description(format).unwrap_or("unknown format")
    );
    Ok(())
}
