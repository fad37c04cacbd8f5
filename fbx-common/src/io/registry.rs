//! Writer format registry
//!
//! Formats are kept in registration order; their indices are what callers
//! pass to [`Exporter::initialize`](super::Exporter::initialize).

use super::IoSettings;
use crate::error::EncodeError;
use crate::fbx::{ascii, binary, build_document, DocumentOptions, Encoding};
use crate::scene::Scene;
use std::fmt;
use std::io::Write;

/// Encodes a whole scene into one output stream
pub trait FormatEncoder: Send + Sync {
    fn encode(&self, scene: &Scene, settings: &IoSettings, out: &mut dyn Write) -> Result<(), EncodeError>;
}

/// FBX 7.4 binary encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryEncoder;

impl FormatEncoder for BinaryEncoder {
    fn encode(&self, scene: &Scene, settings: &IoSettings, out: &mut dyn Write) -> Result<(), EncodeError> {
        let mut options = DocumentOptions::new(settings.creator(), Encoding::Binary);
        options.embed_media = settings.embed_textures();
        let nodes = build_document(scene, &options)?;
        binary::write_document(out, &nodes)
    }
}

/// FBX 7.4 ASCII encoder. Media is never embedded in this encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiEncoder;

impl FormatEncoder for AsciiEncoder {
    fn encode(&self, scene: &Scene, settings: &IoSettings, out: &mut dyn Write) -> Result<(), EncodeError> {
        if settings.embed_textures() && scene.texture_count() > 0 {
            tracing::warn!("ASCII FBX cannot embed media; textures are written as file references");
        }
        let options = DocumentOptions::new(settings.creator(), Encoding::Ascii);
        let nodes = build_document(scene, &options)?;
        ascii::write_document(out, &nodes, settings.creator())
    }
}

/// One registered writer
pub struct WriterFormat {
    description: String,
    extension: String,
    is_fbx: bool,
    encoder: Box<dyn FormatEncoder>,
}

impl WriterFormat {
    pub fn new(
        description: impl Into<String>,
        extension: impl Into<String>,
        is_fbx: bool,
        encoder: Box<dyn FormatEncoder>,
    ) -> Self {
        Self {
            description: description.into(),
            extension: extension.into(),
            is_fbx,
            encoder,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_fbx(&self) -> bool {
        self.is_fbx
    }

    pub fn encoder(&self) -> &dyn FormatEncoder {
        self.encoder.as_ref()
    }
}

impl fmt::Debug for WriterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterFormat")
            .field("description", &self.description)
            .field("extension", &self.extension)
            .field("is_fbx", &self.is_fbx)
            .finish_non_exhaustive()
    }
}

/// Ordered set of writer formats with one marked native
#[derive(Debug)]
pub struct WriterRegistry {
    formats: Vec<WriterFormat>,
    native: Option<usize>,
}

impl Default for WriterRegistry {
    /// Binary FBX (native) followed by ASCII FBX
    fn default() -> Self {
        let mut registry = Self::empty();
        let native = registry.register(WriterFormat::new(
            "FBX binary (*.fbx)",
            "fbx",
            true,
            Box::new(BinaryEncoder),
        ));
        registry.set_native(native);
        registry.register(WriterFormat::new(
            "FBX ascii (*.fbx)",
            "fbx",
            true,
            Box::new(AsciiEncoder),
        ));
        registry
    }
}

impl WriterRegistry {
    /// Registry with no formats at all
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
            native: None,
        }
    }

    /// Append a format, returning its index
    pub fn register(&mut self, format: WriterFormat) -> usize {
        self.formats.push(format);
        self.formats.len() - 1
    }

    /// Mark `index` as the native format. Returns `false` if it is out of range.
    pub fn set_native(&mut self, index: usize) -> bool {
        if index < self.formats.len() {
            self.native = Some(index);
            true
        } else {
            false
        }
    }

    pub fn native_writer_format(&self) -> Option<usize> {
        self.native
    }

    pub fn writer_format_count(&self) -> usize {
        self.formats.len()
    }

    pub fn writer_format_description(&self, index: usize) -> Option<&str> {
        self.formats.get(index).map(WriterFormat::description)
    }

    pub fn writer_is_fbx(&self, index: usize) -> bool {
        self.formats.get(index).is_some_and(WriterFormat::is_fbx)
    }

    pub fn format(&self, index: usize) -> Option<&WriterFormat> {
        self.formats.get(index)
    }

    pub fn formats(&self) -> impl Iterator<Item = (usize, &WriterFormat)> {
        self.formats.iter().enumerate()
    }
}
