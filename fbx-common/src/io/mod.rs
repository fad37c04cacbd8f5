//! Export plumbing: settings, writer formats, exporter and manager

mod exporter;
mod manager;
mod registry;
mod settings;

pub use exporter::{ExportStatus, Exporter};
pub use manager::Manager;
pub use registry::{AsciiEncoder, BinaryEncoder, FormatEncoder, WriterFormat, WriterRegistry};
pub use settings::{IoSettings, EXP_FBX_EMBEDDED};
