//! Exporter: the writer resource bound to one output file and format

use super::{IoSettings, Manager, WriterFormat};
use crate::error::EncodeError;
use crate::scene::Scene;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Failure status of an exporter call
#[derive(Debug, thiserror::Error)]
pub enum ExportStatus {
    #[error("writer format {0} is not registered")]
    InvalidFormat(usize),

    #[error("cannot open {path:?} for writing: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `export` was called after the output file was already consumed
    #[error("exporter is not initialized")]
    NotInitialized,

    #[error("{0}")]
    Encode(#[from] EncodeError),
}

impl ExportStatus {
    /// Human-readable diagnostic text
    pub fn error_string(&self) -> String {
        self.to_string()
    }
}

/// Writes one scene to one file. The file is closed when the exporter drops.
pub struct Exporter<'m> {
    path: PathBuf,
    format: &'m WriterFormat,
    settings: IoSettings,
    file: Option<BufWriter<File>>,
}

impl<'m> Exporter<'m> {
    /// Resolve `format` in the manager's registry and create the output file
    pub fn initialize(
        manager: &'m Manager,
        path: impl AsRef<Path>,
        format: usize,
        settings: &IoSettings,
    ) -> Result<Self, ExportStatus> {
        let path = path.as_ref().to_path_buf();
        let writer = manager
            .registry()
            .format(format)
            .ok_or(ExportStatus::InvalidFormat(format))?;

        let file = File::create(&path).map_err(|source| ExportStatus::FileOpen {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Exporter opened {} as {:?}", path.display(), writer.description());
        Ok(Self {
            path,
            format: writer,
            settings: settings.clone(),
            file: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &WriterFormat {
        self.format
    }

    /// Encode `scene` into the output file and flush it
    pub fn export(&mut self, scene: &Scene) -> Result<(), ExportStatus> {
        let mut file = self.file.take().ok_or(ExportStatus::NotInitialized)?;
        self.format.encoder().encode(scene, &self.settings, &mut file)?;
        file.flush().map_err(EncodeError::from)?;
        Ok(())
    }
}

impl Drop for Exporter<'_> {
    fn drop(&mut self) {
        if self.file.is_some() {
            tracing::debug!("Exporter for {} released without writing", self.path.display());
        }
    }
}
