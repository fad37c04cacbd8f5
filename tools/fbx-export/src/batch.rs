//! Directory batch conversion
//!
//! Every supported mesh under the input directory becomes `<stem>.fbx` in
//! the output directory. Names are unique case-insensitively against files
//! already in the output directory and earlier outputs of the same run:
//! `crate.fbx`, `crate_1.fbx`, `crate_2.fbx`, ...

use crate::convert::convert_mesh_file;
use crate::export::ExportRequest;
use crate::import;
use anyhow::{Context, Result};
use hashbrown::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Output encoding options shared by every file of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    pub textual: bool,
    pub embed_textures: bool,
}

/// Outcome counts of a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
}

/// Case-insensitive file name allocator for one output directory
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with the names of files already in `dir`
    pub fn for_directory(dir: &Path) -> Result<Self> {
        let mut names = Self::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))? {
                let entry = entry?;
                names
                    .taken
                    .insert(entry.file_name().to_string_lossy().to_lowercase());
            }
        }
        Ok(names)
    }

    /// Reserve `<stem>.<ext>`, or the first free `<stem>_N.<ext>`
    pub fn make_unique(&mut self, stem: &str, ext: &str) -> String {
        let mut candidate = format!("{stem}.{ext}");
        let mut n = 1;
        while self.taken.contains(&candidate.to_lowercase()) {
            candidate = format!("{stem}_{n}.{ext}");
            n += 1;
        }
        self.taken.insert(candidate.to_lowercase());
        candidate
    }
}

/// Supported mesh files under `dir`, recursively, in file name order
pub fn find_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && import::is_supported(e.path()))
        .map(|e| e.into_path())
        .collect()
}

/// Convert every supported mesh under `input_dir` into `output_dir`
///
/// A source that fails is logged and counted, and the run continues.
pub fn convert_directory(input_dir: &Path, output_dir: &Path, options: &BatchOptions) -> Result<BatchSummary> {
    if !input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {:?}", input_dir);
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut names = UniqueNames::for_directory(output_dir)?;
    let mut summary = BatchSummary::default();

    for source in find_sources(input_dir) {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mesh");
        let output = output_dir.join(names.make_unique(stem, "fbx"));
        let request = ExportRequest::new(&output)
            .textual(options.textual)
            .embed_textures(options.embed_textures);

        match convert_mesh_file(&source, None, None, &request) {
            Ok(()) => {
                tracing::info!("{:?} -> {:?}", source, output);
                summary.converted += 1;
            }
            Err(err) => {
                tracing::error!("Failed to convert {:?}: {:#}", source, err);
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        "Batch complete: {} converted, {} failed",
        summary.converted,
        summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_unique_is_case_insensitive() {
        let mut names = UniqueNames::new();
        assert_eq!(names.make_unique("crate", "fbx"), "crate.fbx");
        assert_eq!(names.make_unique("Crate", "fbx"), "Crate_1.fbx");
        assert_eq!(names.make_unique("CRATE", "fbx"), "CRATE_2.fbx");
        assert_eq!(names.make_unique("barrel", "fbx"), "barrel.fbx");
    }

    #[test]
    fn test_existing_files_are_taken() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Rock.FBX"), b"").unwrap();
        let mut names = UniqueNames::for_directory(dir.path()).unwrap();
        assert_eq!(names.make_unique("rock", "fbx"), "rock_1.fbx");
    }

    #[test]
    fn test_find_sources_recurses_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.obj"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("sub").join("b.GLB"), b"").unwrap();

        let sources = find_sources(dir.path());
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().any(|p| p.ends_with("sub/b.GLB")));
    }

    #[test]
    fn test_missing_input_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert_directory(
            &dir.path().join("missing"),
            &dir.path().join("out"),
            &BatchOptions::default(),
        );
        assert!(result.is_err());
    }
}
