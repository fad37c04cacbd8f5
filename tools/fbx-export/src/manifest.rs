//! scene.toml manifest parsing and building
//!
//! ```toml
//! [scene]
//! name = "Stage"
//! output = "stage.fbx"      # relative to the manifest
//! ascii = false
//! embed_textures = true
//!
//! [[meshes]]
//! node = "floor"
//! source = "floor.obj"
//! texture = "tex/wood.png"  # optional
//! ```

use crate::convert::add_parts;
use crate::export::ExportRequest;
use crate::import;
use crate::scene::SceneWriter;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// scene.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct SceneManifest {
    pub scene: SceneSection,
    #[serde(default)]
    pub meshes: Vec<MeshEntry>,

    /// Directory relative paths resolve against (the manifest's directory)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Scene-wide settings
#[derive(Debug, Deserialize)]
pub struct SceneSection {
    pub name: String,

    /// Output file. Default: `<name>.fbx`
    #[serde(default)]
    pub output: Option<String>,

    /// Write ASCII FBX instead of binary
    #[serde(default)]
    pub ascii: bool,

    /// Pack texture files into the output (binary only)
    #[serde(default)]
    pub embed_textures: bool,
}

/// One mesh node
#[derive(Debug, Deserialize)]
pub struct MeshEntry {
    pub node: String,
    pub source: String,
    #[serde(default)]
    pub texture: Option<String>,
}

impl SceneManifest {
    /// Output path before any command-line override
    pub fn output_path(&self) -> PathBuf {
        let file = match &self.scene.output {
            Some(output) => output.clone(),
            None => format!("{}.fbx", self.scene.name),
        };
        self.base_dir.join(file)
    }

    pub fn source_path(&self, entry: &MeshEntry) -> PathBuf {
        self.base_dir.join(&entry.source)
    }

    /// Texture path as written into the scene, or "" for none
    pub fn texture_path(&self, entry: &MeshEntry) -> String {
        match entry.texture.as_deref() {
            Some(texture) if !texture.is_empty() => {
                self.base_dir.join(texture).to_string_lossy().into_owned()
            }
            _ => String::new(),
        }
    }
}

/// Parse manifest text; relative paths resolve against `base_dir`
pub fn parse(text: &str, base_dir: &Path) -> Result<SceneManifest> {
    let mut manifest: SceneManifest = toml::from_str(text).context("Failed to parse manifest")?;
    manifest.base_dir = base_dir.to_path_buf();
    Ok(manifest)
}

/// Load a manifest from disk
pub fn load_manifest(path: &Path) -> Result<SceneManifest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse(&text, base_dir).with_context(|| format!("Invalid manifest: {:?}", path))
}

/// Check the manifest without building anything
pub fn validate(manifest: &SceneManifest) -> Result<()> {
    if manifest.scene.name.trim().is_empty() {
        bail!("[scene] name must not be empty");
    }
    if manifest.meshes.is_empty() {
        bail!("Manifest declares no [[meshes]]");
    }

    for (i, entry) in manifest.meshes.iter().enumerate() {
        if entry.node.trim().is_empty() {
            bail!("Mesh #{} has an empty node name", i + 1);
        }
        let source = manifest.source_path(entry);
        if !import::is_supported(&source) {
            bail!(
                "Mesh {:?}: unsupported source {:?} (use .obj, .gltf, or .glb)",
                entry.node,
                source
            );
        }
        if !source.is_file() {
            bail!("Mesh {:?}: source not found: {:?}", entry.node, source);
        }

        let texture = manifest.texture_path(entry);
        if !texture.is_empty() && !Path::new(&texture).is_file() {
            tracing::warn!("Mesh {:?}: texture not found: {:?}", entry.node, texture);
        }
    }
    Ok(())
}

/// Build the manifest's scene and write it, returning the output path
pub fn build_all(manifest: &SceneManifest, output_override: Option<&Path>) -> Result<PathBuf> {
    validate(manifest)?;

    let mut writer = SceneWriter::new();
    writer.create_scene(&manifest.scene.name);

    for entry in &manifest.meshes {
        let source = manifest.source_path(entry);
        let parts = import::load_mesh(&source)?;
        add_parts(&mut writer, &parts, Some(entry.node.as_str()), &manifest.texture_path(entry))
            .with_context(|| format!("Failed to add mesh {:?} from {:?}", entry.node, source))?;
        tracing::info!(
            "  {} <- {:?} ({} part(s), {} triangles)",
            entry.node,
            source,
            parts.len(),
            parts.iter().map(|p| p.data.triangle_count()).sum::<usize>()
        );
    }

    let output = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest.output_path());
    let request = ExportRequest::new(&output)
        .textual(manifest.scene.ascii)
        .embed_textures(manifest.scene.embed_textures);
    writer
        .export(&request)
        .with_context(|| format!("Failed to write {:?}", output))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[scene]
name = "Stage"
ascii = true

[[meshes]]
node = "floor"
source = "floor.obj"
texture = "tex/wood.png"

[[meshes]]
node = "crate"
source = "crate.glb"
"#;

    #[test]
    fn test_parse_defaults_and_paths() {
        let manifest = parse(MANIFEST, Path::new("assets")).unwrap();
        assert_eq!(manifest.scene.name, "Stage");
        assert!(manifest.scene.ascii);
        assert!(!manifest.scene.embed_textures);
        assert_eq!(manifest.output_path(), Path::new("assets").join("Stage.fbx"));
        assert_eq!(manifest.meshes.len(), 2);
        assert_eq!(
            manifest.source_path(&manifest.meshes[0]),
            Path::new("assets").join("floor.obj")
        );
        assert_eq!(manifest.texture_path(&manifest.meshes[1]), "");
    }

    #[test]
    fn test_missing_scene_section_fails() {
        assert!(parse("[[meshes]]\nnode = \"a\"\nsource = \"a.obj\"\n", Path::new(".")).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = parse(MANIFEST, dir.path()).unwrap();
        let err = validate(&manifest).unwrap_err();
        assert!(err.to_string().contains("source not found"));
    }

    #[test]
    fn test_validate_rejects_empty_mesh_list() {
        let manifest = parse("[scene]\nname = \"Empty\"\n", Path::new(".")).unwrap();
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn test_validate_rejects_unsupported_source() {
        let manifest = parse(
            "[scene]\nname = \"S\"\n[[meshes]]\nnode = \"a\"\nsource = \"a.fbx\"\n",
            Path::new("."),
        )
        .unwrap();
        let err = validate(&manifest).unwrap_err();
        assert!(err.to_string().contains("unsupported source"));
    }
}
