//! End-to-end tests for the scene writer
//!
//! Builds scenes through the public API, exports them, then re-reads the
//! binary output to check what actually landed in the file.

use fbx_common::binary::{self, BinaryDocument};
use fbx_common::fbx::{split_object_name, FbxNode, Property};
use fbx_common::io::{BinaryEncoder, FormatEncoder, WriterFormat};
use fbx_common::{EncodeError, IoSettings, Manager, Scene, WriterRegistry};
use fbx_export::{Attribute, ExportError, ExportRequest, GeometryBuffer, SceneWriter};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

const TRI: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
const TRI_UVS: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];

fn read_binary(path: &Path) -> BinaryDocument {
    let data = std::fs::read(path).expect("Failed to read output");
    binary::read_document(&data).expect("Output is not valid binary FBX")
}

fn objects(doc: &BinaryDocument) -> &FbxNode {
    doc.find("Objects").expect("No Objects section")
}

/// Name part of an object's `name\0\x01Class` property
fn object_name(node: &FbxNode) -> &str {
    node.property(1)
        .and_then(Property::as_str)
        .and_then(split_object_name)
        .map(|(name, _)| name)
        .expect("Object has no name property")
}

fn string_child<'a>(node: &'a FbxNode, name: &str) -> Option<&'a str> {
    node.find(name)
        .and_then(|n| n.property(0))
        .and_then(Property::as_str)
}

fn wood_triangle_writer() -> SceneWriter {
    let mut writer = SceneWriter::new();
    writer.create_scene("wood");
    let buffer = GeometryBuffer::new(&TRI, &[0, 1, 2]).with_uvs(Attribute::per_vertex(&TRI_UVS));
    writer
        .add_mesh_with_material("tri", &buffer, "tex/wood.png")
        .expect("Failed to add mesh");
    writer
}

/// Single textured triangle with per-vertex UVs and no normals
#[test]
fn test_wood_triangle_round_trip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("wood.fbx");

    wood_triangle_writer()
        .export(&ExportRequest::new(&path))
        .expect("Export failed");

    let doc = read_binary(&path);
    assert_eq!(doc.version, 7400);
    let objects = objects(&doc);

    let geometry = objects.find("Geometry").expect("No geometry");
    let vertices = geometry
        .find("Vertices")
        .and_then(|n| n.property(0))
        .and_then(Property::as_f64_array)
        .unwrap();
    assert_eq!(vertices, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);

    let polygons = geometry
        .find("PolygonVertexIndex")
        .and_then(|n| n.property(0))
        .and_then(Property::as_i32_array)
        .unwrap();
    assert_eq!(polygons, &[0, 1, -3]);

    let uv_layer = geometry.find("LayerElementUV").expect("No UV layer");
    assert_eq!(string_child(uv_layer, "Name"), Some("UVChannel_1"));
    assert_eq!(
        string_child(uv_layer, "MappingInformationType"),
        Some("ByPolygonVertex")
    );
    assert_eq!(string_child(uv_layer, "ReferenceInformationType"), Some("Direct"));
    let uvs = uv_layer
        .find("UV")
        .and_then(|n| n.property(0))
        .and_then(Property::as_f64_array)
        .unwrap();
    assert_eq!(uvs, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    assert!(geometry.find("LayerElementNormal").is_none());

    let material = objects.find("Material").expect("No material");
    assert_eq!(object_name(material), "wood_mat");
    let texture = objects.find("Texture").expect("No texture");
    assert_eq!(object_name(texture), "wood_tex");
    assert_eq!(string_child(texture, "FileName"), Some("tex/wood.png"));

    // Texture is bound to the material's diffuse channel
    let connections = doc.find("Connections").expect("No connections");
    let diffuse = connections
        .find_all("C")
        .find(|c| c.property(0).and_then(Property::as_str) == Some("OP"))
        .expect("No OP connection");
    assert_eq!(
        diffuse.property(1).and_then(Property::as_i64),
        texture.property(0).and_then(Property::as_i64)
    );
    assert_eq!(
        diffuse.property(2).and_then(Property::as_i64),
        material.property(0).and_then(Property::as_i64)
    );
    assert_eq!(diffuse.property(3).and_then(Property::as_str), Some("DiffuseColor"));
}

#[test]
fn test_quad_counts_survive_export() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("quad.fbx");
    let positions = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];
    let normals = [[0.0, 0.0, 1.0]; 4];

    let mut writer = SceneWriter::new();
    writer.create_scene("quad");
    let buffer = GeometryBuffer::new(&positions, &[0, 1, 2, 0, 2, 3])
        .with_normals(Attribute::per_vertex(&normals));
    writer.add_mesh_with_material("quad", &buffer, "").unwrap();
    writer.export(&ExportRequest::new(&path)).unwrap();

    let doc = read_binary(&path);
    let geometry = objects(&doc).find("Geometry").unwrap();
    let polygons = geometry
        .find_path(&["PolygonVertexIndex"])
        .and_then(|n| n.property(0))
        .and_then(Property::as_i32_array)
        .unwrap();
    assert_eq!(polygons.iter().filter(|&&i| i < 0).count(), 2);

    let normal_layer = geometry.find("LayerElementNormal").unwrap();
    assert_eq!(
        string_child(normal_layer, "MappingInformationType"),
        Some("ByVertice")
    );
    let stored = normal_layer
        .find("Normals")
        .and_then(|n| n.property(0))
        .and_then(Property::as_f64_array)
        .unwrap();
    assert_eq!(stored.len(), 12);

    // No texture path: placeholder material, no texture object
    let material = objects(&doc).find("Material").unwrap();
    assert_eq!(object_name(material), "Mat");
    assert!(objects(&doc).find("Texture").is_none());
}

#[test]
fn test_ascii_export_writes_text() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("wood.fbx");

    wood_triangle_writer()
        .export(&ExportRequest::new(&path).textual(true))
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("; FBX 7.4.0 project file"));
    assert!(text.contains("\"Material::wood_mat\""));
    assert!(text.contains("PolygonVertexIndex: *3 {"));
}

/// Textual output with no ASCII writer registered falls back to binary
#[test]
fn test_textual_request_without_ascii_writer_uses_native() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("fallback.fbx");

    let mut registry = WriterRegistry::empty();
    let native = registry.register(WriterFormat::new(
        "FBX binary (*.fbx)",
        "fbx",
        true,
        Box::new(BinaryEncoder),
    ));
    registry.set_native(native);

    let mut writer = SceneWriter::with_manager(Manager::with_registry(registry));
    writer.create_scene("fallback");
    writer
        .add_mesh_with_material("tri", &GeometryBuffer::new(&TRI, &[0, 1, 2]), "")
        .unwrap();
    writer
        .export(&ExportRequest::new(&path).textual(true))
        .expect("Fallback export failed");

    let data = std::fs::read(&path).unwrap();
    assert!(binary::is_binary_fbx(&data));
}

struct FailingEncoder;

impl FormatEncoder for FailingEncoder {
    fn encode(&self, _scene: &Scene, _settings: &IoSettings, out: &mut dyn Write) -> Result<(), EncodeError> {
        out.write_all(b"partial")?;
        Err(EncodeError::Unsupported("disk quota exceeded".to_string()))
    }
}

#[test]
fn test_write_failure_carries_diagnostic() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("broken.fbx");

    let mut registry = WriterRegistry::empty();
    let index = registry.register(WriterFormat::new(
        "Broken FBX (*.fbx)",
        "fbx",
        true,
        Box::new(FailingEncoder),
    ));
    registry.set_native(index);

    let mut writer = SceneWriter::with_manager(Manager::with_registry(registry));
    writer.create_scene("broken");
    let err = writer.export(&ExportRequest::new(&path)).unwrap_err();
    match err {
        ExportError::ExportWrite(message) => assert!(message.contains("disk quota exceeded")),
        other => panic!("expected ExportWrite, got {other:?}"),
    }

    // The writer released the file, so it can be removed right away
    std::fs::remove_file(&path).expect("Output file is still held");
}

#[test]
fn test_unwritable_path_fails_init() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("missing").join("out.fbx");

    let err = wood_triangle_writer()
        .export(&ExportRequest::new(&path))
        .unwrap_err();
    assert!(matches!(err, ExportError::ExportInit(_)));
    assert!(!path.exists());
}

#[test]
fn test_embedded_texture_content() {
    let dir = tempdir().expect("Failed to create temp dir");
    let texture = dir.path().join("wood.png");
    std::fs::write(&texture, b"not really a png").unwrap();
    let path = dir.path().join("embedded.fbx");

    let mut writer = SceneWriter::new();
    writer.create_scene("embedded");
    let buffer = GeometryBuffer::new(&TRI, &[0, 1, 2]).with_uvs(Attribute::per_vertex(&TRI_UVS));
    writer
        .add_mesh_with_material("tri", &buffer, texture.to_str().unwrap())
        .unwrap();
    writer
        .export(&ExportRequest::new(&path).embed_textures(true))
        .unwrap();

    let doc = read_binary(&path);
    let video = objects(&doc).find("Video").expect("No video");
    let content = video
        .find("Content")
        .and_then(|n| n.property(0))
        .and_then(Property::as_raw)
        .expect("Texture was not embedded");
    assert_eq!(content, b"not really a png");
}

#[test]
fn test_referenced_texture_has_no_content() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("referenced.fbx");

    wood_triangle_writer()
        .export(&ExportRequest::new(&path))
        .unwrap();

    let doc = read_binary(&path);
    let video = objects(&doc).find("Video").expect("No video");
    assert!(video.find("Content").is_none());
}

#[test]
fn test_flat_surface_matches_tagged_surface() {
    let dir = tempdir().expect("Failed to create temp dir");
    let flat_path = dir.path().join("flat.fbx");
    let tagged_path = dir.path().join("tagged.fbx");

    let mut flat = SceneWriter::new();
    flat.create_scene("s");
    flat.add_mesh_with_material_flat(
        "tri",
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        &[0, 1, 2],
        Some(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0][..]),
        None,
        "",
    )
    .unwrap();
    flat.export(&ExportRequest::new(&flat_path)).unwrap();

    let mut tagged = SceneWriter::new();
    tagged.create_scene("s");
    let buffer = GeometryBuffer::new(&TRI, &[0, 1, 2]).with_uvs(Attribute::per_vertex(&TRI_UVS));
    tagged.add_mesh_with_material("tri", &buffer, "").unwrap();
    tagged.export(&ExportRequest::new(&tagged_path)).unwrap();

    let flat_doc = read_binary(&flat_path);
    let tagged_doc = read_binary(&tagged_path);
    assert_eq!(
        objects(&flat_doc).find("Geometry"),
        objects(&tagged_doc).find("Geometry")
    );
}

#[test]
fn test_nan_position_never_reaches_the_file() {
    let mut positions = TRI;
    positions[1][0] = f32::NAN;

    let mut writer = SceneWriter::new();
    writer.create_scene("nan");
    let err = writer
        .add_mesh_with_material("tri", &GeometryBuffer::new(&positions, &[0, 1, 2]), "")
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidGeometry(_)));
    assert_eq!(writer.scene().unwrap().node_count(), 1);
}
