//! Integration tests for the fbx-export CLI

use fbx_common::binary;
use fbx_common::fbx::{split_object_name, Property};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

const QUAD_OBJ: &str = "\
# unit quad
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

fn fbx_export(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fbx-export"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("Failed to run fbx-export")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "fbx-export failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn polygon_index(path: &Path) -> Vec<i32> {
    let data = fs::read(path).expect("Failed to read output");
    let doc = binary::read_document(&data).expect("Output is not valid binary FBX");
    doc.find("Objects")
        .and_then(|o| o.find("Geometry"))
        .and_then(|g| g.find("PolygonVertexIndex"))
        .and_then(|n| n.property(0))
        .and_then(Property::as_i32_array)
        .expect("No polygon index")
        .to_vec()
}

#[test]
fn test_mesh_command_writes_binary_fbx() {
    let dir = tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();

    let output = fbx_export(&["mesh", "quad.obj", "-t", "tex/tile.png"], dir.path());
    assert_success(&output);

    let fbx = dir.path().join("quad.fbx");
    assert!(fbx.exists(), "Default output should sit next to the input");
    // Quad is fan-triangulated into two triangles
    assert_eq!(polygon_index(&fbx), vec![0, 1, -3, 0, 2, -4]);
}

#[test]
fn test_mesh_command_ascii() {
    let dir = tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();

    let output = fbx_export(
        &["mesh", "quad.obj", "-o", "out.fbx", "-n", "floor", "--ascii"],
        dir.path(),
    );
    assert_success(&output);

    let text = fs::read_to_string(dir.path().join("out.fbx")).unwrap();
    assert!(text.starts_with("; FBX 7.4.0 project file"));
    assert!(text.contains("\"Model::floor\""));
    assert!(text.contains("\"Material::Mat\""));
}

#[test]
fn test_mesh_command_rejects_unknown_format() {
    let dir = tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("model.stl"), b"solid x").unwrap();

    let output = fbx_export(&["mesh", "model.stl"], dir.path());
    assert!(!output.status.success());
    assert!(!dir.path().join("model.fbx").exists());
}

#[test]
fn test_formats_lists_native_writer() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output = fbx_export(&["formats"], dir.path());
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0: FBX binary (*.fbx) (native)"));
    assert!(stdout.contains("1: FBX ascii (*.fbx)"));
}

#[test]
fn test_build_and_check_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();
    fs::write(
        dir.path().join("scene.toml"),
        r#"
[scene]
name = "Stage"
output = "stage.fbx"

[[meshes]]
node = "floor"
source = "quad.obj"
texture = "wood.png"

[[meshes]]
node = "wall"
source = "quad.obj"
"#,
    )
    .unwrap();

    assert_success(&fbx_export(&["check"], dir.path()));
    assert_success(&fbx_export(&["build"], dir.path()));

    let data = fs::read(dir.path().join("stage.fbx")).unwrap();
    let doc = binary::read_document(&data).unwrap();
    let objects = doc.find("Objects").unwrap();
    assert_eq!(objects.find_all("Model").count(), 2);
    assert_eq!(objects.find_all("Geometry").count(), 2);
    assert_eq!(objects.find_all("Material").count(), 2);
    assert_eq!(objects.find_all("Texture").count(), 1);
}

#[test]
fn test_check_rejects_missing_source() {
    let dir = tempdir().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("scene.toml"),
        r#"
[scene]
name = "Broken"

[[meshes]]
node = "ghost"
source = "ghost.obj"
"#,
    )
    .unwrap();

    let output = fbx_export(&["check"], dir.path());
    assert!(!output.status.success());
}

#[test]
fn test_batch_converts_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("meshes");
    fs::create_dir_all(input.join("props")).unwrap();
    fs::write(input.join("crate.obj"), QUAD_OBJ).unwrap();
    fs::write(input.join("props").join("Crate.obj"), QUAD_OBJ).unwrap();
    fs::write(input.join("readme.txt"), b"ignored").unwrap();

    let output = fbx_export(&["batch", "meshes", "out"], dir.path());
    assert_success(&output);

    let out = dir.path().join("out");
    let mut names: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|n| n == "crate.fbx"));
    assert!(names.iter().any(|n| n.eq_ignore_ascii_case("crate_1.fbx")));
}

#[test]
fn test_batch_reports_failures() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("meshes");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("good.obj"), QUAD_OBJ).unwrap();
    fs::write(input.join("bad.obj"), "v 0 0 0\nf 1 2 3\n").unwrap();

    let output = fbx_export(&["batch", "meshes", "out"], dir.path());
    assert!(!output.status.success());
    // The good file is still converted
    assert!(dir.path().join("out").join("good.fbx").exists());
}

const TRI_PRIMITIVE: &str = r#"{
      "attributes": { "POSITION": 0, "TEXCOORD_0": 1, "NORMAL": 2 },
      "indices": 3
    }"#;

/// Writes a glTF whose single mesh holds `primitives` over one shared
/// triangle, with an external buffer file
fn write_gltf(dir: &Path, file: &str, mesh_name: &str, primitives: &[&str]) {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let uvs: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    let normals: [[f32; 3]; 3] = [[0.0, 0.0, 1.0]; 3];
    let indices: [u16; 4] = [0, 1, 2, 0]; // last entry pads to 4 bytes

    let mut bin = Vec::new();
    bin.extend_from_slice(bytemuck::cast_slice(&positions));
    bin.extend_from_slice(bytemuck::cast_slice(&uvs));
    bin.extend_from_slice(bytemuck::cast_slice(&normals));
    bin.extend_from_slice(bytemuck::cast_slice(&indices));
    assert_eq!(bin.len(), 104);
    fs::write(dir.join("tri.bin"), &bin).unwrap();

    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "buffers": [{{ "uri": "tri.bin", "byteLength": 104 }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 24 }},
    {{ "buffer": 0, "byteOffset": 60, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 96, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" }},
    {{ "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC3" }},
    {{ "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ],
  "meshes": [{{ "name": "{mesh_name}", "primitives": [{}] }}]
}}"#,
        primitives.join(", ")
    );
    fs::write(dir.join(file), json).unwrap();
}

#[test]
fn test_mesh_command_reads_gltf() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_gltf(dir.path(), "tri.gltf", "tri", &[TRI_PRIMITIVE]);

    let output = fbx_export(&["mesh", "tri.gltf", "-t", "wood.png"], dir.path());
    assert_success(&output);

    let data = fs::read(dir.path().join("tri.fbx")).unwrap();
    let doc = binary::read_document(&data).unwrap();
    let geometry = doc
        .find("Objects")
        .and_then(|o| o.find("Geometry"))
        .expect("No geometry");

    let mapping = |layer: &str| {
        geometry
            .find(layer)
            .and_then(|l| l.find("MappingInformationType"))
            .and_then(|n| n.property(0))
            .and_then(Property::as_str)
            .map(str::to_owned)
    };
    // glTF attributes are per-vertex; UVs are always stored per corner
    assert_eq!(mapping("LayerElementNormal").as_deref(), Some("ByVertice"));
    assert_eq!(mapping("LayerElementUV").as_deref(), Some("ByPolygonVertex"));

    let uvs = geometry
        .find_path(&["LayerElementUV", "UV"])
        .and_then(|n| n.property(0))
        .and_then(Property::as_f64_array)
        .unwrap();
    assert_eq!(uvs, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_mesh_command_keeps_every_gltf_primitive() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_gltf(dir.path(), "pair.gltf", "pair", &[TRI_PRIMITIVE, TRI_PRIMITIVE]);

    let output = fbx_export(&["mesh", "pair.gltf"], dir.path());
    assert_success(&output);

    let data = fs::read(dir.path().join("pair.fbx")).unwrap();
    let doc = binary::read_document(&data).unwrap();
    let objects = doc.find("Objects").unwrap();
    assert_eq!(objects.find_all("Geometry").count(), 2);

    let mut names: Vec<&str> = objects
        .find_all("Model")
        .filter_map(|m| m.property(1).and_then(Property::as_str))
        .filter_map(split_object_name)
        .map(|(name, _)| name)
        .collect();
    names.sort();
    assert_eq!(names, ["pair_0", "pair_1"]);
}
