//! Lower a [`Scene`] to the FBX 7.4 record tree
//!
//! Every arena object becomes one record under `Objects`; parent/child,
//! geometry, material and texture links are emitted as `Connections`.

use super::node::{object_name, FbxNode, Property};
use super::Encoding;
use crate::error::EncodeError;
use crate::ids::{MaterialId, MeshId, NodeId, TextureId};
use crate::material::{Material, Texture};
use crate::mesh::Mesh;
use crate::scene::Scene;
use chrono::{DateTime, Datelike, Timelike, Utc};
use glam::{DVec2, DVec3};
use hashbrown::HashMap;

/// Constant file id written by the binary encoding
const FILE_ID: [u8; 16] = [
    0x28, 0xb3, 0x2a, 0xeb, 0xb6, 0x24, 0xcc, 0xc2, 0xbf, 0xc8, 0xb0, 0x2a, 0xa9, 0x2b, 0xfc, 0xf1,
];

/// First object id handed out; 0 is reserved for the root node
const FIRST_OBJECT_ID: i64 = 1_000_000;

/// Settings for one lowering pass
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub creator: String,
    pub created: DateTime<Utc>,
    pub encoding: Encoding,
    /// Inline referenced texture files as `Video.Content`
    pub embed_media: bool,
}

impl DocumentOptions {
    pub fn new(creator: impl Into<String>, encoding: Encoding) -> Self {
        Self {
            creator: creator.into(),
            created: Utc::now(),
            encoding,
            embed_media: false,
        }
    }
}

/// Build the complete top-level record list for `scene`
pub fn build_document(scene: &Scene, options: &DocumentOptions) -> Result<Vec<FbxNode>, EncodeError> {
    let ids = ObjectIds::assign(scene);
    let embed = options.embed_media && options.encoding == Encoding::Binary;

    let mut nodes = vec![header_extension(scene, options)];
    if options.encoding == Encoding::Binary {
        nodes.push(FbxNode::new("FileId").prop(Property::Raw(FILE_ID.to_vec())));
    }
    nodes.push(FbxNode::new("CreationTime").prop(creation_time(&options.created)));
    nodes.push(FbxNode::new("Creator").prop(options.creator.as_str()));
    nodes.push(global_settings(scene));
    nodes.push(documents(scene, &ids));
    nodes.push(FbxNode::new("References"));
    nodes.push(definitions(scene));
    nodes.push(objects(scene, &ids, embed)?);
    nodes.push(connections(scene, &ids));
    Ok(nodes)
}

/// Object ids for every arena object, stable for one lowering pass
struct ObjectIds {
    document: i64,
    models: HashMap<NodeId, i64>,
    geometries: HashMap<MeshId, i64>,
    materials: HashMap<MaterialId, i64>,
    textures: HashMap<TextureId, i64>,
    videos: HashMap<TextureId, i64>,
}

impl ObjectIds {
    fn assign(scene: &Scene) -> Self {
        let mut next = FIRST_OBJECT_ID;
        let mut take = || {
            let id = next;
            next += 1;
            id
        };

        let document = take();
        let mut models = HashMap::new();
        models.insert(scene.root_node(), 0);
        for (id, _) in scene.nodes().skip(1) {
            models.insert(id, take());
        }
        let geometries = scene.meshes().map(|(id, _)| (id, take())).collect();
        let materials = scene.materials().map(|(id, _)| (id, take())).collect();
        let textures = scene.textures().map(|(id, _)| (id, take())).collect();
        let videos = scene.textures().map(|(id, _)| (id, take())).collect();

        Self {
            document,
            models,
            geometries,
            materials,
            textures,
            videos,
        }
    }
}

fn creation_time(at: &DateTime<Utc>) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}:{:03}",
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
        at.timestamp_subsec_millis()
    )
}

fn header_extension(scene: &Scene, options: &DocumentOptions) -> FbxNode {
    let at = &options.created;
    let timestamp = FbxNode::new("CreationTimeStamp")
        .value("Version", 1000)
        .value("Year", at.year())
        .value("Month", at.month() as i32)
        .value("Day", at.day() as i32)
        .value("Hour", at.hour() as i32)
        .value("Minute", at.minute() as i32)
        .value("Second", at.second() as i32)
        .value("Millisecond", at.timestamp_subsec_millis() as i32);

    let metadata = FbxNode::new("MetaData")
        .value("Version", 100)
        .value("Title", scene.name())
        .value("Subject", "")
        .value("Author", "")
        .value("Keywords", "")
        .value("Revision", "")
        .value("Comment", "");

    let scene_info = FbxNode::new("SceneInfo")
        .prop(object_name("GlobalInfo", "SceneInfo"))
        .prop("UserData")
        .value("Type", "UserData")
        .value("Version", 100)
        .child(metadata);

    FbxNode::new("FBXHeaderExtension")
        .value("FBXHeaderVersion", 1003)
        .value("FBXVersion", super::binary::FBX_VERSION as i32)
        .child(timestamp)
        .value("Creator", options.creator.as_str())
        .child(scene_info)
}

/// A `P` record inside `Properties70`
fn p(name: &str, kind: &str, label: &str, flags: &str, values: Vec<Property>) -> FbxNode {
    let mut node = FbxNode::new("P").prop(name).prop(kind).prop(label).prop(flags);
    node.properties.extend(values);
    node
}

fn global_settings(scene: &Scene) -> FbxNode {
    let settings = scene.global_settings();
    let axis = settings.axis_system();
    let unit = settings.system_unit().scale_factor();

    let int = |name: &str, v: i32| p(name, "int", "Integer", "", vec![v.into()]);
    let props = FbxNode::new("Properties70")
        .child(int("UpAxis", axis.up.axis))
        .child(int("UpAxisSign", axis.up.sign))
        .child(int("FrontAxis", axis.front.axis))
        .child(int("FrontAxisSign", axis.front.sign))
        .child(int("CoordAxis", axis.coord.axis))
        .child(int("CoordAxisSign", axis.coord.sign))
        .child(int("OriginalUpAxis", axis.up.axis))
        .child(int("OriginalUpAxisSign", axis.up.sign))
        .child(p("UnitScaleFactor", "double", "Number", "", vec![unit.into()]))
        .child(p(
            "OriginalUnitScaleFactor",
            "double",
            "Number",
            "",
            vec![unit.into()],
        ));

    FbxNode::new("GlobalSettings").value("Version", 1000).child(props)
}

fn documents(scene: &Scene, ids: &ObjectIds) -> FbxNode {
    let document = FbxNode::new("Document")
        .prop(ids.document)
        .prop(scene.name())
        .prop("Scene")
        .child(
            FbxNode::new("Properties70")
                .child(p("SourceObject", "object", "", "", vec![]))
                .child(p("ActiveAnimStackName", "KString", "", "", vec!["".into()])),
        )
        .value("RootNode", 0i64);

    FbxNode::new("Documents").value("Count", 1).child(document)
}

fn definitions(scene: &Scene) -> FbxNode {
    let model_count = scene.node_count().saturating_sub(1);
    let counts = [
        ("GlobalSettings", 1),
        ("Model", model_count),
        ("Geometry", scene.mesh_count()),
        ("Material", scene.material_count()),
        ("Texture", scene.texture_count()),
        ("Video", scene.texture_count()),
    ];

    let total: usize = counts.iter().map(|(_, n)| n).sum();
    let mut node = FbxNode::new("Definitions")
        .value("Version", 100)
        .value("Count", total as i32);
    for (kind, count) in counts.into_iter().filter(|(_, n)| *n > 0) {
        node.push(FbxNode::new("ObjectType").prop(kind).value("Count", count as i32));
    }
    node
}

fn objects(scene: &Scene, ids: &ObjectIds, embed: bool) -> Result<FbxNode, EncodeError> {
    let mut node = FbxNode::new("Objects");

    for (id, mesh) in scene.meshes() {
        node.push(geometry(ids.geometries[&id], mesh)?);
    }
    for (id, n) in scene.nodes().skip(1) {
        let class = if n.mesh().is_some() { "Mesh" } else { "Null" };
        node.push(
            FbxNode::new("Model")
                .prop(ids.models[&id])
                .prop(object_name(n.name(), "Model"))
                .prop(class)
                .value("Version", 232)
                .child(
                    FbxNode::new("Properties70")
                        .child(p("DefaultAttributeIndex", "int", "Integer", "", vec![0.into()])),
                )
                .value("Shading", true)
                .value("Culling", "CullingOff"),
        );
    }
    for (id, material) in scene.materials() {
        node.push(material_record(ids.materials[&id], material));
    }
    for (id, texture) in scene.textures() {
        node.push(texture_record(ids.textures[&id], texture));
        node.push(video_record(ids.videos[&id], texture, embed));
    }

    Ok(node)
}

fn geometry(id: i64, mesh: &Mesh) -> Result<FbxNode, EncodeError> {
    let vertices: Vec<f64> = bytemuck::cast_slice::<DVec3, f64>(mesh.control_points()).to_vec();

    let mut polygon_index = Vec::with_capacity(mesh.polygon_vertex_count());
    for polygon in mesh.polygons() {
        let last = polygon.len() - 1;
        for (corner, &vertex) in polygon.iter().enumerate() {
            let vertex = i32::try_from(vertex).map_err(|_| {
                EncodeError::Unsupported(format!(
                    "control point index {vertex} in mesh {:?}",
                    mesh.name()
                ))
            })?;
            // The last corner of each polygon is stored as its bitwise complement
            polygon_index.push(if corner == last { !vertex } else { vertex });
        }
    }

    let mut node = FbxNode::new("Geometry")
        .prop(id)
        .prop(object_name(mesh.name(), "Geometry"))
        .prop("Mesh")
        .child(FbxNode::new("Vertices").prop(Property::F64Array(vertices)))
        .child(FbxNode::new("PolygonVertexIndex").prop(Property::I32Array(polygon_index)))
        .value("GeometryVersion", 124);

    for (index, layer) in mesh.layers().iter().enumerate() {
        let index = index as i32;
        let mut layer_record = FbxNode::new("Layer").prop(index).value("Version", 100);

        if let Some(normals) = layer.normals() {
            let values = bytemuck::cast_slice::<DVec3, f64>(normals.direct()).to_vec();
            node.push(
                FbxNode::new("LayerElementNormal")
                    .prop(index)
                    .value("Version", 101)
                    .value("Name", normals.name())
                    .value("MappingInformationType", normals.mapping_mode().fbx_name())
                    .value("ReferenceInformationType", normals.reference_mode().fbx_name())
                    .child(FbxNode::new("Normals").prop(Property::F64Array(values))),
            );
            layer_record.push(layer_element("LayerElementNormal", index));
        }

        if let Some(uvs) = layer.uvs() {
            let values = bytemuck::cast_slice::<DVec2, f64>(uvs.direct()).to_vec();
            node.push(
                FbxNode::new("LayerElementUV")
                    .prop(index)
                    .value("Version", 101)
                    .value("Name", uvs.name())
                    .value("MappingInformationType", uvs.mapping_mode().fbx_name())
                    .value("ReferenceInformationType", uvs.reference_mode().fbx_name())
                    .child(FbxNode::new("UV").prop(Property::F64Array(values))),
            );
            layer_record.push(layer_element("LayerElementUV", index));
        }

        if !layer_record.children.is_empty() {
            node.push(layer_record);
        }
    }

    Ok(node)
}

fn layer_element(kind: &str, index: i32) -> FbxNode {
    FbxNode::new("LayerElement")
        .value("Type", kind)
        .value("TypedIndex", index)
}

fn material_record(id: i64, material: &Material) -> FbxNode {
    let diffuse = material.diffuse();
    let factor = material.diffuse_factor();
    let color = |c: DVec3| -> Vec<Property> { vec![c.x.into(), c.y.into(), c.z.into()] };

    FbxNode::new("Material")
        .prop(id)
        .prop(object_name(material.name(), "Material"))
        .prop("")
        .value("Version", 102)
        .value("ShadingModel", material.shading_model().fbx_name())
        .value("MultiLayer", 0)
        .child(
            FbxNode::new("Properties70")
                .child(p(Material::DIFFUSE, "Color", "", "A", color(diffuse)))
                .child(p(Material::DIFFUSE_FACTOR, "Number", "", "A", vec![factor.into()]))
                .child(p("Diffuse", "Vector3D", "Vector", "", color(diffuse * factor))),
        )
}

fn texture_record(id: i64, texture: &Texture) -> FbxNode {
    let mut props = FbxNode::new("Properties70")
        .child(p(
            "TextureTypeUse",
            "enum",
            "",
            "",
            vec![texture.texture_use().fbx_value().into()],
        ))
        .child(p(
            "CurrentMappingType",
            "enum",
            "",
            "",
            vec![texture.mapping_type().fbx_value().into()],
        ))
        .child(p(
            "UseMaterial",
            "bool",
            "",
            "",
            vec![texture.material_use().fbx_value().into()],
        ));
    if let Some(uv_set) = texture.uv_set() {
        props.push(p("UVSet", "KString", "", "", vec![uv_set.into()]));
    }

    FbxNode::new("Texture")
        .prop(id)
        .prop(object_name(texture.name(), "Texture"))
        .prop("")
        .value("Type", "TextureVideoClip")
        .value("Version", 202)
        .value("TextureName", object_name(texture.name(), "Texture"))
        .child(props)
        .value("Media", object_name(texture.name(), "Video"))
        .value("FileName", texture.file_name())
        .value("RelativeFilename", texture.file_name())
        .child(FbxNode::new("ModelUVTranslation").prop(0.0).prop(0.0))
        .child(FbxNode::new("ModelUVScaling").prop(1.0).prop(1.0))
        .value("Texture_Alpha_Source", "None")
        .child(FbxNode::new("Cropping").prop(0).prop(0).prop(0).prop(0))
}

fn video_record(id: i64, texture: &Texture, embed: bool) -> FbxNode {
    let mut node = FbxNode::new("Video")
        .prop(id)
        .prop(object_name(texture.name(), "Video"))
        .prop("Clip")
        .value("Type", "Clip")
        .child(
            FbxNode::new("Properties70")
                .child(p("Path", "KString", "XRefUrl", "", vec![texture.file_name().into()])),
        )
        .value("UseMipMap", 0)
        .value("Filename", texture.file_name())
        .value("RelativeFilename", texture.file_name());

    if embed {
        match std::fs::read(texture.file_name()) {
            Ok(content) => {
                tracing::debug!(
                    "Embedding {} bytes of {:?}",
                    content.len(),
                    texture.file_name()
                );
                node.push(FbxNode::new("Content").prop(Property::Raw(content)));
            }
            Err(err) => tracing::warn!(
                "Cannot embed texture {:?} ({}), writing a file reference instead",
                texture.file_name(),
                err
            ),
        }
    }
    node
}

fn connections(scene: &Scene, ids: &ObjectIds) -> FbxNode {
    let oo = |child: i64, parent: i64| FbxNode::new("C").prop("OO").prop(child).prop(parent);
    let mut node = FbxNode::new("Connections");

    let parents = scene.parents();
    for (id, n) in scene.nodes().skip(1) {
        let model = ids.models[&id];
        // Detached nodes hang off the root
        let parent = parents[id.index()].map(|p| ids.models[&p]).unwrap_or(0);
        node.push(oo(model, parent));

        if let Some(mesh) = n.mesh() {
            if let Some(geometry) = ids.geometries.get(&mesh) {
                node.push(oo(*geometry, model));
            }
        }
        for material in n.materials() {
            if let Some(material) = ids.materials.get(material) {
                node.push(oo(*material, model));
            }
        }
    }

    for (id, material) in scene.materials() {
        for (property, texture) in material.connections() {
            if let Some(texture) = ids.textures.get(texture) {
                node.push(
                    FbxNode::new("C")
                        .prop("OP")
                        .prop(*texture)
                        .prop(ids.materials[&id])
                        .prop(*property),
                );
            }
        }
    }

    for (id, _) in scene.textures() {
        node.push(oo(ids.videos[&id], ids.textures[&id]));
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::ShadingModel;
    use crate::mesh::{MappingMode, UvElement};
    use crate::scene::{Node, SystemUnit};

    fn triangle_scene() -> Scene {
        let mut scene = Scene::new("test");
        scene
            .global_settings_mut()
            .set_system_unit(SystemUnit::M);

        let mut mesh = Mesh::new("tri");
        mesh.init_control_points(3);
        mesh.set_control_point_at(DVec3::X, 1);
        mesh.set_control_point_at(DVec3::Y, 2);
        mesh.begin_polygon();
        for v in [0, 1, 2] {
            mesh.add_polygon(v);
        }
        mesh.end_polygon();
        let layer = mesh.create_layer();
        let mut uvs = UvElement::new("UVChannel_1", MappingMode::ByPolygonVertex);
        for uv in [DVec2::ZERO, DVec2::X, DVec2::Y] {
            uvs.push(uv);
        }
        mesh.layer_mut(layer).unwrap().set_uvs(uvs);

        let mesh = scene.add_mesh(mesh).unwrap();
        let mut texture = Texture::new("wood_tex");
        texture.set_file_name("tex/wood.png");
        let texture = scene.add_texture(texture).unwrap();
        let mut material = Material::new("wood_mat", ShadingModel::Phong);
        material.connect_texture(Material::DIFFUSE, texture).unwrap();
        let material = scene.add_material(material).unwrap();

        let mut node = Node::new("tri");
        node.set_node_attribute(mesh);
        node.add_material(material);
        let node = scene.add_node(node).unwrap();
        scene.add_child(scene.root_node(), node).unwrap();
        scene
    }

    fn options(encoding: Encoding) -> DocumentOptions {
        DocumentOptions::new("tests", encoding)
    }

    #[test]
    fn test_top_level_sections() {
        let nodes = build_document(&triangle_scene(), &options(Encoding::Binary)).unwrap();
        let names: Vec<_> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "FBXHeaderExtension",
                "FileId",
                "CreationTime",
                "Creator",
                "GlobalSettings",
                "Documents",
                "References",
                "Definitions",
                "Objects",
                "Connections"
            ]
        );
    }

    #[test]
    fn test_ascii_skips_file_id() {
        let nodes = build_document(&triangle_scene(), &options(Encoding::Ascii)).unwrap();
        assert!(nodes.iter().all(|n| n.name != "FileId"));
    }

    #[test]
    fn test_polygon_index_marks_last_corner() {
        let nodes = build_document(&triangle_scene(), &options(Encoding::Binary)).unwrap();
        let objects = nodes.iter().find(|n| n.name == "Objects").unwrap();
        let index = objects
            .find_path(&["Geometry", "PolygonVertexIndex"])
            .and_then(|n| n.property(0))
            .and_then(Property::as_i32_array)
            .unwrap();
        assert_eq!(index, &[0, 1, -3]);
    }

    #[test]
    fn test_unit_scale_factor_is_in_centimeters() {
        let nodes = build_document(&triangle_scene(), &options(Encoding::Binary)).unwrap();
        let props = nodes
            .iter()
            .find(|n| n.name == "GlobalSettings")
            .and_then(|n| n.find("Properties70"))
            .unwrap();
        let unit = props
            .find_all("P")
            .find(|p| p.property(0).and_then(Property::as_str) == Some("UnitScaleFactor"))
            .and_then(|p| p.property(4))
            .and_then(Property::as_f64);
        assert_eq!(unit, Some(100.0));
    }

    #[test]
    fn test_texture_connects_to_diffuse_color() {
        let nodes = build_document(&triangle_scene(), &options(Encoding::Binary)).unwrap();
        let connections = nodes.iter().find(|n| n.name == "Connections").unwrap();
        let op = connections
            .find_all("C")
            .find(|c| c.property(0).and_then(Property::as_str) == Some("OP"))
            .unwrap();
        assert_eq!(op.property(3).and_then(Property::as_str), Some("DiffuseColor"));
    }

    #[test]
    fn test_missing_texture_file_is_not_embedded() {
        let mut opts = options(Encoding::Binary);
        opts.embed_media = true;
        let nodes = build_document(&triangle_scene(), &opts).unwrap();
        let objects = nodes.iter().find(|n| n.name == "Objects").unwrap();
        let video = objects.find("Video").unwrap();
        assert!(video.find("Content").is_none());
    }
}
