//! Model loading
//!
//! Reads glTF/GLB files through `gltf` and Wavefront OBJ through `tobj`,
//! adding their nodes, meshes and materials below a given scene node.
//! Base colour maps are decoded with `image`; one that fails to decode is
//! logged and the material keeps its plain colour.

use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context;
use base64::Engine;
use cgmath::{Quaternion, Vector3};
use image::RgbaImage;
use log::{debug, warn};

use crate::{
    error::{Result, ViewerError},
    gfx::resources::material::{Material, MaterialId, MaterialManager},
};

use super::{
    node::{Mesh, MeshInstance, NodeId, SceneNode, Transform},
    scene::Scene,
};

/// Loads the model at `path` as children of `parent`
pub fn load_into(scene: &mut Scene, parent: NodeId, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(ViewerError::MissingAsset {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("glb" | "gltf") => load_gltf(scene, parent, path),
        Some("obj") => load_obj(scene, parent, path),
        _ => Err(ViewerError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Material ids are prefixed with the file stem so equally named
/// materials from different files don't collide
fn material_prefix(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn mesh_from_parts(
    positions: Vec<f32>,
    normals: Option<Vec<f32>>,
    tex_coords: Vec<f32>,
    indices: Vec<u32>,
) -> Mesh {
    let normals = match normals {
        Some(normals) if normals.len() == positions.len() => normals,
        _ => Mesh::calculate_face_normals(&positions, &indices),
    };
    Mesh::with_tex_coords(positions, normals, tex_coords, indices)
}

fn open_texture(path: &Path) -> anyhow::Result<RgbaImage> {
    let decoded = image::open(path).with_context(|| format!("failed to decode '{}'", path.display()))?;
    Ok(decoded.to_rgba8())
}

/// Decodes a glTF image from a buffer view, a data URI or a sibling file
fn decode_gltf_image(
    gltf_image: &gltf::Image,
    buffers: &[gltf::buffer::Data],
    base_dir: &Path,
) -> anyhow::Result<RgbaImage> {
    match gltf_image.source() {
        gltf::image::Source::View { view, .. } => {
            let buffer = buffers
                .get(view.buffer().index())
                .context("image buffer view points past the loaded buffers")?;
            let bytes = buffer
                .0
                .get(view.offset()..view.offset() + view.length())
                .context("image buffer view is out of range")?;
            let decoded = image::load_from_memory(bytes).context("failed to decode embedded image")?;
            Ok(decoded.to_rgba8())
        }
        gltf::image::Source::Uri { uri, .. } => match uri.strip_prefix("data:") {
            Some(data) => {
                let (_, payload) = data
                    .split_once(";base64,")
                    .context("only base64 data URIs are supported")?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(payload)
                    .context("invalid base64 in image URI")?;
                let decoded = image::load_from_memory(&bytes).context("failed to decode data URI image")?;
                Ok(decoded.to_rgba8())
            }
            None => open_texture(&base_dir.join(uri)),
        },
    }
}

fn load_gltf(scene: &mut Scene, parent: NodeId, path: &Path) -> Result<()> {
    let gltf_error = |source| ViewerError::Gltf {
        path: path.to_path_buf(),
        source,
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_error)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(gltf_error)?;

    let base_dir = path.parent().unwrap_or(Path::new("."));
    // Decoded once per image even when several materials share it
    let mut images: HashMap<usize, Option<Arc<RgbaImage>>> = HashMap::new();

    let prefix = material_prefix(path);
    let materials: Vec<MaterialId> = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let id = match material.name() {
                Some(name) => format!("{}/{}", prefix, name),
                None => format!("{}/{}", prefix, material.index().unwrap_or_default()),
            };
            let mut converted = Material::new(
                &id,
                pbr.base_color_factor(),
                pbr.metallic_factor(),
                pbr.roughness_factor(),
            )
            .with_emission(material.emissive_factor(), 1.0);

            if let Some(info) = pbr.base_color_texture() {
                let source = info.texture().source();
                let texture = images
                    .entry(source.index())
                    .or_insert_with(|| match decode_gltf_image(&source, &buffers, base_dir) {
                        Ok(image) => Some(Arc::new(image)),
                        Err(e) => {
                            warn!("'{}' image {}: {:#}", path.display(), source.index(), e);
                            None
                        }
                    })
                    .clone();
                if let Some(texture) = texture {
                    converted = converted.with_base_color_texture(texture);
                }
            }

            scene.add_material(converted)
        })
        .collect();

    let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        warn!("'{}' contains no scene", path.display());
        return Ok(());
    };

    let context = GltfContext {
        buffers: &buffers,
        materials: &materials,
    };
    for node in gltf_scene.nodes() {
        add_gltf_node(scene, parent, &node, &context);
    }
    Ok(())
}

struct GltfContext<'a> {
    buffers: &'a [gltf::buffer::Data],
    materials: &'a [MaterialId],
}

fn add_gltf_node(scene: &mut Scene, parent: NodeId, node: &gltf::Node, context: &GltfContext) {
    let (translation, rotation, scale) = node.transform().decomposed();
    let [x, y, z, w] = rotation;
    let transform = Transform {
        translation: Vector3::from(translation),
        rotation: Quaternion::new(w, x, y, z),
        scale: Vector3::from(scale),
    };

    let mut scene_node = SceneNode::new(node.name().unwrap_or_default()).with_transform(transform);
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(instance) = load_primitive(&primitive, context) {
                scene_node.meshes.push(instance);
            }
        }
    }

    let id = scene.add_node(parent, scene_node);
    for child in node.children() {
        add_gltf_node(scene, id, &child, context);
    }
}

fn load_primitive(primitive: &gltf::Primitive, context: &GltfContext) -> Option<MeshInstance> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        debug!("skipping {:?} primitive", primitive.mode());
        return None;
    }

    let reader = primitive.reader(|buffer| context.buffers.get(buffer.index()).map(|d| d.0.as_slice()));
    let positions: Vec<f32> = reader.read_positions()?.flatten().collect();
    if positions.is_empty() {
        return None;
    }

    let normals = reader
        .read_normals()
        .map(|iter| iter.flatten().collect::<Vec<f32>>());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..(positions.len() / 3) as u32).collect(),
    };
    let uv_set = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_texture()
        .map_or(0, |info| info.tex_coord());
    let tex_coords: Vec<f32> = reader
        .read_tex_coords(uv_set)
        .map(|iter| iter.into_f32().flatten().collect())
        .unwrap_or_default();

    let material = primitive
        .material()
        .index()
        .and_then(|i| context.materials.get(i).cloned())
        .unwrap_or_else(|| MaterialManager::DEFAULT.to_string());

    Some(MeshInstance::new(
        mesh_from_parts(positions, normals, tex_coords, indices),
        material,
    ))
}

fn load_obj(scene: &mut Scene, parent: NodeId, path: &Path) -> Result<()> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| ViewerError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|e| {
        debug!("'{}' has no usable MTL: {}", path.display(), e);
        Vec::new()
    });

    let base_dir = path.parent().unwrap_or(Path::new("."));
    let prefix = material_prefix(path);
    let material_ids: Vec<MaterialId> = materials
        .iter()
        .map(|m| {
            let [r, g, b] = m.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            let alpha = m.dissolve.unwrap_or(1.0);
            let mut material = Material::new(&format!("{}/{}", prefix, m.name), [r, g, b, alpha], 0.0, 0.5);
            if let Some(texture) = &m.diffuse_texture {
                match open_texture(&base_dir.join(texture)) {
                    Ok(image) => material = material.with_base_color_texture(Arc::new(image)),
                    Err(e) => warn!("material '{}': {:#}", m.name, e),
                }
            }
            scene.add_material(material)
        })
        .collect();

    for model in models {
        let mesh = model.mesh;
        let normals = (!mesh.normals.is_empty()).then_some(mesh.normals);
        // OBJ puts v = 0 at the bottom of the image
        let tex_coords: Vec<f32> = mesh
            .texcoords
            .chunks_exact(2)
            .flat_map(|uv| [uv[0], 1.0 - uv[1]])
            .collect();
        let material = mesh
            .material_id
            .and_then(|i| material_ids.get(i).cloned())
            .unwrap_or_else(|| MaterialManager::DEFAULT.to_string());

        let instance = MeshInstance::new(mesh_from_parts(mesh.positions, normals, tex_coords, mesh.indices), material);
        scene.add_node(parent, SceneNode::new(model.name).with_mesh(instance));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::scene::tests::empty_scene;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        write_bytes(name, contents.as_bytes())
    }

    const QUAD_OBJ: &str = "\
o quad
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
f 1 2 3 4
";

    #[test]
    fn obj_becomes_child_nodes_with_meshes() {
        let path = temp_file("quad.obj", QUAD_OBJ);
        let mut scene = empty_scene();
        let group = scene.add_node(Scene::ROOT, SceneNode::new("7"));

        load_into(&mut scene, group, &path).unwrap();
        std::fs::remove_file(&path).ok();

        let children = &scene.node(group).unwrap().children;
        assert_eq!(children.len(), 1);
        let quad = scene.node(children[0]).unwrap();
        assert_eq!(quad.name, "quad");
        assert_eq!(quad.meshes[0].mesh.triangle_count(), 2);
        assert_eq!(quad.meshes[0].material, MaterialManager::DEFAULT);

        // Normals were derived from the faces
        let normal = quad.meshes[0].mesh.vertices()[0].normal;
        assert!((normal[2].abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let path = temp_file("model.fbx", "not a model");
        let mut scene = empty_scene();
        let result = load_into(&mut scene, Scene::ROOT, &path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ViewerError::UnsupportedFormat { .. })));
    }

    #[test]
    fn missing_file_is_reported() {
        let mut scene = empty_scene();
        let result = load_into(&mut scene, Scene::ROOT, Path::new("/no/such/model.glb"));
        assert!(matches!(result, Err(ViewerError::MissingAsset { .. })));
    }

    #[test]
    fn malformed_gltf_is_an_error() {
        let path = temp_file("broken.gltf", "{ this is not json");
        let mut scene = empty_scene();
        let result = load_into(&mut scene, Scene::ROOT, &path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ViewerError::Gltf { .. })));
    }

    fn write_bytes(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vitrine-{}-{}", std::process::id(), name));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn file_name(path: &Path) -> &str {
        path.file_name().unwrap().to_str().unwrap()
    }

    fn triangle_bytes() -> Vec<u8> {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        positions.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    #[test]
    fn minimal_gltf_with_external_buffer_loads() {
        // One triangle: 3 positions (36 bytes) in a sibling .bin
        let bin = write_bytes("tri.bin", &triangle_bytes());
        let json = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "name": "tri", "mesh": 0, "translation": [0.0, 2.0, 0.0] }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }}],
  "materials": [{{ "name": "gold", "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.8, 0.1, 1.0] }} }}],
  "accessors": [{{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                   "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }}],
  "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
  "buffers": [{{ "byteLength": 36, "uri": "{}" }}]
}}"#,
            file_name(&bin)
        );
        let path = temp_file("tri.gltf", &json);
        let mut scene = empty_scene();
        let group = scene.add_node(Scene::ROOT, SceneNode::new("9"));

        load_into(&mut scene, group, &path).unwrap();
        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&bin).ok();

        let child = scene.node(group).unwrap().children[0];
        let node = scene.node(child).unwrap();
        assert_eq!(node.name, "tri");
        assert_eq!(node.transform.translation, Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(node.meshes[0].mesh.triangle_count(), 1);

        let material = scene.get_material(&node.meshes[0].material);
        assert!(material.name.ends_with("/gold"));
        assert_eq!(material.base_color, [1.0, 0.8, 0.1, 1.0]);
        assert!(material.base_color_texture.is_none());

        let bounds = scene.world_bounds(group).unwrap();
        assert_eq!(bounds.max, Vector3::new(1.0, 3.0, 0.0));
    }

    #[test]
    fn base_color_texture_is_decoded_with_uvs() {
        let png = std::env::temp_dir().join(format!("vitrine-{}-red.png", std::process::id()));
        RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]))
            .save(&png)
            .unwrap();

        // Positions (36 bytes) followed by TEXCOORD_0 (24 bytes)
        let mut bytes = triangle_bytes();
        let uvs: [f32; 6] = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0];
        bytes.extend(uvs.iter().flat_map(|f| f.to_le_bytes()));
        let bin = write_bytes("textured.bin", &bytes);

        let json = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "name": "label", "mesh": 0 }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0, "TEXCOORD_0": 1 }}, "material": 0 }}] }}],
  "materials": [{{ "pbrMetallicRoughness": {{ "baseColorTexture": {{ "index": 0 }} }} }}],
  "textures": [{{ "source": 0 }}],
  "images": [{{ "uri": "{}" }}],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" }}
  ],
  "bufferViews": [
    {{ "buffer": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 24 }}
  ],
  "buffers": [{{ "byteLength": 60, "uri": "{}" }}]
}}"#,
            file_name(&png),
            file_name(&bin)
        );
        let path = temp_file("textured.gltf", &json);
        let mut scene = empty_scene();

        load_into(&mut scene, Scene::ROOT, &path).unwrap();
        for file in [&path, &bin, &png] {
            std::fs::remove_file(file).ok();
        }

        let child = scene.node(Scene::ROOT).unwrap().children[0];
        let node = scene.node(child).unwrap();
        let material = scene.get_material(&node.meshes[0].material);
        assert_eq!(material.base_color, [1.0, 1.0, 1.0, 1.0]);

        let texture = material.base_color_texture.as_ref().expect("texture decoded");
        assert_eq!(texture.dimensions(), (1, 1));
        assert_eq!(texture.get_pixel(0, 0).0, [255, 0, 0, 255]);

        let uvs: Vec<[f32; 2]> = node.meshes[0].mesh.vertices().iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]);
    }

    #[test]
    fn undecodable_texture_keeps_plain_material() {
        let bin = write_bytes("plain.bin", &triangle_bytes());
        let json = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "mesh": 0 }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }}],
  "materials": [{{ "pbrMetallicRoughness": {{ "baseColorTexture": {{ "index": 0 }} }} }}],
  "textures": [{{ "source": 0 }}],
  "images": [{{ "uri": "no-such-image.png" }}],
  "accessors": [{{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                   "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }}],
  "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
  "buffers": [{{ "byteLength": 36, "uri": "{}" }}]
}}"#,
            file_name(&bin)
        );
        let path = temp_file("plain.gltf", &json);
        let mut scene = empty_scene();

        load_into(&mut scene, Scene::ROOT, &path).unwrap();
        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&bin).ok();

        let child = scene.node(Scene::ROOT).unwrap().children[0];
        let node = scene.node(child).unwrap();
        let material = scene.get_material(&node.meshes[0].material);
        assert!(material.base_color_texture.is_none());
    }
}
