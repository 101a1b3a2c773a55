use std::path::Path;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use log::{debug, info, warn};
use wgpu::Device;

use crate::{
    assets::{AssetEntry, AssetManifest},
    error::Result,
    gfx::{
        camera::camera_utils::CameraManager,
        picking::AABB,
        resources::{
            global_bindings::PointLight,
            material::{Material, MaterialId, MaterialManager},
        },
    },
    wgpu_utils::BindGroupLayoutWithDesc,
};

use super::{
    loader,
    node::{NodeId, SceneNode, Transform},
};

/// Main scene containing the node graph, materials, light and camera
pub struct Scene {
    pub camera_manager: CameraManager,
    pub material_manager: MaterialManager,
    pub light: PointLight,
    nodes: Vec<SceneNode>,
}

impl Scene {
    /// Id of the implicit root node every top-level object hangs from
    pub const ROOT: NodeId = 0;

    pub fn new(camera_manager: CameraManager, light: PointLight) -> Self {
        Self {
            camera_manager,
            material_manager: MaterialManager::new(),
            light,
            nodes: vec![SceneNode::new("root")],
        }
    }

    /// Updates the scene (camera matrices, etc.)
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
    }

    /// Adds `node` below `parent` and returns its id.
    ///
    /// Ids are assigned in insertion order, so a parent's id is always
    /// smaller than its children's.
    pub fn add_node(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        let id = self.nodes.len();
        let parent = if parent < id { parent } else { Self::ROOT };
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Direct children of the root
    pub fn top_level(&self) -> &[NodeId] {
        &self.nodes[Self::ROOT].children
    }

    /// First top-level node called `name`
    pub fn find_top_level(&self, name: &str) -> Option<NodeId> {
        self.top_level()
            .iter()
            .copied()
            .find(|&id| self.nodes[id].name == name)
    }

    /// Walks up from `id` to the ancestor that is a direct child of the root
    pub fn top_level_ancestor(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes.get(current).and_then(|n| n.parent) {
            if parent == Self::ROOT {
                break;
            }
            current = parent;
        }
        current
    }

    /// False if `id` or any ancestor is explicitly non-selectable
    pub fn is_selectable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|i| self.nodes.get(i)) {
            if node.selectable == Some(false) {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Visible if the node and all of its ancestors are
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|i| self.nodes.get(i)) {
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// `id` followed by all of its descendants, depth first
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn world_transform(&self, id: NodeId) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|i| self.nodes.get(i)) {
            matrix = node.transform.to_matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// World-space bounds of every mesh in the subtree of `id`
    pub fn world_bounds(&self, id: NodeId) -> Option<AABB> {
        self.subtree(id)
            .into_iter()
            .filter(|&node_id| self.nodes[node_id].has_meshes())
            .flat_map(move |node_id| {
                let world = self.world_transform(node_id);
                self.nodes[node_id]
                    .meshes
                    .iter()
                    .filter(|m| !m.mesh.vertices().is_empty())
                    .map(move |m| m.mesh.bounds().transform(&world))
            })
            .reduce(|a, b| a.union(&b))
    }

    /// Loads one manifest entry as a new top-level node
    pub fn add_model(&mut self, path: &Path, entry: &AssetEntry) -> Result<NodeId> {
        let mut group = SceneNode::new(entry.name.clone().unwrap_or_default())
            .with_selectable(entry.selectable);
        if let Some(offset) = entry.offset {
            group.transform = Transform::from_translation(offset);
        }

        let group_id = self.add_node(Self::ROOT, group);
        if let Err(e) = loader::load_into(self, group_id, path) {
            self.remove_last_subtree(group_id);
            return Err(e);
        }
        Ok(group_id)
    }

    /// Loads every manifest entry; failures are logged and skipped.
    ///
    /// Returns the number of files that made it into the scene.
    pub fn load_manifest(&mut self, manifest: &AssetManifest, resources_dir: &Path) -> usize {
        let mut loaded = 0;
        for (path, entry) in manifest.resolve(resources_dir) {
            match self.add_model(&path, entry) {
                Ok(id) => {
                    debug!("loaded '{}' as node {}", path.display(), id);
                    loaded += 1;
                }
                Err(e) => warn!("skipping asset: {:#}", anyhow::Error::new(e)),
            }
        }

        let stats = self.get_statistics();
        info!(
            "scene ready: {}/{} assets, {} nodes, {} materials, {} triangles",
            loaded,
            manifest.entries.len(),
            stats.node_count,
            stats.material_count,
            stats.total_triangles
        );
        loaded
    }

    /// Drops a subtree that was the last thing added (failed load)
    fn remove_last_subtree(&mut self, id: NodeId) {
        if id >= self.nodes.len() {
            return;
        }
        self.nodes.truncate(id);
        for node in &mut self.nodes {
            node.children.retain(|&child| child < id);
        }
    }

    /// Registers a material, returning its id
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = material.name.clone();
        self.material_manager.add_material(material);
        id
    }

    /// Swaps every mesh material in the subtree of `id` for an emissive variant
    pub fn highlight_subtree(&mut self, id: NodeId, color: [f32; 3], intensity: f32) {
        for node_id in self.subtree(id) {
            for instance in &mut self.nodes[node_id].meshes {
                let original = instance
                    .original_material
                    .take()
                    .unwrap_or_else(|| instance.material.clone());
                instance.material =
                    self.material_manager
                        .highlight_variant(&original, color, intensity);
                instance.original_material = Some(original);
            }
        }
    }

    /// Restores the materials replaced by [`Scene::highlight_subtree`]
    pub fn reset_highlight(&mut self, id: NodeId) {
        for node_id in self.subtree(id) {
            for instance in &mut self.nodes[node_id].meshes {
                if let Some(original) = instance.original_material.take() {
                    instance.material = original;
                }
            }
        }
    }

    /// Rotates a node in place (Euler X/Y/Z, radians)
    pub fn set_node_rotation(&mut self, id: NodeId, x: f32, y: f32, z: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.transform.set_euler_xyz(x, y, z);
        }
    }

    /// Creates missing GPU resources and uploads transforms and changed materials.
    ///
    /// Called once per frame before rendering.
    pub fn sync_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        transform_layout: &BindGroupLayoutWithDesc,
        material_layout: &BindGroupLayoutWithDesc,
    ) {
        // Parents precede children, so one pass in id order sees final parent matrices.
        let mut world = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let parent_world = node
                .parent
                .map(|p| world[p])
                .unwrap_or_else(Matrix4::identity);
            world.push(parent_world * node.transform.to_matrix());
        }

        for (node, world) in self.nodes.iter_mut().zip(world) {
            if !node.has_meshes() {
                continue;
            }
            if node.gpu_resources.is_none() {
                node.init_gpu_resources(device, transform_layout, world);
            } else {
                node.update_transform(queue, world);
            }
        }

        self.material_manager
            .update_pending_gpu_resources(device, queue, material_layout);
    }

    /// Gets material for rendering a mesh, falling back to the default
    pub fn get_material(&self, id: &MaterialId) -> &Material {
        self.material_manager.get_material_for_object(Some(id))
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        let meshes = self.nodes.iter().flat_map(|n| n.meshes.iter());
        let (total_triangles, total_vertices) = meshes.fold((0, 0), |(t, v), m| {
            (t + m.mesh.triangle_count(), v + m.mesh.vertices().len())
        });

        SceneStatistics {
            node_count: self.nodes.len(),
            material_count: self.material_manager.list_materials().len(),
            total_triangles,
            total_vertices,
        }
    }

    /// Centre of the world bounds of `id`, if it has geometry
    pub fn world_center(&self, id: NodeId) -> Option<Vector3<f32>> {
        self.world_bounds(id).map(|b| b.center())
    }
}

/// Scene statistics for logging
#[derive(Debug)]
pub struct SceneStatistics {
    pub node_count: usize,
    pub material_count: usize,
    pub total_triangles: usize,
    pub total_vertices: usize,
}
