use cgmath::{InnerSpace, Matrix, Matrix4, One, Quaternion, Rad, Rotation3, SquareMatrix, Vector3};
use wgpu::Device;

use crate::{
    gfx::{picking::AABB, resources::material::MaterialId},
    wgpu_utils::{BindGroupBuilder, BindGroupLayoutWithDesc, UniformBuffer},
};

use super::vertex::Vertex3D;

/// Index of a node inside its [`Scene`](super::Scene)
pub type NodeId = usize;

/// Triangle mesh in object space
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    bounds: AABB,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    /// Builds a mesh from flat position/normal arrays (3 floats per vertex)
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        Self::with_tex_coords(positions, normals, Vec::new(), indices)
    }

    /// Like [`Mesh::new`] with a flat UV array (2 floats per vertex).
    ///
    /// Vertices past the end of `tex_coords` get (0, 0).
    pub fn with_tex_coords(
        positions: Vec<f32>,
        normals: Vec<f32>,
        tex_coords: Vec<f32>,
        indices: Vec<u32>,
    ) -> Self {
        let vertices = positions
            .chunks_exact(3)
            .zip(normals.chunks_exact(3))
            .enumerate()
            .map(|(i, (p, n))| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
                uv: match tex_coords.get(i * 2..i * 2 + 2) {
                    Some(&[u, v]) => [u, v],
                    _ => [0.0, 0.0],
                },
            })
            .collect();
        Self::from_vertices(vertices, indices)
    }

    pub fn from_vertices(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
        let bounds = AABB::from_vertices(&positions);
        let index_count = indices.len() as u32;

        Self {
            vertices,
            indices,
            bounds,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    /// Smooth vertex normals from triangle faces, for sources without normals
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let position = |i: usize| {
            Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
        };

        let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); vertex_count];
        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }
            let face_normal = (position(i1) - position(i0)).cross(position(i2) - position(i0));
            for i in [i0, i1, i2] {
                accumulated[i] += face_normal;
            }
        }

        accumulated
            .into_iter()
            .flat_map(|n| {
                let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
                [n.x, n.y, n.z]
            })
            .collect()
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Object-space bounding box
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Object-space corners of every complete triangle
    pub fn triangles(&self) -> impl Iterator<Item = [Vector3<f32>; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let fetch = |i: u32| {
                self.vertices
                    .get(i as usize)
                    .map(|v| Vector3::from(v.position))
            };
            Some([fetch(tri[0])?, fetch(tri[1])?, fetch(tri[2])?])
        })
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    pub fn init_gpu_resources(&mut self, device: &Device) {
        use wgpu::util::DeviceExt;

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

/// Local translation / rotation / scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Sets the rotation from Euler angles applied in X, Y, Z order
    pub fn set_euler_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quaternion::from_angle_x(Rad(x))
            * Quaternion::from_angle_y(Rad(y))
            * Quaternion::from_angle_z(Rad(z));
    }

    /// T * R * S
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// A mesh drawn with a material; `original_material` is set while the
/// mesh is highlighted.
pub struct MeshInstance {
    pub mesh: Mesh,
    pub material: MaterialId,
    pub original_material: Option<MaterialId>,
}

impl MeshInstance {
    pub fn new(mesh: Mesh, material: impl Into<MaterialId>) -> Self {
        Self {
            mesh,
            material: material.into(),
            original_material: None,
        }
    }
}

/// Per-node uniform: world matrix plus the matrix used to transform normals
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn from_world(world: Matrix4<f32>) -> Self {
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: world.into(),
            normal: normal.into(),
        }
    }
}

pub struct NodeGpuResources {
    transform_ubo: UniformBuffer<TransformUniform>,
    transform_bind_group: wgpu::BindGroup,
}

/// One node of the scene graph
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: Transform,
    /// `Some(false)` blocks picking for this node and everything below it
    pub selectable: Option<bool>,
    pub visible: bool,
    pub meshes: Vec<MeshInstance>,
    pub gpu_resources: Option<NodeGpuResources>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Transform::default(),
            selectable: None,
            visible: true,
            meshes: Vec::new(),
            gpu_resources: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshInstance) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = Some(selectable);
        self
    }

    pub fn has_meshes(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// Creates vertex/index buffers and the transform bind group
    pub fn init_gpu_resources(
        &mut self,
        device: &Device,
        transform_layout: &BindGroupLayoutWithDesc,
        world: Matrix4<f32>,
    ) {
        for instance in &mut self.meshes {
            if !instance.mesh.has_gpu_resources() {
                instance.mesh.init_gpu_resources(device);
            }
        }

        let transform_ubo = UniformBuffer::new_with_data(device, &TransformUniform::from_world(world));
        let transform_bind_group = BindGroupBuilder::new(transform_layout)
            .resource(transform_ubo.binding_resource())
            .create(device, "Node Transform Bind Group");

        self.gpu_resources = Some(NodeGpuResources {
            transform_ubo,
            transform_bind_group,
        });
    }

    /// Uploads `world` to the node's transform buffer if it changed
    pub fn update_transform(&mut self, queue: &wgpu::Queue, world: Matrix4<f32>) {
        if let Some(gpu) = &mut self.gpu_resources {
            gpu.transform_ubo
                .update_content(queue, TransformUniform::from_world(world));
        }
    }

    pub fn transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|gpu| &gpu.transform_bind_group)
    }
}

pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // not uploaded yet
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
