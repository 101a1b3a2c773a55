//! Material system
//!
//! Materials are stored in [`MaterialManager`] and meshes reference them by ID.
//! All materials share one bind group layout owned by the render engine:
//! the uniform, then the base colour texture and its sampler. Materials
//! without a texture bind a shared white one.

use std::{collections::HashMap, sync::Arc};
use wgpu::Device;

use super::texture_resource::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Material ID for referencing materials
pub type MaterialId = String;

/// GPU uniform data for materials
///
/// MUST match the `Material` struct in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    /// rgb = emissive colour already scaled by intensity
    pub emissive: [f32; 4],
    /// x = metallic, y = roughness
    pub params: [f32; 4],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

struct MaterialGpu {
    ubo: MaterialUBO,
    // Kept alive for the bind group
    _texture: Option<TextureResource>,
    bind_group: wgpu::BindGroup,
}

/// Surface description shared by every mesh that references it
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    /// sRGB colour map multiplied with `base_color`
    pub base_color_texture: Option<Arc<image::RgbaImage>>,

    gpu: Option<MaterialGpu>,
    dirty: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [0.8, 0.8, 0.8, 1.0], 0.0, 0.5)
    }
}

impl Clone for Material {
    /// Clones the properties; GPU resources are recreated for the copy
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            base_color: self.base_color,
            metallic: self.metallic,
            roughness: self.roughness,
            emissive: self.emissive,
            emissive_intensity: self.emissive_intensity,
            base_color_texture: self.base_color_texture.clone(),
            gpu: None,
            dirty: true,
        }
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("base_color", &self.base_color)
            .field("metallic", &self.metallic)
            .field("roughness", &self.roughness)
            .field("emissive", &self.emissive)
            .field("emissive_intensity", &self.emissive_intensity)
            .field(
                "base_color_texture",
                &self.base_color_texture.as_ref().map(|t| t.dimensions()),
            )
            .finish()
    }
}

impl Material {
    /// Creates a new material with basic PBR properties
    ///
    /// # Arguments
    /// * `name` - Unique name for this material
    /// * `base_color` - Linear RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            base_color_texture: None,
            gpu: None,
            dirty: true,
        }
    }

    /// Builder pattern: Set emissive color and intensity
    pub fn with_emission(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.emissive = color;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_base_color_texture(mut self, texture: Arc<image::RgbaImage>) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    /// Marks the material for re-upload on the next sync
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn uniform(&self) -> MaterialUniform {
        let [r, g, b] = self.emissive;
        let i = self.emissive_intensity;
        MaterialUniform {
            base_color: self.base_color,
            emissive: [r * i, g * i, b * i, 0.0],
            params: [self.metallic, self.roughness, 0.0, 0.0],
        }
    }

    fn needs_upload(&self) -> bool {
        self.dirty || self.gpu.is_none()
    }

    /// Creates the uniform buffer and bind group if needed and uploads properties
    ///
    /// `fallback` is bound when the material has no colour map.
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        fallback: &TextureResource,
    ) {
        let uniform = self.uniform();
        match &mut self.gpu {
            Some(gpu) => gpu.ubo.update_content(queue, uniform),
            None => {
                let ubo = MaterialUBO::new_with_data(device, &uniform);
                let texture = self.base_color_texture.as_ref().map(|image| {
                    TextureResource::from_rgba_image(
                        device,
                        queue,
                        image,
                        &format!("Base Color: {}", self.name),
                    )
                });
                let sampled = texture.as_ref().unwrap_or(fallback);
                let bind_group = BindGroupBuilder::new(layout)
                    .resource(ubo.binding_resource())
                    .resource(wgpu::BindingResource::TextureView(&sampled.view))
                    .resource(wgpu::BindingResource::Sampler(&sampled.sampler))
                    .create(device, &format!("Material Bind Group: {}", self.name));
                self.gpu = Some(MaterialGpu {
                    ubo,
                    _texture: texture,
                    bind_group,
                });
            }
        }
        self.dirty = false;
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

/// Manages all materials in the viewer
///
/// Centralized storage for all materials. Meshes reference materials by ID
/// rather than storing material data directly, so loaded models sharing a
/// material share its GPU resources too.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    // Created on the first sync
    white_texture: Option<TextureResource>,
}

impl MaterialManager {
    /// ID of the fallback material every manager starts with
    pub const DEFAULT: &'static str = "default";

    /// Creates a new material manager with a default material
    pub fn new() -> Self {
        let mut materials = HashMap::new();
        materials.insert(Self::DEFAULT.to_string(), Material::default());
        Self {
            materials,
            white_texture: None,
        }
    }

    /// Bind group layout shared by every material
    pub fn create_bind_group_layout(device: &Device) -> BindGroupLayoutWithDesc {
        BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler())
            .create(device, "Material Bind Group Layout")
    }

    /// Adds a material to the library, replacing any with the same name
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Mutable access; the material is re-uploaded on the next sync
    pub fn get_material_mut(&mut self, id: &MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id).map(|material| {
            material.mark_dirty();
            material
        })
    }

    /// Gets the default material
    pub fn get_default_material(&self) -> &Material {
        &self.materials[Self::DEFAULT]
    }

    /// Gets material for a mesh with fallback to default
    ///
    /// This is the main method used during rendering, handling meshes whose
    /// material was never registered.
    pub fn get_material_for_object(&self, material_id: Option<&MaterialId>) -> &Material {
        material_id
            .and_then(|id| self.get_material(id))
            .unwrap_or_else(|| self.get_default_material())
    }

    /// Lists all material IDs
    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    /// Returns the id of an emissive copy of `id`, creating it on first use.
    ///
    /// The copy keeps every other property of the source material.
    pub fn highlight_variant(&mut self, id: &MaterialId, color: [f32; 3], intensity: f32) -> MaterialId {
        let variant_id = format!("{}#highlight", id);

        let needs_refresh = self.materials.get(&variant_id).map_or(true, |existing| {
            existing.emissive != color || existing.emissive_intensity != intensity
        });
        if needs_refresh {
            let mut variant = self.get_material_for_object(Some(id)).clone();
            variant.name = variant_id.clone();
            variant.emissive = color;
            variant.emissive_intensity = intensity;
            self.add_material(variant);
        }

        variant_id
    }

    /// Uploads materials that are new or were modified since the last sync
    pub fn update_pending_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        let white = self
            .white_texture
            .get_or_insert_with(|| TextureResource::white(device, queue));
        for material in self.materials.values_mut().filter(|m| m.needs_upload()) {
            material.update_gpu_resources(device, queue, layout, white);
        }
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}
