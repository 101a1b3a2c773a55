//! Global uniform bindings for camera and light data
//!
//! Manages the GPU uniform buffer and bind group for per-frame state shared
//! by every mesh in the scene.

use crate::{
    config::LightSettings,
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in `scene.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// xyz = position, w = range (0 disables the cutoff)
    light_position_range: [f32; 4],
    /// rgb = colour, a = intensity
    light_color_intensity: [f32; 4],
}

impl GlobalUBOContent {
    pub fn new(camera: &CameraUniform, light: &PointLight) -> Self {
        let [x, y, z] = light.position;
        let [r, g, b] = light.color;
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_position_range: [x, y, z, light.range],
            light_color_intensity: [r, g, b, light.effective_intensity()],
        }
    }
}

/// Single point light illuminating the scene
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    /// Distance at which the light's contribution reaches zero
    pub range: f32,
    pub visible: bool,
}

impl PointLight {
    pub fn from_settings(settings: &LightSettings) -> Self {
        Self {
            position: settings.position,
            color: settings.color,
            intensity: settings.intensity,
            range: settings.range,
            visible: true,
        }
    }

    /// Flips visibility and returns the new state
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Intensity as seen by the shader; a hidden light contributes nothing
    pub fn effective_intensity(&self) -> f32 {
        if self.visible {
            self.intensity
        } else {
            0.0
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::from_settings(&LightSettings::default())
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera and light data
///
/// Called each frame; the buffer skips the write when nothing changed.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: &CameraUniform,
    light: &PointLight,
) {
    ubo.update_content(queue, GlobalUBOContent::new(camera, light));
}

/// Manages bind group layouts and bind groups for global uniforms
///
/// Bound to slot 0 in every render pipeline.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");
        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    /// Used when creating render pipelines that need access to global uniforms.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_light_has_zero_intensity_in_uniform() {
        let mut light = PointLight::default();
        let camera = CameraUniform::default();
        assert_eq!(
            GlobalUBOContent::new(&camera, &light).light_color_intensity[3],
            40.0
        );

        assert!(!light.toggle());
        let content = GlobalUBOContent::new(&camera, &light);
        assert_eq!(content.light_color_intensity[3], 0.0);
        assert_eq!(content.light_position_range, [0.0, 5.0, 0.0, 70.0]);

        assert!(light.toggle());
    }
}
