use cgmath::{Matrix4, SquareMatrix};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

use super::{
    camera_controller::{CameraController, PointerAction},
    orbit_camera::OrbitCamera,
};

pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn process_mouse_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
    ) -> Option<PointerAction> {
        self.controller.process_mouse_button(button, state)
    }

    pub fn process_cursor_moved(&mut self, position: (f32, f32), viewport_height: f32) {
        self.controller
            .process_cursor_moved(position, viewport_height, &mut self.camera);
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) -> PointerAction {
        self.controller.process_scroll(delta, &mut self.camera)
    }

    pub fn set_shift_held(&mut self, held: bool) {
        self.controller.set_shift_held(held);
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }
}
