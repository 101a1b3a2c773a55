use log::trace;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta},
};

use super::orbit_camera::OrbitCamera;

/// Pointer gestures the rest of the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    /// Left button released without dragging, in physical pixels
    Click { position: (f32, f32) },
    /// Any wheel movement
    Wheel,
}

/// Turns window pointer events into orbit camera motion.
///
/// Left drag orbits, right drag (or shift + left drag) pans, the wheel dollies.
pub struct CameraController {
    pub rotate_speed: f32,
    /// Distance factor per wheel notch
    pub dolly_scale: f32,
    /// Maximum pointer travel (px) between press and release for a click
    pub click_tolerance: f32,
    cursor: Option<(f32, f32)>,
    is_left_pressed: bool,
    is_right_pressed: bool,
    is_shift_held: bool,
    drag_travel: f32,
}

impl CameraController {
    pub fn new(click_tolerance: f32) -> Self {
        Self {
            rotate_speed: 1.0,
            dolly_scale: 0.95,
            click_tolerance,
            cursor: None,
            is_left_pressed: false,
            is_right_pressed: false,
            is_shift_held: false,
            drag_travel: 0.0,
        }
    }

    pub fn set_shift_held(&mut self, held: bool) {
        if self.is_shift_held != held {
            trace!("shift held: {}", held);
        }
        self.is_shift_held = held;
    }

    pub fn process_mouse_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
    ) -> Option<PointerAction> {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left if pressed => {
                self.is_left_pressed = true;
                self.drag_travel = 0.0;
                None
            }
            MouseButton::Left => {
                let was_pressed = std::mem::replace(&mut self.is_left_pressed, false);
                let position = self.cursor?;
                (was_pressed && self.drag_travel < self.click_tolerance)
                    .then_some(PointerAction::Click { position })
            }
            MouseButton::Right => {
                self.is_right_pressed = pressed;
                None
            }
            _ => None,
        }
    }

    pub fn process_cursor_moved(
        &mut self,
        position: (f32, f32),
        viewport_height: f32,
        camera: &mut OrbitCamera,
    ) {
        let previous = self.cursor.replace(position);
        let Some((last_x, last_y)) = previous else {
            return;
        };
        let (dx, dy) = (position.0 - last_x, position.1 - last_y);

        if self.is_left_pressed {
            self.drag_travel += (dx * dx + dy * dy).sqrt();
        }
        if self.is_panning() {
            camera.pan_by_pixels(dx, dy, viewport_height);
        } else if self.is_left_pressed {
            camera.rotate_by_pixels(dx * self.rotate_speed, dy * self.rotate_speed, viewport_height);
        }
    }

    /// Dollies the camera and reports the wheel gesture
    pub fn process_scroll(&mut self, delta: &MouseScrollDelta, camera: &mut OrbitCamera) -> PointerAction {
        let scroll = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32,
        };
        if scroll > 0.0 {
            camera.dolly(self.dolly_scale);
        } else if scroll < 0.0 {
            camera.dolly(1.0 / self.dolly_scale);
        }
        PointerAction::Wheel
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_right_pressed || (self.is_left_pressed && self.is_shift_held)
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.is_left_pressed && !self.is_shift_held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;

    fn camera() -> OrbitCamera {
        let mut camera = OrbitCamera::from_settings(&CameraSettings::default(), 75.0, 1.5);
        camera.damping_factor = None;
        camera.update();
        camera
    }

    #[test]
    fn short_press_is_a_click() {
        let mut controller = CameraController::new(4.0);
        let mut camera = camera();
        controller.process_cursor_moved((100.0, 100.0), 800.0, &mut camera);

        assert_eq!(
            controller.process_mouse_button(MouseButton::Left, ElementState::Pressed),
            None
        );
        controller.process_cursor_moved((101.0, 101.0), 800.0, &mut camera);
        assert_eq!(
            controller.process_mouse_button(MouseButton::Left, ElementState::Released),
            Some(PointerAction::Click {
                position: (101.0, 101.0)
            })
        );
    }

    #[test]
    fn drag_rotates_instead_of_clicking() {
        let mut controller = CameraController::new(4.0);
        let mut camera = camera();
        let azimuth = camera.azimuth();
        controller.process_cursor_moved((100.0, 100.0), 800.0, &mut camera);

        controller.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(controller.is_rotating());
        controller.process_cursor_moved((140.0, 100.0), 800.0, &mut camera);
        camera.update();

        assert!((camera.azimuth() - azimuth).abs() > 0.1);
        assert_eq!(
            controller.process_mouse_button(MouseButton::Left, ElementState::Released),
            None
        );
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut controller = CameraController::new(4.0);
        let mut camera = camera();
        controller.process_cursor_moved((10.0, 10.0), 800.0, &mut camera);
        assert_eq!(
            controller.process_mouse_button(MouseButton::Left, ElementState::Released),
            None
        );
    }

    #[test]
    fn wheel_up_moves_closer() {
        let mut controller = CameraController::new(4.0);
        let mut camera = camera();
        camera.dolly(0.5);
        camera.update();
        let distance = camera.distance();

        let action = controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 1.0), &mut camera);
        camera.update();

        assert_eq!(action, PointerAction::Wheel);
        assert!((camera.distance() - distance * 0.95).abs() < 1e-4);
    }
}
