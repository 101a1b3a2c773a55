use super::camera_utils::{Camera, CameraUniform};
use crate::config::CameraSettings;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Keeps the polar angle away from the poles where `look_at` degenerates
const POLAR_EPSILON: f32 = 1e-6;

/// Y-up camera orbiting `target`.
///
/// Input is accumulated into pending deltas and applied by [`OrbitCamera::update`],
/// which re-derives the spherical offset from the current eye each time. That is
/// what lets [`OrbitCamera::set_target`] move the pivot without moving the eye.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of the pending motion applied per update; `None` applies it at once
    pub damping_factor: Option<f32>,
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub uniform: CameraUniform,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_pan: Vector3<f32>,
    pending_scale: f32,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

impl OrbitCamera {
    pub fn new(eye: Vector3<f32>, target: Vector3<f32>, fov_deg: f32, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fov_deg,
            znear: 0.1,
            zfar: 1000.0,
            damping_factor: None,
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            uniform: CameraUniform::default(),
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_pan: Vector3::zero(),
            pending_scale: 1.0,
        }
    }

    pub fn from_settings(settings: &CameraSettings, fov_deg: f32, aspect: f32) -> Self {
        let mut camera = Self::new(settings.eye, settings.target, fov_deg, aspect);
        camera.znear = settings.znear;
        camera.zfar = settings.zfar;
        camera.damping_factor = settings.damping_factor;
        camera.bounds = OrbitCameraBounds {
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            min_polar: settings.min_polar,
            max_polar: settings.max_polar,
        };
        camera
    }

    pub fn distance(&self) -> f32 {
        (self.eye - self.target).magnitude()
    }

    /// Angle between +Y and the target-to-eye offset
    pub fn polar(&self) -> f32 {
        let offset = self.eye - self.target;
        let radius = offset.magnitude();
        if radius == 0.0 {
            0.0
        } else {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        }
    }

    /// Angle around +Y, measured from +Z towards +X
    pub fn azimuth(&self) -> f32 {
        let offset = self.eye - self.target;
        offset.x.atan2(offset.z)
    }

    /// Queues an orbit step (radians)
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        if !self.enable_rotate {
            return;
        }
        self.pending_azimuth += azimuth;
        self.pending_polar += polar;
    }

    /// Orbit from a pointer drag; a drag across the full viewport height is one turn
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let turn = 2.0 * std::f32::consts::PI;
        self.rotate(-turn * dx / height, -turn * dy / height);
    }

    /// Queues a translation of both eye and target (world units)
    pub fn pan(&mut self, offset: Vector3<f32>) {
        if !self.enable_pan {
            return;
        }
        self.pending_pan += offset;
    }

    /// Pan from a pointer drag so the point under the cursor follows it at the target depth
    pub fn pan_by_pixels(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let target_distance = self.distance() * (self.fov_deg.to_radians() / 2.0).tan();
        let (right, up, _) = self.basis();

        let left = -right * (2.0 * dx * target_distance / height);
        let upward = up * (2.0 * dy * target_distance / height);
        self.pan(left + upward);
    }

    /// Multiplies the orbit distance by `scale` on the next update (< 1 moves closer)
    pub fn dolly(&mut self, scale: f32) {
        if !self.enable_zoom || scale <= 0.0 {
            return;
        }
        self.pending_scale *= scale;
    }

    /// Moves the orbit pivot; the eye stays put until the next update re-orbits around it
    pub fn set_target(&mut self, target: Vector3<f32>) {
        self.target = target;
    }

    /// Applies pending input, enforces the bounds and recomputes the eye.
    ///
    /// With damping, only part of the pending motion is applied and the rest
    /// decays, so this is meant to be called once per frame.
    pub fn update(&mut self) {
        let offset = self.eye - self.target;
        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = self.polar();

        match self.damping_factor {
            Some(factor) => {
                azimuth += self.pending_azimuth * factor;
                polar += self.pending_polar * factor;
                self.target += self.pending_pan * factor;
            }
            None => {
                azimuth += self.pending_azimuth;
                polar += self.pending_polar;
                self.target += self.pending_pan;
            }
        }

        polar = polar
            .clamp(self.bounds.min_polar, self.bounds.max_polar)
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);
        let radius = (offset.magnitude() * self.pending_scale)
            .clamp(self.bounds.min_distance, self.bounds.max_distance);

        self.eye = self.target + spherical_to_cartesian(radius, polar, azimuth);

        match self.damping_factor {
            Some(factor) => {
                let keep = 1.0 - factor;
                self.pending_azimuth *= keep;
                self.pending_polar *= keep;
                self.pending_pan *= keep;
            }
            None => {
                self.pending_azimuth = 0.0;
                self.pending_polar = 0.0;
                self.pending_pan = Vector3::zero();
            }
        }
        self.pending_scale = 1.0;
    }

    /// Moves the field of view `speed` of the way towards `target_deg`
    pub fn approach_fov(&mut self, target_deg: f32, speed: f32) {
        self.fov_deg += (target_deg - self.fov_deg) * speed;
    }

    /// Right, up and forward unit vectors of the view
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        (right, up, forward)
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.eye),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.fov_deg), self.aspect, self.znear, self.zfar)
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = self.build_view_projection_matrix().into();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar: 0.0,
            max_polar: std::f32::consts::PI,
        }
    }
}

fn spherical_to_cartesian(radius: f32, polar: f32, azimuth: f32) -> Vector3<f32> {
    Vector3::new(
        radius * polar.sin() * azimuth.sin(),
        radius * polar.cos(),
        radius * polar.sin() * azimuth.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn showcase_camera() -> OrbitCamera {
        OrbitCamera::from_settings(&CameraSettings::default(), 75.0, 1.5)
    }

    #[test]
    fn first_update_pulls_eye_into_bounds() {
        let mut camera = showcase_camera();
        // (0, 10, 6) is both too far and too close to the pole
        camera.update();

        assert!((camera.distance() - 8.0).abs() < 1e-4);
        assert!((camera.polar() - FRAC_PI_4).abs() < 1e-4);
        assert!(camera.azimuth().abs() < 1e-4);
    }

    #[test]
    fn rotation_settles_within_polar_limits() {
        let mut camera = showcase_camera();
        camera.update();
        camera.rotate(0.0, 10.0);
        for _ in 0..500 {
            camera.update();
        }
        assert!(camera.polar() <= FRAC_PI_2 + 1e-4);
        assert!(camera.eye.y >= -1e-3);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut camera = showcase_camera();
        camera.update();
        let start = camera.azimuth();

        camera.rotate(1.0, 0.0);
        camera.update();
        let after_one = camera.azimuth() - start;
        assert!((after_one - 0.05).abs() < 1e-4);

        for _ in 0..400 {
            camera.update();
        }
        assert!((camera.azimuth() - start - 1.0).abs() < 1e-3);
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let mut camera = showcase_camera();
        camera.update();
        let eye = camera.eye;

        camera.enable_rotate = false;
        camera.enable_pan = false;
        camera.rotate(1.0, 1.0);
        camera.pan(Vector3::new(3.0, 0.0, 0.0));
        for _ in 0..50 {
            camera.update();
        }
        assert!((camera.eye - eye).magnitude() < 1e-4);
        assert_eq!(camera.target, Vector3::zero());
    }

    #[test]
    fn dolly_is_clamped_to_distance_bounds() {
        let mut camera = showcase_camera();
        camera.update();

        camera.dolly(0.01);
        camera.update();
        assert!((camera.distance() - 2.0).abs() < 1e-4);

        camera.dolly(100.0);
        camera.update();
        assert!((camera.distance() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn set_target_keeps_eye_until_update() {
        let mut camera = showcase_camera();
        camera.update();
        let eye = camera.eye;

        let target = Vector3::new(1.0, 0.5, -1.0);
        camera.set_target(target);
        assert_eq!(camera.eye, eye);
        assert_eq!(camera.target, target);

        camera.update();
        assert_eq!(camera.target, target);
        let distance = camera.distance();
        assert!((2.0..=8.0 + 1e-4).contains(&distance));
    }

    #[test]
    fn fov_eases_towards_target() {
        let mut camera = showcase_camera();
        camera.approach_fov(35.0, 0.08);
        assert!((camera.fov_deg - 71.8).abs() < 1e-4);

        for _ in 0..300 {
            camera.approach_fov(35.0, 0.08);
        }
        assert!((camera.fov_deg - 35.0).abs() < 1e-3);
    }

    #[test]
    fn view_projection_maps_target_to_screen_centre() {
        let mut camera = showcase_camera();
        camera.update();
        camera.update_view_proj();

        let clip = camera.build_view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth));
        assert_eq!(camera.uniform.view_position[3], 1.0);
    }
}
