//! Viewer configuration
//!
//! Every default reproduces the showcase as it was designed: camera at
//! (0, 10, 6) with a 75° field of view, a 35° zoom when an object is in
//! focus, and the information panel revealed three seconds after a click.

use std::{env, path::PathBuf, time::Duration};

use cgmath::Vector3;
use log::warn;

/// Environment variable overriding [`ViewerConfig::resources_dir`]
pub const RESOURCES_ENV: &str = "VITRINE_RESOURCES";
/// Environment variable overriding [`FocusSettings::reveal_delay`] (milliseconds)
pub const REVEAL_DELAY_ENV: &str = "VITRINE_REVEAL_DELAY_MS";

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub window_title: String,
    pub window_size: (u32, u32),
    /// Directory holding the model files listed by the asset manifest
    pub resources_dir: PathBuf,
    /// Directory the info catalog's image and video paths are relative to
    pub content_dir: PathBuf,
    pub camera: CameraSettings,
    pub focus: FocusSettings,
    pub light: LightSettings,
    pub sky: SkySettings,
    /// Radians per frame applied to the ring around its X and Z axes
    pub ring_spin: (f32, f32),
    /// Pointer travel (physical pixels) below which a release counts as a click
    pub click_drag_tolerance: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let ring_rotation_speed = 0.01;
        Self {
            window_title: "Vitrine".to_string(),
            window_size: (1200, 800),
            resources_dir: PathBuf::from("resources"),
            content_dir: PathBuf::from("."),
            camera: CameraSettings::default(),
            focus: FocusSettings::default(),
            light: LightSettings::default(),
            sky: SkySettings::default(),
            ring_spin: (0.5 * ring_rotation_speed, 0.7 * ring_rotation_speed),
            click_drag_tolerance: 4.0,
        }
    }
}

impl ViewerConfig {
    /// Defaults with the `VITRINE_*` environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`; malformed values are
    /// logged and ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(RESOURCES_ENV) {
            self.resources_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(REVEAL_DELAY_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.focus.reveal_delay = Duration::from_millis(ms),
                Err(e) => warn!("ignoring {}={:?}: {}", REVEAL_DELAY_ENV, raw, e),
            }
        }
        self
    }

    pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources_dir = dir.into();
        self
    }

    pub fn with_content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_dir = dir.into();
        self
    }

    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.focus.reveal_delay = delay;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }
}

/// Orbit camera and orbit control limits
#[derive(Debug, Clone, Copy)]
pub struct CameraSettings {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits measured from +Y, radians
    pub min_polar: f32,
    pub max_polar: f32,
    /// `None` disables damping
    pub damping_factor: Option<f32>,
    /// Fraction of the remaining field-of-view gap closed per frame
    pub zoom_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: Vector3::new(0.0, 10.0, 6.0),
            target: Vector3::new(0.0, 0.0, 0.0),
            znear: 0.1,
            zfar: 1000.0,
            min_distance: 2.0,
            max_distance: 8.0,
            min_polar: std::f32::consts::FRAC_PI_4,
            max_polar: std::f32::consts::FRAC_PI_2,
            damping_factor: Some(0.05),
            zoom_speed: 0.08,
        }
    }
}

/// Parameters of the click-to-focus interaction
#[derive(Debug, Clone, Copy)]
pub struct FocusSettings {
    pub default_fov: f32,
    pub zoom_fov: f32,
    pub world_center: Vector3<f32>,
    pub reveal_delay: Duration,
    pub highlight_color: [f32; 3],
    pub highlight_intensity: f32,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            default_fov: 75.0,
            zoom_fov: 35.0,
            world_center: Vector3::new(0.0, 0.0, 0.0),
            reveal_delay: Duration::from_millis(3000),
            highlight_color: [1.0, 1.0, 0.0],
            highlight_intensity: 0.6,
        }
    }
}

/// The single point light the ring switches on and off
#[derive(Debug, Clone, Copy)]
pub struct LightSettings {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    /// Distance at which the light's contribution reaches zero
    pub range: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 0.0],
            color: [1.0, 1.0, 1.0],
            intensity: 40.0,
            range: 70.0,
        }
    }
}

/// Background colour cycle
#[derive(Debug, Clone, Copy)]
pub struct SkySettings {
    /// Background before the first animated frame, sRGB
    pub initial_color: [f32; 3],
    pub hue_step: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            initial_color: [
                0xFF as f32 / 255.0,
                0x5F as f32 / 255.0,
                0x22 as f32 / 255.0,
            ],
            hue_step: 0.0005,
            saturation: 0.6,
            lightness: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_showcase_constants() {
        let config = ViewerConfig::default();
        assert_eq!(config.focus.default_fov, 75.0);
        assert_eq!(config.focus.zoom_fov, 35.0);
        assert_eq!(config.focus.reveal_delay, Duration::from_secs(3));
        assert_eq!(config.camera.min_distance, 2.0);
        assert_eq!(config.camera.max_distance, 8.0);
        assert_eq!(config.light.intensity, 40.0);
        assert_eq!(config.light.range, 70.0);
        assert!((config.ring_spin.0 - 0.005).abs() < 1e-7);
        assert!((config.ring_spin.1 - 0.007).abs() < 1e-7);
    }

    #[test]
    fn env_overrides_apply() {
        let config = ViewerConfig::default().with_env_overrides(|key| match key {
            RESOURCES_ENV => Some("/tmp/models".to_string()),
            REVEAL_DELAY_ENV => Some("1500".to_string()),
            _ => None,
        });
        assert_eq!(config.resources_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.focus.reveal_delay, Duration::from_millis(1500));
    }

    #[test]
    fn malformed_delay_is_ignored() {
        let config = ViewerConfig::default().with_env_overrides(|key| match key {
            REVEAL_DELAY_ENV => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.focus.reveal_delay, Duration::from_secs(3));
    }
}
