//! # Graphics Module
//!
//! Everything between the scene description and the pixels on screen.
//!
//! - **Camera** ([`camera`]) - damped orbit camera with distance and polar
//!   limits, eased field of view, and the pointer controller driving it
//! - **Picking** ([`picking`]) - screen-to-ray conversion and nearest-hit
//!   ray casting against scene meshes
//! - **Rendering** ([`rendering`]) - surface, pipelines and the forward pass
//! - **Resources** ([`resources`]) - materials, global uniforms, point light
//! - **Scene** ([`scene`]) - node hierarchy and model loading
//! - **Sky** ([`sky`]) - hue-cycling background colour

pub mod camera;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod sky;

pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
