//! Vitrine
//!
//! An interactive 3D showcase: a scene of numbered objects around a spinning
//! ring under a colour-cycling sky. Clicking a numbered object highlights it,
//! zooms the camera in and reveals its information after a short delay;
//! clicking the ring toggles the light; the mouse wheel returns to the
//! overview.

pub mod app;
pub mod assets;
pub mod config;
pub mod content;
pub mod error;
pub mod gfx;
pub mod interaction;
pub mod ui;
pub mod wgpu_utils;

pub use app::ViewerApp;
pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
