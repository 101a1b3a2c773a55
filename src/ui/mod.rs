//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the scene.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture and
//!   texture upload
//! - [`InfoPanel`] - the information panel revealed for a focused object
//!
//! When the UI wants the pointer, clicks and wheel gestures do not reach the
//! camera or picking.

pub mod info_panel;
pub mod manager;

pub use info_panel::InfoPanel;
pub use manager::UiManager;
