//! GPU resource management
//!
//! Materials, global uniforms and the depth buffer.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, GlobalUBOContent, PointLight};
pub use material::{Material, MaterialId, MaterialManager};
pub use texture_resource::{DepthTexture, TextureResource};
