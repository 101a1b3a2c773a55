//! # Scene Management Module
//!
//! Scene graph, model loading and vertex data.
//!
//! ## Key Components
//!
//! - [`Scene`] - Node arena plus materials, light and camera
//! - [`SceneNode`] - Named node with a local transform and meshes
//! - [`loader`] - glTF/GLB and OBJ import into the graph
//! - [`Vertex3D`] - GPU vertex format
//!
//! Every loaded file becomes one top-level node (a direct child of
//! [`Scene::ROOT`]); picking and selection operate on those.

pub mod loader;
pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use node::{DrawMesh, Mesh, MeshInstance, NodeId, SceneNode, Transform};
pub use scene::{Scene, SceneStatistics};
pub use vertex::Vertex3D;
