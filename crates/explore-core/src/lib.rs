pub mod components;
pub mod geometry;
pub mod math;
pub mod scene;

// Re-exports
pub use components::{Name, Transform};
pub use geometry::{Aabb, MeshData, Triangle};
pub use scene::{MaterialFlags, NodeKind, NodeTag, NodeVisit, SceneNode, ShapeHint};
