//! ジオメトリ基本型
//!
//! バウンディングボックス、三角形、メッシュデータ

mod aabb;
mod mesh;

pub use aabb::Aabb;
pub use mesh::{MeshData, Triangle};
