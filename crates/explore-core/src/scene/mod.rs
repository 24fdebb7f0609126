//! シーングラフのスナップショット
//!
//! ホスト（three.js側）から受け取ったノードツリーをRust側で保持する

mod node;

pub use node::{MaterialFlags, NodeKind, NodeTag, NodeVisit, SceneNode, ShapeHint};
