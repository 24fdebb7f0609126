pub mod camera;
pub mod classify;
pub mod collider;
pub mod error;
pub mod frustum;
pub mod ground;
pub mod highlight;
pub mod interaction;
pub mod layout;
pub mod picking;
pub mod primitives;
pub mod registry;
pub mod settings;
pub mod visibility;
pub mod world;

pub use camera::Camera;
pub use classify::{Classification, classify};
pub use collider::{Agent, CollisionStrategy, CompositeCollider, MeshCollider};
pub use error::SpatialError;
pub use frustum::Frustum;
pub use ground::{GroundResolver, SupportSurface};
pub use highlight::{HighlightDiff, HighlightTracker};
pub use interaction::{
    CategoryCutoffs, InspectHit, InteractionCandidate, InteractionCategory, InteractionHit,
    InteractionRaycaster,
};
pub use layout::WorldLayout;
pub use picking::{Ray, RayHit};
pub use primitives::{ObstacleSet, ObstacleShape, PrimitiveObstacle};
pub use registry::{ColliderMesh, GeometryRegistry, RegisteredCollider, RegistryStats};
pub use settings::{
    ColliderSettings, GroundSettings, InteractionSettings, RaySampling, SpatialSettings,
    VisibilitySettings,
};
pub use visibility::{OcclusionPlane, Viewport, VisibilityQuery, VisibilityTarget, VisionWindow};
pub use world::{CollisionWorld, SceneContext};

// Re-export shared types for consistent version usage
pub use explore_core::{Aabb, MeshData, SceneNode, Transform, Triangle};
pub use glam;
