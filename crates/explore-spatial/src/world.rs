//! Collision world owned by the movement controller
//!
//! Bundles the geometry registry, primitive obstacles and settings, and
//! knows which scene is active. Only the open world has physical geometry;
//! in the gallery and the model viewer every query returns its neutral value.

use explore_core::SceneNode;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collider::{Agent, CollisionStrategy, CompositeCollider, MeshCollider};
use crate::error::Result;
use crate::ground::GroundResolver;
use crate::layout::WorldLayout;
use crate::primitives::{ObstacleSet, PrimitiveObstacle};
use crate::registry::{GeometryRegistry, RegistryStats};
use crate::settings::SpatialSettings;

/// 現在表示中のシーン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SceneContext {
    #[default]
    World,
    Gallery,
    ModelViewer,
}

impl SceneContext {
    pub fn has_physics(self) -> bool {
        self == SceneContext::World
    }
}

#[derive(Debug, Clone)]
pub struct CollisionWorld {
    settings: SpatialSettings,
    registry: GeometryRegistry,
    obstacles: ObstacleSet,
    scene: SceneContext,
}

impl CollisionWorld {
    pub fn new(settings: SpatialSettings) -> Self {
        Self {
            registry: GeometryRegistry::new(settings.collider),
            obstacles: ObstacleSet::new(),
            scene: SceneContext::World,
            settings,
        }
    }

    pub fn settings(&self) -> &SpatialSettings {
        &self.settings
    }

    pub fn registry(&self) -> &GeometryRegistry {
        &self.registry
    }

    pub fn obstacles(&self) -> &ObstacleSet {
        &self.obstacles
    }

    pub fn scene(&self) -> SceneContext {
        self.scene
    }

    pub fn set_scene(&mut self, scene: SceneContext) {
        if self.scene != scene {
            log::debug!("scene context {:?} -> {:?}", self.scene, scene);
        }
        self.scene = scene;
    }

    /// モデルを登録（失敗はログのみ）
    pub fn register(&mut self, id: &str, source: Option<&SceneNode>) {
        self.registry.register(id, source);
    }

    pub fn try_register(&mut self, id: &str, source: Option<&SceneNode>) -> Result<()> {
        self.registry.try_register(id, source).map(|_| ())
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        self.registry.unregister(id)
    }

    pub fn place_obstacle(&mut self, id: impl Into<String>, obstacle: PrimitiveObstacle) {
        self.obstacles.insert(id, obstacle);
    }

    pub fn remove_obstacle(&mut self, id: &str) -> bool {
        self.obstacles.remove(id).is_some()
    }

    /// レイアウトの衝突形状で障害物を置き換える。追加した数を返す
    pub fn load_layout(&mut self, layout: &WorldLayout) -> usize {
        self.obstacles.clear();
        for (id, obstacle) in layout.obstacles() {
            self.obstacles.insert(id, obstacle);
        }
        log::info!(
            "loaded world layout v{} ({} objects, {} collision shapes)",
            layout.version,
            layout.objects.len(),
            self.obstacles.len()
        );
        self.obstacles.len()
    }

    /// 設定のエージェントで衝突判定
    pub fn would_collide(&self, current: Vec3, candidate: Vec3) -> bool {
        self.would_collide_with(current, candidate, self.settings.agent.radius)
    }

    /// 半径を指定して衝突判定
    pub fn would_collide_with(&self, current: Vec3, candidate: Vec3, radius: f32) -> bool {
        if !self.scene.has_physics() {
            return false;
        }
        if !current.is_finite() || !candidate.is_finite() {
            return false;
        }
        let agent = Agent {
            radius,
            ..self.settings.agent
        };
        // メッシュ → プリミティブの順
        let mesh = MeshCollider::new(&self.registry);
        CompositeCollider::new()
            .with(&mesh)
            .with(&self.obstacles)
            .would_collide(current, candidate, &agent)
    }

    pub fn ground_level_at(&self, position: Vec3) -> f32 {
        if !self.scene.has_physics() {
            return 0.0;
        }
        GroundResolver::new(self.settings.ground)
            .with(&self.registry)
            .with(&self.obstacles)
            .ground_level_at(position)
    }

    /// 軸ごとに移動を解決し、接地高さを返す
    /// X を先に、Z は更新後の X 位置から判定する
    pub fn slide_move(&self, current: Vec3, delta: Vec3) -> (Vec3, f32) {
        let mut position = current;

        let step_x = Vec3::new(position.x + delta.x, position.y, position.z);
        if delta.x != 0.0 && !self.would_collide(position, step_x) {
            position = step_x;
        }
        let step_z = Vec3::new(position.x, position.y, position.z + delta.z);
        if delta.z != 0.0 && !self.would_collide(position, step_z) {
            position = step_z;
        }

        let ground = self.ground_level_at(position);
        (position, ground)
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new(SpatialSettings::default())
    }
}
