//! Discrete movement collision
//!
//! The movement controller asks, per axis, whether stepping from `current`
//! to `candidate` would collide. Each source of solid geometry is a
//! [`CollisionStrategy`]; [`CompositeCollider`] chains them.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::picking::Ray;
use crate::primitives::ObstacleSet;
use crate::registry::{GeometryRegistry, RegisteredCollider};
use crate::settings::ColliderSettings;

/// 移動するエージェント（円柱近似）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Agent {
    /// 水平方向の衝突半径
    pub radius: f32,
    /// 縦方向の重なり判定に使う身長
    pub height: f32,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            radius: 0.4,
            height: 2.0,
        }
    }
}

/// 衝突判定の差し替え可能な一段
pub trait CollisionStrategy {
    /// `current` から `candidate` への移動が衝突するか
    fn would_collide(&self, current: Vec3, candidate: Vec3, agent: &Agent) -> bool;
}

/// 登録済みメッシュに対するレイ判定
pub struct MeshCollider<'a> {
    registry: &'a GeometryRegistry,
}

impl<'a> MeshCollider<'a> {
    pub fn new(registry: &'a GeometryRegistry) -> Self {
        Self { registry }
    }

    fn settings(&self) -> &ColliderSettings {
        self.registry.settings()
    }

    fn collides_with(&self, collider: &RegisteredCollider, current: Vec3, candidate: Vec3, agent: &Agent) -> bool {
        if collider.is_empty() {
            return false;
        }

        let settings = self.settings();
        let effective_radius = agent.radius + collider.buffer_margin;
        if !collider.bounds.expanded(effective_radius).contains(candidate) {
            return false;
        }

        if Self::encloses(collider, candidate, agent, settings) {
            return true;
        }

        let ray_y = current.y + settings.ray_height;
        let threshold = effective_radius * settings.closeness_factor;

        // 衝突円の周上から中心へ向けたレイ
        for dir in settings.sampling.directions() {
            let mut origin = candidate + *dir * effective_radius;
            origin.y = ray_y;
            let ray = Ray {
                origin,
                direction: -*dir,
            };
            if collider
                .meshes
                .iter()
                .filter(|m| ray.intersect_aabb(&m.bounds).is_some_and(|t| t <= threshold))
                .any(|m| ray.nearest_hit(&m.triangles, threshold).is_some())
            {
                return true;
            }
        }

        // 移動方向のレイ
        let movement = candidate - current;
        let move_distance = movement.length();
        let origin = Vec3::new(current.x, ray_y, current.z);
        if let Some(ray) = Ray::try_new(origin, movement) {
            let reach = move_distance + effective_radius;
            let blocked = collider
                .meshes
                .iter()
                .any(|m| ray.nearest_hit(&m.triangles, reach).is_some_and(|hit| hit.distance < reach));
            if blocked {
                return true;
            }
        }

        false
    }

    /// 候補位置がメッシュの内側に入り込んでいるか
    /// 体の高さとメッシュの高さが重なる中間の高さから外向きにレイを飛ばし、
    /// 全方向で面に当たれば内側とみなす
    fn encloses(collider: &RegisteredCollider, candidate: Vec3, agent: &Agent, settings: &ColliderSettings) -> bool {
        let low = candidate.y.max(collider.bounds.min.y);
        let high = (candidate.y + agent.height).min(collider.bounds.max.y);
        if low >= high {
            return false;
        }
        let origin = Vec3::new(candidate.x, (low + high) * 0.5, candidate.z);

        settings.sampling.directions().iter().all(|dir| {
            let ray = Ray {
                origin,
                direction: *dir,
            };
            collider
                .meshes
                .iter()
                .any(|m| ray.nearest_hit(&m.triangles, f32::MAX).is_some())
        })
    }
}

impl CollisionStrategy for MeshCollider<'_> {
    fn would_collide(&self, current: Vec3, candidate: Vec3, agent: &Agent) -> bool {
        self.registry
            .iter()
            .any(|collider| self.collides_with(collider, current, candidate, agent))
    }
}

impl CollisionStrategy for ObstacleSet {
    fn would_collide(&self, current: Vec3, candidate: Vec3, agent: &Agent) -> bool {
        self.iter()
            .any(|(_, obstacle)| obstacle.blocks(current, candidate, agent))
    }
}

/// 複数の判定を順に評価し、いずれかが衝突すれば衝突
#[derive(Default)]
pub struct CompositeCollider<'a> {
    strategies: Vec<&'a dyn CollisionStrategy>,
}

impl<'a> CompositeCollider<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, strategy: &'a dyn CollisionStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn push(&mut self, strategy: &'a dyn CollisionStrategy) {
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl CollisionStrategy for CompositeCollider<'_> {
    fn would_collide(&self, current: Vec3, candidate: Vec3, agent: &Agent) -> bool {
        self.strategies
            .iter()
            .any(|s| s.would_collide(current, candidate, agent))
    }
}
