//! Primitive obstacles
//!
//! Hand-placed boxes and upright cylinders given by dimensions. They are
//! tested in closed form instead of through triangles.

use std::collections::HashMap;

use explore_core::Aabb;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::collider::Agent;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObstacleShape {
    /// 中心 `position` の直方体（全幅）
    Box { size: Vec3 },
    /// 中心 `position` の直立円柱
    Cylinder { radius: f32, height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveObstacle {
    pub position: Vec3,
    pub shape: ObstacleShape,
}

impl PrimitiveObstacle {
    pub fn new(position: Vec3, shape: ObstacleShape) -> Self {
        Self { position, shape }
    }

    pub fn cuboid(position: Vec3, size: Vec3) -> Self {
        Self::new(position, ObstacleShape::Box { size })
    }

    pub fn cylinder(position: Vec3, radius: f32, height: f32) -> Self {
        Self::new(position, ObstacleShape::Cylinder { radius, height })
    }

    /// エディタ配置から作成
    /// 単位ジオメトリ（箱は2x2x2、円柱は半径1・高さ2）をスケールしたものとして扱う
    pub fn from_placement(position: Vec3, scale: Vec3, cylinder: bool) -> Self {
        if cylinder {
            Self::cylinder(position, scale.x, 2.0 * scale.y)
        } else {
            Self::cuboid(position, 2.0 * scale)
        }
    }

    pub fn bottom(&self) -> f32 {
        self.position.y - self.half_height()
    }

    pub fn top(&self) -> f32 {
        self.position.y + self.half_height()
    }

    fn half_height(&self) -> f32 {
        match self.shape {
            ObstacleShape::Box { size } => size.y * 0.5,
            ObstacleShape::Cylinder { height, .. } => height * 0.5,
        }
    }

    pub fn bounds(&self) -> Aabb {
        match self.shape {
            ObstacleShape::Box { size } => Aabb::from_center_size(self.position, size),
            ObstacleShape::Cylinder { radius, height } => {
                Aabb::from_center_size(self.position, Vec3::new(2.0 * radius, height, 2.0 * radius))
            }
        }
    }

    /// 足元 y から身長分の区間が縦方向に重なるか
    fn overlaps_vertically(&self, feet_y: f32, agent: &Agent) -> bool {
        feet_y < self.top() && feet_y + agent.height > self.bottom()
    }

    /// 水平方向の中心距離
    fn horizontal_distance(&self, point: Vec3) -> f32 {
        Vec2::new(point.x - self.position.x, point.z - self.position.z).length()
    }

    /// 移動を阻むか
    /// 中心から遠ざかる移動（距離が減らない移動）は常に許可する
    pub fn blocks(&self, current: Vec3, candidate: Vec3, agent: &Agent) -> bool {
        let current_distance = self.horizontal_distance(current);
        let candidate_distance = self.horizontal_distance(candidate);
        if candidate_distance >= current_distance {
            return false;
        }
        if !self.overlaps_vertically(candidate.y, agent) {
            return false;
        }

        match self.shape {
            ObstacleShape::Box { size } => {
                let half = size * 0.5;
                let r = agent.radius;
                candidate.x + r > self.position.x - half.x
                    && candidate.x - r < self.position.x + half.x
                    && candidate.z + r > self.position.z - half.z
                    && candidate.z - r < self.position.z + half.z
            }
            ObstacleShape::Cylinder { radius, .. } => candidate_distance < radius + agent.radius,
        }
    }

    /// 水平投影の内側か（境界を含む）
    pub fn covers(&self, point: Vec3) -> bool {
        match self.shape {
            ObstacleShape::Box { .. } => self.bounds().contains_xz(point),
            ObstacleShape::Cylinder { radius, .. } => self.horizontal_distance(point) <= radius,
        }
    }

    /// `position` を支える上面の高さ
    /// 足元が底面より上、かつ上面から `tolerance` 以内の場合のみ
    pub fn support_height(&self, position: Vec3, tolerance: f32) -> Option<f32> {
        if !self.covers(position) {
            return None;
        }
        let top = self.top();
        (position.y >= self.bottom() && position.y <= top + tolerance).then_some(top)
    }

    pub fn is_finite(&self) -> bool {
        let dims_finite = match self.shape {
            ObstacleShape::Box { size } => size.is_finite(),
            ObstacleShape::Cylinder { radius, height } => radius.is_finite() && height.is_finite(),
        };
        self.position.is_finite() && dims_finite
    }
}

/// idで管理するプリミティブ障害物の集合
#[derive(Debug, Clone, Default)]
pub struct ObstacleSet {
    obstacles: HashMap<String, PrimitiveObstacle>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加（同じidは置き換え）。非有限値を含むものは無視
    pub fn insert(&mut self, id: impl Into<String>, obstacle: PrimitiveObstacle) {
        let id = id.into();
        if !obstacle.is_finite() {
            log::warn!("obstacle '{}' has non-finite dimensions, ignored", id);
            return;
        }
        self.obstacles.insert(id, obstacle);
    }

    pub fn remove(&mut self, id: &str) -> Option<PrimitiveObstacle> {
        self.obstacles.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&PrimitiveObstacle> {
        self.obstacles.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PrimitiveObstacle)> {
        self.obstacles.iter().map(|(id, o)| (id.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }
}
