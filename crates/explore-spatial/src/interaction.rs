//! Screen-center interaction raycasts
//!
//! One ray from the camera through the middle of the screen, tested against
//! categorized candidates. Categories are scanned in priority order and the
//! first one with a hit under its cutoff wins.

use explore_core::{Aabb, SceneNode, Triangle};
use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::classify::classify;
use crate::picking::Ray;

/// インタラクション対象の種類（宣言順が優先順位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionCategory {
    Key,
    Door,
    Paper,
    Scroll,
    Book,
    Tombstone,
    Portal,
}

impl InteractionCategory {
    /// 優先順
    pub const ALL: [InteractionCategory; 7] = [
        InteractionCategory::Key,
        InteractionCategory::Door,
        InteractionCategory::Paper,
        InteractionCategory::Scroll,
        InteractionCategory::Book,
        InteractionCategory::Tombstone,
        InteractionCategory::Portal,
    ];
}

/// カテゴリごとの最大距離
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryCutoffs {
    pub key: f32,
    pub door: f32,
    pub paper: f32,
    pub scroll: f32,
    pub book: f32,
    pub tombstone: f32,
    pub portal: f32,
}

impl Default for CategoryCutoffs {
    fn default() -> Self {
        Self {
            key: 3.0,
            door: 3.0,
            paper: 4.0,
            scroll: 4.0,
            book: 4.0,
            tombstone: 4.0,
            portal: 3.0,
        }
    }
}

impl CategoryCutoffs {
    pub fn get(&self, category: InteractionCategory) -> f32 {
        match category {
            InteractionCategory::Key => self.key,
            InteractionCategory::Door => self.door,
            InteractionCategory::Paper => self.paper,
            InteractionCategory::Scroll => self.scroll,
            InteractionCategory::Book => self.book,
            InteractionCategory::Tombstone => self.tombstone,
            InteractionCategory::Portal => self.portal,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (InteractionCategory, f32)> + '_ {
        InteractionCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// レイ判定の候補
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionCandidate {
    /// 論理的な所有者（ドアのid、ポータル名など）
    pub owner: String,
    pub category: InteractionCategory,
    pub triangles: Vec<Triangle>,
    pub bounds: Aabb,
}

impl InteractionCandidate {
    pub fn new(owner: impl Into<String>, category: InteractionCategory, triangles: Vec<Triangle>) -> Self {
        let bounds = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| acc.union(&t.bounds()));
        Self {
            owner: owner.into(),
            category,
            triangles,
            bounds,
        }
    }

    /// ノード配下の表示中メッシュをすべて候補の形状にする
    pub fn from_node(
        owner: impl Into<String>,
        category: InteractionCategory,
        node: &SceneNode,
        parent_world: Mat4,
    ) -> Self {
        let mut triangles = Vec::new();
        node.walk(parent_world, &mut |v| {
            if !v.visible {
                return;
            }
            if let Some(geometry) = v.node.geometry() {
                triangles.extend(geometry.world_triangles(v.world));
            }
        });
        Self::new(owner, category, triangles)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionHit {
    pub owner: String,
    pub category: InteractionCategory,
    pub distance: f32,
}

/// モデルビューアで開く対象
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectHit {
    pub owner: String,
    pub distance: f32,
}

pub struct InteractionRaycaster;

impl InteractionRaycaster {
    /// 優先順位付きで最も近いインタラクション対象を返す
    pub fn query_nearest_interactable(
        camera: &Camera,
        candidates: &[InteractionCandidate],
        cutoffs: &CategoryCutoffs,
    ) -> Option<InteractionHit> {
        let ray = camera.center_ray()?;

        for (category, cutoff) in cutoffs.iter() {
            let mut best: Option<(&InteractionCandidate, f32)> = None;
            for candidate in candidates.iter().filter(|c| c.category == category) {
                if ray.intersect_aabb(&candidate.bounds).is_none_or(|t| t > cutoff) {
                    continue;
                }
                let Some(hit) = ray.nearest_hit(&candidate.triangles, cutoff) else {
                    continue;
                };
                // 同距離は先に渡された候補を優先
                if best.is_none_or(|(_, d)| hit.distance < d) {
                    best = Some((candidate, hit.distance));
                }
            }
            if let Some((candidate, distance)) = best {
                return Some(InteractionHit {
                    owner: candidate.owner.clone(),
                    category,
                    distance,
                });
            }
        }
        None
    }

    /// 画面中央にある最も近い衝突対象メッシュを、ルート直下の所有ノード名で返す
    pub fn query_inspectable(
        camera: &Camera,
        root: &SceneNode,
        max_distance: f32,
        max_extent: f32,
    ) -> Option<InspectHit> {
        if !root.visible {
            return None;
        }
        let ray = camera.center_ray()?;
        let root_world = root.transform.to_matrix();
        let mut best: Option<InspectHit> = None;

        for owner in &root.children {
            owner.walk(root_world, &mut |v| {
                if !classify(&v, max_extent).is_collidable() {
                    return;
                }
                let Some(geometry) = v.node.geometry() else {
                    return;
                };
                let bounds = geometry.local_bounds().transformed(v.world);
                if ray.intersect_aabb(&bounds).is_none_or(|t| t > max_distance) {
                    return;
                }
                let triangles = geometry.world_triangles(v.world);
                let Some(hit) = ray.nearest_hit(&triangles, max_distance) else {
                    return;
                };
                if best.as_ref().is_none_or(|b| hit.distance < b.distance) {
                    let name = if owner.name.is_empty() { &v.node.name } else { &owner.name };
                    best = Some(InspectHit {
                        owner: name.to_string(),
                        distance: hit.distance,
                    });
                }
            });
        }
        best
    }
}
