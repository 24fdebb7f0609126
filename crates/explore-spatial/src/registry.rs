//! Geometry registry
//!
//! Per-entity snapshots of world-space triangles. Entries are built once at
//! registration from the collidable meshes of a scene node and never change
//! until the id is registered again or removed.

use std::collections::HashMap;

use explore_core::{Aabb, SceneNode, Triangle};
use glam::Mat4;
use serde::Serialize;

use crate::classify::classify;
use crate::error::{Result, SpatialError};
use crate::settings::ColliderSettings;

/// 1メッシュ分のワールド座標三角形
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderMesh {
    pub triangles: Vec<Triangle>,
    pub bounds: Aabb,
}

impl ColliderMesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        let bounds = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| acc.union(&t.bounds()));
        Self { triangles, bounds }
    }
}

/// 登録済みコライダー
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredCollider {
    pub id: String,
    pub meshes: Vec<ColliderMesh>,
    /// 全メッシュの合成ボックス（ジオメトリが無ければEMPTY）
    pub bounds: Aabb,
    pub buffer_margin: f32,
}

impl RegisteredCollider {
    pub fn new(id: impl Into<String>, meshes: Vec<ColliderMesh>, buffer_margin: f32) -> Self {
        let bounds = meshes.iter().fold(Aabb::EMPTY, |acc, m| acc.union(&m.bounds));
        Self {
            id: id.into(),
            meshes,
            bounds,
            buffer_margin: buffer_margin.max(0.0),
        }
    }

    /// 衝突に使えるジオメトリが無い
    pub fn is_empty(&self) -> bool {
        self.bounds.is_degenerate()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangles.len()).sum()
    }

    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> + '_ {
        self.meshes.iter().flat_map(|m| m.triangles.iter())
    }
}

/// デバッグ表示用の集計
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub ids: Vec<String>,
    pub collider_count: usize,
    pub mesh_count: usize,
    pub triangle_count: usize,
}

/// ジオメトリレジストリ
#[derive(Debug, Clone)]
pub struct GeometryRegistry {
    colliders: HashMap<String, RegisteredCollider>,
    settings: ColliderSettings,
}

impl GeometryRegistry {
    pub fn new(settings: ColliderSettings) -> Self {
        Self {
            colliders: HashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ColliderSettings {
        &self.settings
    }

    /// ノードを登録する。失敗はログに出して何もしない
    pub fn register(&mut self, id: &str, source: Option<&SceneNode>) {
        if let Err(err) = self.try_register(id, source) {
            log::warn!("collider registration skipped: {}", err);
        }
    }

    pub fn try_register(&mut self, id: &str, source: Option<&SceneNode>) -> Result<&RegisteredCollider> {
        self.try_register_with_margin(id, source, self.settings.buffer_margin)
    }

    /// 余白を指定して登録（既存のidは置き換え）
    pub fn try_register_with_margin(
        &mut self,
        id: &str,
        source: Option<&SceneNode>,
        buffer_margin: f32,
    ) -> Result<&RegisteredCollider> {
        if id.is_empty() {
            return Err(SpatialError::EmptyId);
        }
        let source = source.ok_or_else(|| SpatialError::MissingSource(id.to_string()))?;

        let max_extent = self.settings.max_collider_extent;
        let mut finite = true;
        let mut meshes = Vec::new();
        source.walk(Mat4::IDENTITY, &mut |visit| {
            if !visit.node.has_finite_transform() {
                finite = false;
                return;
            }
            if !classify(&visit, max_extent).is_collidable() {
                return;
            }
            if let Some(geometry) = visit.node.geometry() {
                let triangles: Vec<Triangle> = geometry
                    .world_triangles(visit.world)
                    .into_iter()
                    .filter(|t| !t.is_degenerate())
                    .collect();
                if !triangles.is_empty() {
                    meshes.push(ColliderMesh::new(triangles));
                }
            }
        });
        if !finite {
            return Err(SpatialError::NonFiniteTransform { id: id.to_string() });
        }

        let collider = RegisteredCollider::new(id, meshes, buffer_margin);
        log::debug!(
            "registered collider '{}' ({} meshes, {} triangles)",
            id,
            collider.meshes.len(),
            collider.triangle_count()
        );
        self.colliders.insert(id.to_string(), collider);
        Ok(&self.colliders[id])
    }

    /// 事前に組み立てたコライダーを直接登録
    pub fn insert(&mut self, collider: RegisteredCollider) {
        self.colliders.insert(collider.id.clone(), collider);
    }

    /// 削除（未知のidは何もしない）
    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.colliders.remove(id).is_some();
        if removed {
            log::debug!("unregistered collider '{}'", id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredCollider> {
        self.colliders.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.colliders.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredCollider> {
        self.colliders.values()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    pub fn stats(&self) -> RegistryStats {
        let mut ids: Vec<String> = self.colliders.keys().cloned().collect();
        ids.sort();
        RegistryStats {
            ids,
            collider_count: self.colliders.len(),
            mesh_count: self.iter().map(|c| c.meshes.len()).sum(),
            triangle_count: self.iter().map(|c| c.triangle_count()).sum(),
        }
    }
}

impl Default for GeometryRegistry {
    fn default() -> Self {
        Self::new(ColliderSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use explore_core::{MaterialFlags, MeshData, Transform};
    use glam::Vec3;

    fn crate_at(position: Vec3) -> SceneNode {
        SceneNode::group("crate")
            .with_transform(Transform::from_position(position))
            .with_child(SceneNode::mesh("body", MeshData::cuboid(Vec3::splat(2.0))))
    }

    #[test]
    fn test_register_world_space() {
        let mut registry = GeometryRegistry::default();
        let collider = registry
            .try_register("crate-1", Some(&crate_at(Vec3::new(10.0, 1.0, 8.0))))
            .unwrap();

        assert_eq!(collider.meshes.len(), 1);
        assert_eq!(collider.triangle_count(), 12);
        assert_eq!(collider.bounds.min, Vec3::new(9.0, 0.0, 7.0));
        assert_eq!(collider.bounds.max, Vec3::new(11.0, 2.0, 9.0));
        assert_eq!(collider.buffer_margin, 0.08);
    }

    #[test]
    fn test_bounds_contain_all_triangles() {
        let mut registry = GeometryRegistry::default();
        let node = crate_at(Vec3::new(1.0, 2.0, 3.0))
            .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).with_euler(0.3, 0.7, 0.0));
        let collider = registry.try_register("rot", Some(&node)).unwrap();

        for t in collider.triangles() {
            for p in [t.a, t.b, t.c] {
                assert!(collider.bounds.expanded(1e-4).contains(p));
            }
        }
    }

    #[test]
    fn test_missing_source_is_noop() {
        let mut registry = GeometryRegistry::default();
        registry.register("ghost", None);
        assert!(registry.is_empty());
        assert!(matches!(
            registry.try_register("ghost", None),
            Err(SpatialError::MissingSource(_))
        ));
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut registry = GeometryRegistry::default();
        assert!(matches!(
            registry.try_register("", Some(&crate_at(Vec3::ZERO))),
            Err(SpatialError::EmptyId)
        ));
    }

    #[test]
    fn test_non_finite_transform_rejected() {
        let mut registry = GeometryRegistry::default();
        let node = crate_at(Vec3::new(f32::NAN, 0.0, 0.0));
        registry.register("nan", Some(&node));
        assert!(!registry.contains("nan"));
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut registry = GeometryRegistry::default();
        let node = crate_at(Vec3::new(2.0, 0.0, 2.0));
        registry.register("a", Some(&node));
        let first = registry.get("a").cloned().unwrap();
        registry.register("a", Some(&node));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a"), Some(&first));
    }

    #[test]
    fn test_excluded_children_not_registered() {
        let node = crate_at(Vec3::ZERO)
            .with_child(SceneNode::mesh("grid_helper", MeshData::cuboid(Vec3::ONE)))
            .with_child(
                SceneNode::mesh("wire", MeshData::cuboid(Vec3::ONE)).with_material(MaterialFlags {
                    wireframe: true,
                    ..MaterialFlags::default()
                }),
            );
        let mut registry = GeometryRegistry::default();
        let collider = registry.try_register("crate", Some(&node)).unwrap();
        assert_eq!(collider.meshes.len(), 1);
    }

    #[test]
    fn test_node_without_geometry_registers_empty() {
        let mut registry = GeometryRegistry::default();
        let collider = registry.try_register("empty", Some(&SceneNode::group("empty"))).unwrap();
        assert!(collider.is_empty());
        assert!(collider.bounds.is_empty());
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let mut registry = GeometryRegistry::default();
        registry.register("a", Some(&crate_at(Vec3::ZERO)));
        assert!(!registry.unregister("b"));
        assert!(registry.unregister("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_stats() {
        let mut registry = GeometryRegistry::default();
        registry.register("b", Some(&crate_at(Vec3::ZERO)));
        registry.register("a", Some(&crate_at(Vec3::X * 5.0)));
        let stats = registry.stats();
        assert_eq!(stats.ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(stats.mesh_count, 2);
        assert_eq!(stats.triangle_count, 24);
    }
}
