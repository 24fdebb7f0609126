use explore_core::Aabb;
use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumPlane {
    pub normal: Vec3,
    pub distance: f32,
}

impl FrustumPlane {
    fn from_row(row: Vec4) -> Self {
        let normal = row.truncate();
        let length = normal.length();
        if length <= f32::EPSILON {
            // 退化した面は全空間を内側とみなす
            return Self {
                normal: Vec3::ZERO,
                distance: 0.0,
            };
        }
        Self {
            normal: normal / length,
            distance: row.w / length,
        }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// View-Projection行列から抽出した6平面
/// glamの `perspective_rh`（深度 0..1）を前提にする
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [FrustumPlane; 6],
}

impl Frustum {
    pub fn from_view_proj(m: Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        let planes = [
            // Left
            FrustumPlane::from_row(r3 + r0),
            // Right
            FrustumPlane::from_row(r3 - r0),
            // Bottom
            FrustumPlane::from_row(r3 + r1),
            // Top
            FrustumPlane::from_row(r3 - r1),
            // Near (z >= 0)
            FrustumPlane::from_row(r2),
            // Far
            FrustumPlane::from_row(r3 - r2),
        ];
        Self { planes }
    }

    /// 各平面に対して法線方向に最も進んだ頂点（p-vertex）で判定
    /// 保守的なテストで、角付近では偽陽性があり得る
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if aabb.is_empty() {
            return false;
        }
        for plane in &self.planes {
            let p = Vec3::select(plane.normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            if plane.signed_distance(p) < 0.0 {
                return false; // completely outside
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_down_neg_z() -> Frustum {
        let proj = Mat4::perspective_rh(60.0_f32.to_radians(), 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        Frustum::from_view_proj(proj * view)
    }

    #[test]
    fn test_small_box_inside_and_outside() {
        let f = looking_down_neg_z();
        let at = |z: f32| Aabb::from_center_size(Vec3::new(0.0, 0.0, z), Vec3::splat(0.01));
        assert!(f.intersects_aabb(&at(-10.0)));
        assert!(!f.intersects_aabb(&at(10.0)));
        assert!(!f.intersects_aabb(&at(-200.0)));
        assert!(!f.intersects_aabb(&at(-0.05)));
    }

    #[test]
    fn test_aabb_straddling_edge() {
        let f = looking_down_neg_z();
        // half of the box pokes into the view on the right side
        let aabb = Aabb::from_center_size(Vec3::new(6.0, 0.0, -10.0), Vec3::splat(2.0));
        assert!(f.intersects_aabb(&aabb));
    }

    #[test]
    fn test_aabb_behind_camera() {
        let f = looking_down_neg_z();
        let aabb = Aabb::from_center_size(Vec3::new(0.0, 0.0, 5.0), Vec3::ONE);
        assert!(!f.intersects_aabb(&aabb));
        assert!(!f.intersects_aabb(&Aabb::EMPTY));
    }
}
