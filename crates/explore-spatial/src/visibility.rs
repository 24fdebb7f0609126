//! Screen-space visibility
//!
//! A target counts as visible in a window when its world box touches the
//! camera frustum, a mirror plane does not hide it, and its projected center
//! lands inside the window grown by its apparent radius.

use explore_core::{Aabb, SceneNode};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::frustum::Frustum;
use crate::settings::VisibilitySettings;

/// モバイル判定の閾値（px）
const MOBILE_BREAKPOINT: f32 = 768.0;
const SCAN_WINDOW_DESKTOP: Vec2 = Vec2::new(500.0, 400.0);
const SCAN_WINDOW_MOBILE: Vec2 = Vec2::new(400.0, 250.0);

/// 描画領域のサイズ（px）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn is_mobile(&self) -> bool {
        self.width <= MOBILE_BREAKPOINT || self.height <= MOBILE_BREAKPOINT
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// 画面上の判定矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionWindow {
    pub viewport: Viewport,
    pub center: Vec2,
    pub size: Vec2,
}

impl VisionWindow {
    /// 画面全体
    pub fn full_screen(viewport: Viewport) -> Self {
        Self::centered(viewport, Vec2::new(viewport.width, viewport.height))
    }

    /// 画面中央に置いた矩形
    pub fn centered(viewport: Viewport, size: Vec2) -> Self {
        Self {
            viewport,
            center: Vec2::new(viewport.width, viewport.height) * 0.5,
            size,
        }
    }

    /// スキャンビジョン用の矩形（モバイルでは小さくなる）
    pub fn scan(viewport: Viewport) -> Self {
        let size = if viewport.is_mobile() {
            SCAN_WINDOW_MOBILE
        } else {
            SCAN_WINDOW_DESKTOP
        };
        Self::centered(viewport, size)
    }

    /// `extra` だけ広げた矩形に点が入るか
    pub fn contains(&self, pixel: Vec2, extra: f32) -> bool {
        let half = self.size * 0.5 + Vec2::splat(extra);
        let d = (pixel - self.center).abs();
        d.x <= half.x && d.y <= half.y
    }
}

/// 判定対象（呼び出しごとに現在のワールド変換から作る）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityTarget {
    pub position: Vec3,
    pub bounds: Aabb,
}

impl VisibilityTarget {
    pub fn new(position: Vec3, bounds: Aabb) -> Self {
        Self { position, bounds }
    }

    pub fn from_bounds(bounds: Aabb) -> Self {
        Self::new(bounds.center(), bounds)
    }

    pub fn from_node(node: &SceneNode, parent_world: Mat4) -> Self {
        let world = node.transform.world_matrix(parent_world);
        Self::new(world.transform_point3(Vec3::ZERO), node.world_bounds(parent_world))
    }
}

/// 反射面（鏡）による遮蔽
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OcclusionPlane {
    pub position: Vec3,
    /// 鏡の表側を向く法線
    pub normal: Vec3,
    /// 対象が裏側にあるとみなす距離
    pub behind_margin: f32,
    /// カメラが表側にあるとみなす距離
    pub front_margin: f32,
    /// 視線と鏡方向の内積の下限
    pub facing_threshold: f32,
    /// 面に沿った方向のカメラ距離の上限
    pub max_lateral_distance: f32,
}

impl Default for OcclusionPlane {
    fn default() -> Self {
        Self {
            position: Vec3::new(3.0, 1.0, -12.0),
            normal: Vec3::Z,
            behind_margin: 0.5,
            front_margin: 0.5,
            facing_threshold: 0.5,
            max_lateral_distance: 15.0,
        }
    }
}

impl OcclusionPlane {
    /// カメラから見て対象が鏡の裏に隠れるか
    pub fn hides(&self, target: Vec3, camera: &Camera) -> bool {
        let Some(normal) = self.normal.try_normalize() else {
            return false;
        };

        let target_offset = (target - self.position).dot(normal);
        if target_offset >= -self.behind_margin {
            return false;
        }

        let camera_relative = camera.position - self.position;
        let camera_offset = camera_relative.dot(normal);
        if camera_offset <= self.front_margin {
            return false;
        }

        let Some(to_plane) = (self.position - camera.position).try_normalize() else {
            return false;
        };
        if camera.forward().dot(to_plane) <= self.facing_threshold {
            return false;
        }

        let lateral = camera_relative - normal * camera_offset;
        lateral.length() < self.max_lateral_distance
    }
}

/// 可視判定
/// フラスタムは最後に使ったView-Projection行列とともにキャッシュする
#[derive(Debug, Clone)]
pub struct VisibilityQuery {
    settings: VisibilitySettings,
    cached: Option<(Mat4, Frustum)>,
}

impl VisibilityQuery {
    pub fn new(settings: VisibilitySettings) -> Self {
        Self {
            settings,
            cached: None,
        }
    }

    pub fn settings(&self) -> &VisibilitySettings {
        &self.settings
    }

    fn frustum(&mut self, camera: &Camera) -> Frustum {
        let view_proj = camera.build_view_projection_matrix();
        match self.cached {
            Some((m, frustum)) if m == view_proj => frustum,
            _ => {
                let frustum = Frustum::from_view_proj(view_proj);
                self.cached = Some((view_proj, frustum));
                frustum
            }
        }
    }

    pub fn is_behind_occlusion_plane(&self, target: &VisibilityTarget, camera: &Camera) -> bool {
        if !camera.is_configured() {
            return false;
        }
        self.settings
            .occlusion_plane
            .is_some_and(|plane| plane.hides(target.position, camera))
    }

    pub fn is_visible_in_window(&mut self, target: &VisibilityTarget, camera: &Camera, window: &VisionWindow) -> bool {
        if !camera.is_configured() || !window.viewport.is_valid() {
            return false;
        }
        if !self.frustum(camera).intersects_aabb(&target.bounds) {
            return false;
        }
        if self.is_behind_occlusion_plane(target, camera) {
            return false;
        }

        let ndc = camera.project(target.bounds.center());
        if ndc.z >= 1.0 {
            return false;
        }

        let viewport = window.viewport;
        let pixel = Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width,
            (-ndc.y + 1.0) * 0.5 * viewport.height,
        );
        let radius = target.bounds.size().length() * 0.5;
        window.contains(pixel, radius * self.settings.apparent_radius_scale)
    }
}

impl Default for VisibilityQuery {
    fn default() -> Self {
        Self::new(VisibilitySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use explore_core::{MeshData, Transform};

    fn small_box(center: Vec3) -> VisibilityTarget {
        VisibilityTarget::from_bounds(Aabb::from_center_size(center, Vec3::splat(0.2)))
    }

    fn hd() -> Viewport {
        Viewport::new(1920.0, 1080.0)
    }

    #[test]
    fn test_scan_window_sizes() {
        assert_eq!(VisionWindow::scan(hd()).size, Vec2::new(500.0, 400.0));
        assert_eq!(VisionWindow::scan(Viewport::new(1024.0, 700.0)).size, Vec2::new(400.0, 250.0));
        assert_eq!(VisionWindow::scan(Viewport::new(390.0, 844.0)).size, Vec2::new(400.0, 250.0));
        assert_eq!(VisionWindow::scan(hd()).center, Vec2::new(960.0, 540.0));
    }

    #[test]
    fn test_visible_straight_ahead() {
        let camera = Camera::new(hd().aspect());
        let mut query = VisibilityQuery::default();
        let target = small_box(Vec3::ZERO);
        assert!(query.is_visible_in_window(&target, &camera, &VisionWindow::scan(hd())));
    }

    #[test]
    fn test_outside_frustum_never_visible() {
        let camera = Camera::new(hd().aspect());
        let mut query = VisibilityQuery::default();
        // behind the camera at (0, 2, 5)
        let target = small_box(Vec3::new(0.0, 0.0, 20.0));
        assert!(!query.is_visible_in_window(&target, &camera, &VisionWindow::full_screen(hd())));
    }

    #[test]
    fn test_outside_scan_window() {
        let camera = Camera::looking(Vec3::ZERO, Vec3::NEG_Z, hd().aspect());
        let mut query = VisibilityQuery::default();
        let target = small_box(Vec3::new(5.0, 0.0, -10.0));

        assert!(!query.is_visible_in_window(&target, &camera, &VisionWindow::scan(hd())));
        assert!(query.is_visible_in_window(&target, &camera, &VisionWindow::full_screen(hd())));
    }

    #[test]
    fn test_large_target_reaches_window() {
        let camera = Camera::looking(Vec3::ZERO, Vec3::NEG_Z, hd().aspect());
        let mut query = VisibilityQuery::default();
        // same center as above but big enough that its apparent radius covers the gap
        let target = VisibilityTarget::from_bounds(Aabb::from_center_size(
            Vec3::new(5.0, 0.0, -10.0),
            Vec3::splat(3.0),
        ));
        assert!(query.is_visible_in_window(&target, &camera, &VisionWindow::scan(hd())));
    }

    #[test]
    fn test_unconfigured_camera_not_visible() {
        let camera = Camera::new(0.0);
        let mut query = VisibilityQuery::default();
        assert!(!query.is_visible_in_window(&small_box(Vec3::ZERO), &camera, &VisionWindow::full_screen(hd())));
    }

    #[test]
    fn test_empty_bounds_not_visible() {
        let camera = Camera::new(1.0);
        let mut query = VisibilityQuery::default();
        let target = VisibilityTarget::new(Vec3::ZERO, Aabb::EMPTY);
        assert!(!query.is_visible_in_window(&target, &camera, &VisionWindow::full_screen(hd())));
    }

    #[test]
    fn test_mirror_hides_object_behind_it() {
        let camera = Camera::looking(Vec3::new(3.0, 1.0, -5.0), Vec3::NEG_Z, hd().aspect());
        let mut query = VisibilityQuery::default();

        let hidden = small_box(Vec3::new(3.0, 1.0, -14.0));
        assert!(query.is_behind_occlusion_plane(&hidden, &camera));
        assert!(!query.is_visible_in_window(&hidden, &camera, &VisionWindow::full_screen(hd())));

        let in_front = small_box(Vec3::new(3.0, 1.0, -10.0));
        assert!(!query.is_behind_occlusion_plane(&in_front, &camera));
        assert!(query.is_visible_in_window(&in_front, &camera, &VisionWindow::full_screen(hd())));
    }

    #[test]
    fn test_mirror_requires_facing_camera() {
        // camera looking away from the mirror
        let camera = Camera::looking(Vec3::new(3.0, 1.0, -5.0), Vec3::Z, 1.0);
        let query = VisibilityQuery::default();
        assert!(!query.is_behind_occlusion_plane(&small_box(Vec3::new(3.0, 1.0, -14.0)), &camera));
    }

    #[test]
    fn test_mirror_lateral_limit() {
        let camera = Camera::looking(Vec3::new(25.0, 1.0, -5.0), Vec3::new(-1.0, 0.0, -0.3), 1.0);
        let plane = OcclusionPlane::default();
        // facing the mirror but more than 15 units to the side
        assert!(!plane.hides(Vec3::new(3.0, 1.0, -14.0), &camera));
    }

    #[test]
    fn test_no_plane_configured() {
        let query = VisibilityQuery::new(VisibilitySettings {
            occlusion_plane: None,
            ..VisibilitySettings::default()
        });
        let camera = Camera::looking(Vec3::new(3.0, 1.0, -5.0), Vec3::NEG_Z, 1.0);
        assert!(!query.is_behind_occlusion_plane(&small_box(Vec3::new(3.0, 1.0, -14.0)), &camera));
    }

    #[test]
    fn test_target_from_node() {
        let node = SceneNode::mesh("key", MeshData::cuboid(Vec3::ONE))
            .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        let target = VisibilityTarget::from_node(&node, Mat4::IDENTITY);
        assert!((target.position - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!((target.bounds.center() - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }
}
