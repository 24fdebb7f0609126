use glam::{Mat4, Vec3, Vec4};

use crate::picking::Ray;

/// 一人称カメラ
/// 位置、注視点、上方向ベクトルを持つ透視投影カメラ
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// デフォルト値で新しいカメラを作成
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 75.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// 位置と視線方向から作成
    pub fn looking(position: Vec3, direction: Vec3, aspect: f32) -> Self {
        Self {
            position,
            target: position + direction,
            ..Self::new(aspect)
        }
    }

    /// 行列を組める状態か（有限値、正のアスペクト比、near < far、注視点が位置と異なる）
    pub fn is_configured(&self) -> bool {
        self.position.is_finite()
            && self.target.is_finite()
            && self.up.is_finite()
            && self.fov.is_finite()
            && self.fov > 0.0
            && self.aspect.is_finite()
            && self.aspect > 0.0
            && self.near > 0.0
            && self.far > self.near
            && (self.target - self.position).length_squared() > f32::EPSILON
            && (self.target - self.position).cross(self.up).length_squared() > f32::EPSILON
    }

    /// 正規化された視線方向
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// View-Projection行列を構築
    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// 画面中央を通るレイ（未設定のカメラではNone）
    pub fn center_ray(&self) -> Option<Ray> {
        if !self.is_configured() {
            return None;
        }
        Ray::try_new(self.position, self.target - self.position)
    }

    /// ワールド座標を正規化デバイス座標へ投影
    /// カメラの背後（w <= 0）の点は z = +inf を返す
    pub fn project(&self, point: Vec3) -> Vec3 {
        let clip = self.build_view_projection_matrix() * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= f32::EPSILON {
            return Vec3::new(0.0, 0.0, f32::INFINITY);
        }
        clip.truncate() / clip.w
    }

    /// カメラ位置を設定
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// カメラの注視点を設定
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// アスペクト比を設定
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_new() {
        let camera = Camera::new(16.0 / 9.0);
        assert_eq!(camera.position, Vec3::new(0.0, 2.0, 5.0));
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(camera.up, Vec3::Y);
        assert!(camera.is_configured());
    }

    #[test]
    fn test_unconfigured_camera() {
        let mut camera = Camera::new(0.0);
        assert!(!camera.is_configured());
        assert!(camera.center_ray().is_none());

        camera.set_aspect(1.0);
        camera.set_target(camera.position);
        assert!(!camera.is_configured());
    }

    #[test]
    fn test_forward_and_center_ray() {
        let camera = Camera::looking(Vec3::new(1.0, 1.6, 0.0), Vec3::NEG_Z, 1.0);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);

        let ray = camera.center_ray().unwrap();
        assert_eq!(ray.origin, camera.position);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_project_center_and_behind() {
        let camera = Camera::looking(Vec3::ZERO, Vec3::NEG_Z, 1.0);

        let ahead = camera.project(Vec3::new(0.0, 0.0, -10.0));
        assert!(ahead.x.abs() < 1e-5 && ahead.y.abs() < 1e-5);
        assert!(ahead.z > 0.0 && ahead.z < 1.0);

        let behind = camera.project(Vec3::new(0.0, 0.0, 10.0));
        assert!(behind.z >= 1.0);
    }

    #[test]
    fn test_view_projection_not_identity() {
        let camera = Camera::new(1.0);
        assert_ne!(camera.build_view_projection_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_set_position() {
        let mut camera = Camera::new(1.0);
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.position, Vec3::new(1.0, 2.0, 3.0));
    }
}
