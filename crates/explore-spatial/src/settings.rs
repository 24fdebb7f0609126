//! Tunables for every spatial query
//!
//! Deserialized from camelCase JSON; every field falls back to the values the
//! exploration world ships with.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collider::Agent;
use crate::error::{Result, SpatialError};
use crate::interaction::CategoryCutoffs;
use crate::visibility::OcclusionPlane;

/// 衝突判定のサンプリング方向数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RaySampling {
    Four,
    #[default]
    Eight,
}

const D: f32 = std::f32::consts::FRAC_1_SQRT_2;

// 軸方向4本を先頭に置く
static DIRECTIONS: [Vec3; 8] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(D, 0.0, D),
    Vec3::new(-D, 0.0, D),
    Vec3::new(D, 0.0, -D),
    Vec3::new(-D, 0.0, -D),
];

impl RaySampling {
    /// XZ平面上の単位方向
    pub fn directions(self) -> &'static [Vec3] {
        match self {
            RaySampling::Four => &DIRECTIONS[..4],
            RaySampling::Eight => &DIRECTIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColliderSettings {
    /// 生ジオメトリの周囲に加える余白
    pub buffer_margin: f32,
    /// 実効半径に掛ける近接係数
    pub closeness_factor: f32,
    /// 現在位置の足元からのレイの高さ
    pub ray_height: f32,
    pub sampling: RaySampling,
    /// これより大きいメッシュは登録しない（地形・空など）
    pub max_collider_extent: f32,
}

impl Default for ColliderSettings {
    fn default() -> Self {
        Self {
            buffer_margin: 0.08,
            closeness_factor: 0.7,
            ray_height: 1.0,
            sampling: RaySampling::Eight,
            max_collider_extent: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroundSettings {
    /// 下向きレイの開始高さ（位置からの相対）
    pub probe_height: f32,
    /// 足元より上で着地できる段差の上限
    pub step_tolerance: f32,
}

impl Default for GroundSettings {
    fn default() -> Self {
        Self {
            probe_height: 10.0,
            step_tolerance: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisibilitySettings {
    /// 見かけの半径 1 単位あたりのウィンドウ拡張量（px）
    pub apparent_radius_scale: f32,
    pub occlusion_plane: Option<OcclusionPlane>,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            apparent_radius_scale: 50.0,
            occlusion_plane: Some(OcclusionPlane::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionSettings {
    pub cutoffs: CategoryCutoffs,
    /// モデルビューアへ入れる距離
    pub inspect_distance: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            cutoffs: CategoryCutoffs::default(),
            inspect_distance: 4.0,
        }
    }
}

/// 全クエリの設定
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpatialSettings {
    pub agent: Agent,
    pub collider: ColliderSettings,
    pub ground: GroundSettings,
    pub visibility: VisibilitySettings,
    pub interaction: InteractionSettings,
}

impl SpatialSettings {
    /// JSONから読み込み、検証する
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.collider;
        if !(self.agent.radius > 0.0 && self.agent.radius.is_finite()) {
            return Err(invalid(format!("agent radius must be positive, got {}", self.agent.radius)));
        }
        if !(self.agent.height > 0.0 && self.agent.height.is_finite()) {
            return Err(invalid(format!("agent height must be positive, got {}", self.agent.height)));
        }
        if !(c.buffer_margin >= 0.0 && c.buffer_margin.is_finite()) {
            return Err(invalid(format!("buffer margin must be >= 0, got {}", c.buffer_margin)));
        }
        if !(c.closeness_factor > 0.0 && c.closeness_factor <= 1.5) {
            return Err(invalid(format!(
                "closeness factor must be in (0, 1.5], got {}",
                c.closeness_factor
            )));
        }
        if !(c.max_collider_extent > 0.0) {
            return Err(invalid(format!(
                "max collider extent must be positive, got {}",
                c.max_collider_extent
            )));
        }
        if !(self.ground.probe_height >= 0.0 && self.ground.step_tolerance >= 0.0) {
            return Err(invalid("ground probe height and step tolerance must be >= 0".into()));
        }
        if let Some(plane) = &self.visibility.occlusion_plane {
            if plane.behind_margin < 0.0 || plane.front_margin < 0.0 || plane.max_lateral_distance < 0.0 {
                return Err(invalid("occlusion plane margins must be >= 0".into()));
            }
            if plane.normal.length_squared() <= f32::EPSILON {
                return Err(invalid("occlusion plane normal must be non-zero".into()));
            }
        }
        if self.interaction.cutoffs.iter().any(|(_, d)| d < 0.0) || self.interaction.inspect_distance < 0.0 {
            return Err(invalid("interaction distances must be >= 0".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SpatialError {
    SpatialError::InvalidSettings(message)
}
