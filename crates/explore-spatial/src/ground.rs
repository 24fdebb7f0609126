//! Ground level under a point
//!
//! Every surface source reports the highest top it can offer below
//! `position.y + step_tolerance`; the resolver keeps the maximum, with the
//! flat floor at y = 0 as the fallback.

use glam::Vec3;

use crate::picking::Ray;
use crate::primitives::ObstacleSet;
use crate::registry::GeometryRegistry;
use crate::settings::GroundSettings;

/// 地面となり得る面の集合
pub trait SupportSurface {
    /// `position` を支える最も高い面の y
    fn support_height(&self, position: Vec3, settings: &GroundSettings) -> Option<f32>;
}

impl SupportSurface for GeometryRegistry {
    fn support_height(&self, position: Vec3, settings: &GroundSettings) -> Option<f32> {
        let limit = position.y + settings.step_tolerance;
        let ray = Ray::downward(position + Vec3::Y * settings.probe_height);

        self.iter()
            .filter(|c| !c.is_empty() && c.bounds.contains_xz(position))
            .flat_map(|c| c.meshes.iter())
            .filter(|m| m.bounds.contains_xz(position))
            .flat_map(|m| ray.all_hits(&m.triangles))
            .map(|hit| hit.point.y)
            .filter(|&y| y <= limit)
            .max_by(|a, b| a.total_cmp(b))
    }
}

impl SupportSurface for ObstacleSet {
    fn support_height(&self, position: Vec3, settings: &GroundSettings) -> Option<f32> {
        self.iter()
            .filter_map(|(_, o)| o.support_height(position, settings.step_tolerance))
            .max_by(|a, b| a.total_cmp(b))
    }
}

/// 接地高さの解決
pub struct GroundResolver<'a> {
    surfaces: Vec<&'a dyn SupportSurface>,
    settings: GroundSettings,
}

impl<'a> GroundResolver<'a> {
    pub fn new(settings: GroundSettings) -> Self {
        Self {
            surfaces: Vec::new(),
            settings,
        }
    }

    pub fn with(mut self, surface: &'a dyn SupportSurface) -> Self {
        self.surfaces.push(surface);
        self
    }

    /// 最も高い支持面（無ければ 0）
    pub fn ground_level_at(&self, position: Vec3) -> f32 {
        if !position.is_finite() {
            return 0.0;
        }
        self.surfaces
            .iter()
            .filter_map(|s| s.support_height(position, &self.settings))
            .fold(0.0_f32, f32::max)
    }
}
