//! Ray casting against bounding boxes and triangle batches
//!
//! CPU-side replacement for the scene library's raycaster: every query runs
//! directly over stored world-space triangles, no temporary mesh objects.

use explore_core::{Aabb, Triangle};
use glam::Vec3;

/// Barycentric slack so rays through a shared edge hit at least one side
const EDGE_EPSILON: f32 = 1e-5;
/// Hits closer than this to the origin are ignored (origin lying on a face)
const MIN_DISTANCE: f32 = 1e-5;

/// Ray for raycasting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

/// A single ray/triangle intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
}

impl Ray {
    /// Create a new ray, normalizing `direction`
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Like `new`, but None for a zero or non-finite direction
    pub fn try_new(origin: Vec3, direction: Vec3) -> Option<Self> {
        if !origin.is_finite() {
            return None;
        }
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    /// Ray pointing straight down (-Y)
    pub fn downward(origin: Vec3) -> Self {
        Self {
            origin,
            direction: Vec3::NEG_Y,
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Check intersection with AABB using slab method
    /// Returns the distance to intersection point if hit, None otherwise
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        if aabb.is_empty() {
            return None;
        }

        // Handle division by zero with small epsilon
        let inv_dir = Vec3::new(
            if self.direction.x.abs() > f32::EPSILON {
                1.0 / self.direction.x
            } else {
                f32::MAX
            },
            if self.direction.y.abs() > f32::EPSILON {
                1.0 / self.direction.y
            } else {
                f32::MAX
            },
            if self.direction.z.abs() > f32::EPSILON {
                1.0 / self.direction.z
            } else {
                f32::MAX
            },
        );

        let t1 = (aabb.min - self.origin) * inv_dir;
        let t2 = (aabb.max - self.origin) * inv_dir;

        let tmin_vec = t1.min(t2);
        let tmax_vec = t1.max(t2);

        let tmin = tmin_vec.x.max(tmin_vec.y).max(tmin_vec.z);
        let tmax = tmax_vec.x.min(tmax_vec.y).min(tmax_vec.z);

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Two-sided Möller–Trumbore test
    /// Returns the distance along the ray, None for a miss or a degenerate triangle
    pub fn intersect_triangle(&self, triangle: &Triangle) -> Option<f32> {
        let edge1 = triangle.b - triangle.a;
        let edge2 = triangle.c - triangle.a;
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);

        // parallel or zero-area
        if det.abs() < 1e-8 {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - triangle.a;
        let u = inv_det * s.dot(h);
        if !(-EDGE_EPSILON..=1.0 + EDGE_EPSILON).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = inv_det * self.direction.dot(q);
        if v < -EDGE_EPSILON || u + v > 1.0 + EDGE_EPSILON {
            return None;
        }

        let t = inv_det * edge2.dot(q);
        (t > MIN_DISTANCE && t.is_finite()).then_some(t)
    }

    /// Nearest hit within `max_distance` over a triangle batch
    pub fn nearest_hit(&self, triangles: &[Triangle], max_distance: f32) -> Option<RayHit> {
        triangles
            .iter()
            .filter_map(|t| self.intersect_triangle(t))
            .filter(|&d| d <= max_distance)
            .min_by(|a, b| a.total_cmp(b))
            .map(|distance| RayHit {
                distance,
                point: self.at(distance),
            })
    }

    /// Every hit over a triangle batch, unsorted
    pub fn all_hits<'a>(&'a self, triangles: &'a [Triangle]) -> impl Iterator<Item = RayHit> + 'a {
        triangles.iter().filter_map(move |t| {
            self.intersect_triangle(t).map(|distance| RayHit {
                distance,
                point: self.at(distance),
            })
        })
    }
}
