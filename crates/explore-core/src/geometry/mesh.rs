use serde::{Deserialize, Serialize};

use super::Aabb;
use crate::math::{Mat4, Vec3};

/// 三角形（ワールド座標またはローカル座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// 行列を適用した三角形を返す
    pub fn transformed(&self, matrix: Mat4) -> Self {
        Self {
            a: matrix.transform_point3(self.a),
            b: matrix.transform_point3(self.b),
            c: matrix.transform_point3(self.c),
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points([self.a, self.b, self.c])
    }

    /// 面積ゼロ（退化）の三角形か
    pub fn is_degenerate(&self) -> bool {
        (self.b - self.a).cross(self.c - self.a).length_squared() <= f32::EPSILON * f32::EPSILON
    }
}

/// メッシュジオメトリ
/// 頂点位置と（任意の）インデックスを含む
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub indices: Option<Vec<u32>>,
}

impl MeshData {
    /// 空のメッシュを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// `[x0, y0, z0, x1, ...]` 形式のフラット配列から作成
    /// 長さが3の倍数でない場合はNone
    pub fn from_flat_positions(flat: &[f32], indices: Option<Vec<u32>>) -> Option<Self> {
        let positions: &[[f32; 3]] = bytemuck::try_cast_slice(flat).ok()?;
        Some(Self {
            positions: positions.to_vec(),
            indices,
        })
    }

    /// 直方体メッシュを生成（原点中心）
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        // 各面4頂点、外向き反時計回り
        let faces: [[[f32; 3]; 4]; 6] = [
            // +X
            [[h.x, -h.y, -h.z], [h.x, h.y, -h.z], [h.x, h.y, h.z], [h.x, -h.y, h.z]],
            // -X
            [[-h.x, -h.y, h.z], [-h.x, h.y, h.z], [-h.x, h.y, -h.z], [-h.x, -h.y, -h.z]],
            // +Y
            [[-h.x, h.y, -h.z], [-h.x, h.y, h.z], [h.x, h.y, h.z], [h.x, h.y, -h.z]],
            // -Y
            [[-h.x, -h.y, h.z], [-h.x, -h.y, -h.z], [h.x, -h.y, -h.z], [h.x, -h.y, h.z]],
            // +Z
            [[-h.x, -h.y, h.z], [h.x, -h.y, h.z], [h.x, h.y, h.z], [-h.x, h.y, h.z]],
            // -Z
            [[h.x, -h.y, -h.z], [-h.x, -h.y, -h.z], [-h.x, h.y, -h.z], [h.x, h.y, -h.z]],
        ];

        let mut positions = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for face in faces {
            let base = positions.len() as u32;
            positions.extend_from_slice(&face);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            positions,
            indices: Some(indices),
        }
    }

    /// XZ平面上の矩形（+Y向き、y = 0）
    pub fn plane(width: f32, depth: f32) -> Self {
        let (hw, hd) = (width * 0.5, depth * 0.5);
        Self {
            positions: vec![[-hw, 0.0, -hd], [-hw, 0.0, hd], [hw, 0.0, hd], [hw, 0.0, -hd]],
            indices: Some(vec![0, 1, 2, 0, 2, 3]),
        }
    }

    /// 頂点数を取得
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// 三角形数を取得（範囲外インデックスを含む三角形も数える）
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    /// ローカル座標の三角形をイテレート
    /// 範囲外のインデックスを参照する三角形はスキップ
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        let corners: Box<dyn Iterator<Item = [usize; 3]> + '_> = match &self.indices {
            Some(indices) => Box::new(
                indices
                    .chunks_exact(3)
                    .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize]),
            ),
            None => Box::new((0..self.positions.len() / 3).map(|i| [i * 3, i * 3 + 1, i * 3 + 2])),
        };

        corners.filter_map(move |[i, j, k]| {
            let a = self.positions.get(i)?;
            let b = self.positions.get(j)?;
            let c = self.positions.get(k)?;
            Some(Triangle::new(Vec3::from(*a), Vec3::from(*b), Vec3::from(*c)))
        })
    }

    /// ワールド行列を適用した三角形を収集
    pub fn world_triangles(&self, matrix: Mat4) -> Vec<Triangle> {
        self.triangles().map(|t| t.transformed(matrix)).collect()
    }

    /// ローカル座標のバウンディングボックス
    pub fn local_bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().map(|p| Vec3::from(*p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_counts() {
        let cube = MeshData::cuboid(Vec3::ONE);
        // 6 faces * 4 vertices = 24 vertices
        assert_eq!(cube.vertex_count(), 24);
        // 6 faces * 2 triangles
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.triangles().count(), 12);
    }

    #[test]
    fn test_cuboid_bounds() {
        let cube = MeshData::cuboid(Vec3::new(2.0, 4.0, 6.0));
        let bounds = cube.local_bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshData::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangles().count(), 0);
        assert!(mesh.local_bounds().is_empty());
    }

    #[test]
    fn test_from_flat_positions() {
        let flat = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mesh = MeshData::from_flat_positions(&flat, None).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_from_flat_positions_rejects_ragged() {
        assert!(MeshData::from_flat_positions(&[0.0, 1.0], None).is_none());
    }

    #[test]
    fn test_out_of_range_index_skipped() {
        let mesh = MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: Some(vec![0, 1, 2, 0, 1, 9]),
        };
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn test_world_triangles_translated() {
        let plane = MeshData::plane(2.0, 2.0);
        let tris = plane.world_triangles(Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)));
        assert_eq!(tris.len(), 2);
        assert!(tris.iter().all(|t| t.a.y == 3.0 && t.b.y == 3.0 && t.c.y == 3.0));
    }

    #[test]
    fn test_degenerate_triangle() {
        let t = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert!(t.is_degenerate());
        assert!(!Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y).is_degenerate());
    }
}
