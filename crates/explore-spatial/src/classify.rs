//! One-time classification of scene meshes
//!
//! Registration and inspection both need to know whether a mesh is solid
//! world geometry. The decision is made once per mesh, from its material
//! flags, geometry hint, tag, name and world-space size.

use explore_core::{NodeKind, NodeTag, NodeVisit, ShapeHint};

/// ヘルパー・背景系オブジェクトの名前
const EXCLUDED_NAMES: &[&str] = &["grid", "helper", "sky", "sun", "moon"];
const GRID_PARENT: &str = "coordinate-grid";
/// これより大きい球は空のドームとみなす
const SKY_SPHERE_RADIUS: f32 = 30.0;
const MIN_SOLID_OPACITY: f32 = 0.5;
/// 床面とみなす高さ
const FLOOR_HEIGHT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// 衝突・接地・インスペクト対象
    Collidable,
    /// 描画されるが物理的な実体を持たない（床、鏡、半透明など）
    Decorative,
    /// 完全に無視する
    Excluded,
}

impl Classification {
    pub fn is_collidable(self) -> bool {
        self == Classification::Collidable
    }
}

/// `SceneNode::walk` の訪問結果を分類する
pub fn classify(visit: &NodeVisit<'_>, max_extent: f32) -> Classification {
    let node = visit.node;
    let NodeKind::Mesh {
        geometry,
        shape,
        material,
    } = &node.kind
    else {
        return Classification::Excluded;
    };

    if !visit.visible || !material.visible || material.wireframe || geometry.is_empty() {
        return Classification::Excluded;
    }
    if node.tag == NodeTag::AutoCollision {
        return Classification::Excluded;
    }
    if node.name.contains_any(EXCLUDED_NAMES) {
        return Classification::Excluded;
    }
    if visit.parent.is_some_and(|p| p.name.as_str() == GRID_PARENT) {
        return Classification::Excluded;
    }
    match shape {
        ShapeHint::Circle => return Classification::Excluded,
        ShapeHint::Sphere { radius } if *radius > SKY_SPHERE_RADIUS => {
            return Classification::Excluded;
        }
        _ => {}
    }

    let bounds = geometry.local_bounds().transformed(visit.world);
    if bounds.size().max_element() > max_extent {
        return Classification::Excluded;
    }

    if matches!(node.tag, NodeTag::Collision | NodeTag::Reflector) {
        return Classification::Decorative;
    }
    if material.transparent && material.opacity < MIN_SOLID_OPACITY {
        return Classification::Decorative;
    }
    // 寝かせた平面で原点付近の高さにあるものは床
    if *shape == ShapeHint::Plane && bounds.size().y <= f32::EPSILON && bounds.center().y < FLOOR_HEIGHT {
        return Classification::Decorative;
    }

    Classification::Collidable
}

#[cfg(test)]
mod tests {
    use super::*;
    use explore_core::{MaterialFlags, MeshData, SceneNode, Transform};
    use glam::{Mat4, Vec3};

    fn classify_root(node: &SceneNode) -> Vec<(String, Classification)> {
        let mut out = Vec::new();
        node.walk(Mat4::IDENTITY, &mut |v| {
            out.push((v.node.name.as_str().to_string(), classify(&v, 100.0)));
        });
        out
    }

    fn single(node: SceneNode) -> Classification {
        classify_root(&node)[0].1
    }

    fn cube(name: &str) -> SceneNode {
        SceneNode::mesh(name, MeshData::cuboid(Vec3::ONE))
    }

    #[test]
    fn test_plain_mesh_is_collidable() {
        assert_eq!(single(cube("statue")), Classification::Collidable);
    }

    #[test]
    fn test_group_is_excluded() {
        assert_eq!(single(SceneNode::group("root")), Classification::Excluded);
    }

    #[test]
    fn test_hidden_or_wireframe_excluded() {
        let hidden = cube("a").with_material(MaterialFlags {
            visible: false,
            ..MaterialFlags::default()
        });
        let wire = cube("b").with_material(MaterialFlags {
            wireframe: true,
            ..MaterialFlags::default()
        });
        assert_eq!(single(hidden), Classification::Excluded);
        assert_eq!(single(wire), Classification::Excluded);
    }

    #[test]
    fn test_hidden_parent_excludes_children() {
        let mut root = SceneNode::group("root").with_child(cube("child"));
        root.visible = false;
        let result = classify_root(&root);
        assert_eq!(result[1].1, Classification::Excluded);
    }

    #[test]
    fn test_helper_names_excluded() {
        assert_eq!(single(cube("SkyBox")), Classification::Excluded);
        assert_eq!(single(cube("axis_helper")), Classification::Excluded);
        assert_eq!(single(cube("moon")), Classification::Excluded);
    }

    #[test]
    fn test_names_alone_never_make_decorative() {
        assert_eq!(single(cube("background_wall")), Classification::Collidable);
        assert_eq!(single(cube("playground_slide")), Classification::Collidable);
        assert_eq!(single(cube("hall_mirror")), Classification::Collidable);
    }

    #[test]
    fn test_coordinate_grid_children_excluded() {
        let root = SceneNode::group("coordinate-grid").with_child(cube("line"));
        assert_eq!(classify_root(&root)[1].1, Classification::Excluded);
    }

    #[test]
    fn test_sky_sphere_and_circle_excluded() {
        let dome = cube("dome").with_shape(ShapeHint::Sphere { radius: 40.0 });
        let ball = cube("ball").with_shape(ShapeHint::Sphere { radius: 0.5 });
        let disc = cube("disc").with_shape(ShapeHint::Circle);
        assert_eq!(single(dome), Classification::Excluded);
        assert_eq!(single(ball), Classification::Collidable);
        assert_eq!(single(disc), Classification::Excluded);
    }

    #[test]
    fn test_oversized_excluded() {
        let terrain = SceneNode::mesh("terrain", MeshData::cuboid(Vec3::new(150.0, 1.0, 150.0)));
        assert_eq!(single(terrain), Classification::Excluded);
    }

    #[test]
    fn test_transparent_is_decorative() {
        let glass = cube("glass").with_material(MaterialFlags {
            transparent: true,
            opacity: 0.3,
            ..MaterialFlags::default()
        });
        let tinted = cube("tinted").with_material(MaterialFlags {
            transparent: true,
            opacity: 0.8,
            ..MaterialFlags::default()
        });
        assert_eq!(single(glass), Classification::Decorative);
        assert_eq!(single(tinted), Classification::Collidable);
    }

    #[test]
    fn test_floor_plane_is_decorative() {
        let floor = SceneNode::mesh("floor", MeshData::plane(40.0, 40.0)).with_shape(ShapeHint::Plane);
        let shelf = SceneNode::mesh("shelf", MeshData::plane(2.0, 1.0))
            .with_shape(ShapeHint::Plane)
            .with_transform(Transform::from_position(Vec3::new(0.0, 1.5, 0.0)));
        assert_eq!(single(floor), Classification::Decorative);
        assert_eq!(single(shelf), Classification::Collidable);
    }

    #[test]
    fn test_tags() {
        assert_eq!(single(cube("m").with_tag(NodeTag::Reflector)), Classification::Decorative);
        assert_eq!(single(cube("c").with_tag(NodeTag::Collision)), Classification::Decorative);
        assert_eq!(single(cube("a").with_tag(NodeTag::AutoCollision)), Classification::Excluded);
    }
}
