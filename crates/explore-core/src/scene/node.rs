use serde::{Deserialize, Serialize};

use crate::components::{Name, Transform};
use crate::geometry::{Aabb, MeshData};
use crate::math::Mat4;

/// マテリアルの描画フラグ（衝突判定の分類に使う部分のみ）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaterialFlags {
    pub visible: bool,
    pub wireframe: bool,
    pub transparent: bool,
    pub opacity: f32,
}

impl Default for MaterialFlags {
    fn default() -> Self {
        Self {
            visible: true,
            wireframe: false,
            transparent: false,
            opacity: 1.0,
        }
    }
}

/// ジオメトリ生成元のヒント
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ShapeHint {
    #[default]
    Generic,
    Plane,
    Circle,
    Sphere { radius: f32 },
    Box,
    Cylinder,
}

/// ノード種別
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    #[default]
    Group,
    Bone,
    Mesh {
        geometry: MeshData,
        #[serde(default)]
        shape: ShapeHint,
        #[serde(default)]
        material: MaterialFlags,
    },
}

/// ホスト側が付与する用途タグ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeTag {
    #[default]
    None,
    /// 手置きの衝突ボックス（プリミティブ判定側で扱う）
    Collision,
    /// 自動生成された衝突用メッシュ
    AutoCollision,
    /// 反射面（ミラー）
    Reflector,
    GalleryFrame,
    ReturnPortal,
}

/// シーングラフのノード
/// ホストのシーンからJSONで受け取るスナップショット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneNode {
    pub name: Name,
    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
    pub tag: NodeTag,
    pub children: Vec<SceneNode>,
}

/// `SceneNode::walk` が各ノードで渡す情報
#[derive(Debug, Clone, Copy)]
pub struct NodeVisit<'a> {
    pub node: &'a SceneNode,
    pub parent: Option<&'a SceneNode>,
    /// ルートからの合成ワールド行列
    pub world: Mat4,
    /// 祖先を含めて表示されているか
    pub visible: bool,
}

impl SceneNode {
    /// 空のグループノードを作成
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: Name::new(name),
            ..Self::default()
        }
    }

    /// メッシュノードを作成
    pub fn mesh(name: impl Into<String>, geometry: MeshData) -> Self {
        Self {
            name: Name::new(name),
            kind: NodeKind::Mesh {
                geometry,
                shape: ShapeHint::Generic,
                material: MaterialFlags::default(),
            },
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_tag(mut self, tag: NodeTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_shape(mut self, hint: ShapeHint) -> Self {
        if let NodeKind::Mesh { shape, .. } = &mut self.kind {
            *shape = hint;
        }
        self
    }

    pub fn with_material(mut self, flags: MaterialFlags) -> Self {
        if let NodeKind::Mesh { material, .. } = &mut self.kind {
            *material = flags;
        }
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// JSON文字列からノードツリーを復元
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// メッシュのジオメトリを取得
    pub fn geometry(&self) -> Option<&MeshData> {
        match &self.kind {
            NodeKind::Mesh { geometry, .. } => Some(geometry),
            _ => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh { .. })
    }

    /// 深さ優先で自身と全子孫を訪問する
    pub fn walk<'a>(&'a self, parent_world: Mat4, visit: &mut impl FnMut(NodeVisit<'a>)) {
        self.walk_inner(None, parent_world, true, visit);
    }

    fn walk_inner<'a>(
        &'a self,
        parent: Option<&'a SceneNode>,
        parent_world: Mat4,
        parent_visible: bool,
        visit: &mut impl FnMut(NodeVisit<'a>),
    ) {
        let world = self.transform.world_matrix(parent_world);
        let visible = parent_visible && self.visible;
        visit(NodeVisit {
            node: self,
            parent,
            world,
            visible,
        });
        for child in &self.children {
            child.walk_inner(Some(self), world, visible, visit);
        }
    }

    /// 全メッシュのローカルボックスを変換して合成したワールドボックス
    pub fn world_bounds(&self, parent_world: Mat4) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        self.walk(parent_world, &mut |v| {
            if let Some(geometry) = v.node.geometry() {
                bounds = bounds.union(&geometry.local_bounds().transformed(v.world));
            }
        });
        bounds
    }

    /// 全行列要素が有限か（ルートの変換のみ検査）
    pub fn has_finite_transform(&self) -> bool {
        self.transform.is_finite()
    }
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: Name::default(),
            transform: Transform::identity(),
            visible: true,
            kind: NodeKind::Group,
            tag: NodeTag::None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_group_default_visible() {
        let node = SceneNode::group("root");
        assert!(node.visible);
        assert!(!node.is_mesh());
        assert_eq!(node.name.as_str(), "root");
    }

    #[test]
    fn test_walk_composes_world_matrices() {
        let root = SceneNode::group("root")
            .with_transform(Transform::from_position(Vec3::new(5.0, 0.0, 0.0)))
            .with_child(
                SceneNode::mesh("child", MeshData::cuboid(Vec3::ONE))
                    .with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 0.0))),
            );

        let mut origins = Vec::new();
        root.walk(Mat4::IDENTITY, &mut |v| {
            origins.push((v.node.name.as_str().to_string(), v.world.transform_point3(Vec3::ZERO)));
        });

        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1].0, "child");
        assert!((origins[1].1 - Vec3::new(5.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_walk_propagates_hidden_parent() {
        let mut root = SceneNode::group("root").with_child(SceneNode::mesh("m", MeshData::cuboid(Vec3::ONE)));
        root.visible = false;

        let mut seen = Vec::new();
        root.walk(Mat4::IDENTITY, &mut |v| seen.push(v.visible));
        assert_eq!(seen, vec![false, false]);
    }

    #[test]
    fn test_world_bounds() {
        let root = SceneNode::group("root")
            .with_transform(Transform::from_position(Vec3::new(10.0, 1.0, 8.0)))
            .with_child(SceneNode::mesh("box", MeshData::cuboid(Vec3::splat(2.0))));

        let bounds = root.world_bounds(Mat4::IDENTITY);
        assert_eq!(bounds.min, Vec3::new(9.0, 0.0, 7.0));
        assert_eq!(bounds.max, Vec3::new(11.0, 2.0, 9.0));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "name": "door",
            "transform": { "position": [1.0, 0.0, -3.0] },
            "children": [
                {
                    "name": "panel",
                    "kind": {
                        "type": "mesh",
                        "geometry": { "positions": [[0,0,0],[1,0,0],[0,1,0]] },
                        "material": { "opacity": 0.3, "transparent": true },
                        "shape": { "kind": "sphere", "radius": 40.0 }
                    },
                    "tag": "reflector"
                }
            ]
        }"#;

        let node = SceneNode::from_json(json).unwrap();
        assert_eq!(node.name.as_str(), "door");
        assert_eq!(node.children.len(), 1);

        let child = &node.children[0];
        assert_eq!(child.tag, NodeTag::Reflector);
        match &child.kind {
            NodeKind::Mesh { geometry, shape, material } => {
                assert_eq!(geometry.triangle_count(), 1);
                assert_eq!(*shape, ShapeHint::Sphere { radius: 40.0 });
                assert!(material.transparent);
                assert!(material.visible);
            }
            other => panic!("expected mesh, got {:?}", other),
        }
    }
}
