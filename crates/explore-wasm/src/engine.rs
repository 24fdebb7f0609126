//! JSから操作する空間クエリAPI
//!
//! ホスト側のシーンはJSONスナップショット（`SceneNode`）として受け取る

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use explore_core::{MeshData, SceneNode, Transform};
use explore_spatial::{
    Camera, CollisionWorld, HighlightTracker, InteractionCandidate, InteractionCategory,
    InteractionRaycaster, PrimitiveObstacle, SceneContext, SpatialSettings, Viewport,
    VisibilityQuery, VisibilityTarget, VisionWindow, WorldLayout,
};

use crate::utils::{console_log, to_js_error};

/// `set_interactables` に渡す1要素
#[derive(Debug, Deserialize)]
struct InteractableInput {
    owner: String,
    category: InteractionCategory,
    node: SceneNode,
}

/// スライド移動の結果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlideResult {
    position: [f32; 3],
    ground_level: f32,
}

fn parse_scene_context(name: &str) -> Option<SceneContext> {
    match name {
        "world" | "main" => Some(SceneContext::World),
        "gallery" => Some(SceneContext::Gallery),
        _ if name == "modelViewer" || name.starts_with("model-") => Some(SceneContext::ModelViewer),
        _ => None,
    }
}

fn parse_node(value: JsValue) -> Result<SceneNode, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn mesh_node_from_buffers(
    id: &str,
    positions: &[f32],
    indices: Option<Vec<u32>>,
    matrix: &[f32],
) -> Result<SceneNode, String> {
    let geometry = MeshData::from_flat_positions(positions, indices)
        .ok_or_else(|| format!("positions for '{}' are not xyz triples", id))?;
    let transform = match matrix.len() {
        0 => Transform::identity(),
        16 => Transform::from_matrix(Mat4::from_cols_slice(matrix)),
        n => return Err(format!("matrix for '{}' has {} elements, expected 16", id, n)),
    };
    Ok(SceneNode::mesh(id, geometry).with_transform(transform))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}

/// SpatialEngine構造体
/// 衝突ワールド、カメラ、可視判定、ハイライト状態をまとめてJSへ公開する
#[wasm_bindgen]
pub struct SpatialEngine {
    world: CollisionWorld,
    visibility: VisibilityQuery,
    camera: Camera,
    viewport: Viewport,
    highlights: HighlightTracker,
    interactables: Vec<InteractionCandidate>,
}

impl SpatialEngine {
    fn window(&self, scan: bool) -> VisionWindow {
        if scan {
            VisionWindow::scan(self.viewport)
        } else {
            VisionWindow::full_screen(self.viewport)
        }
    }
}

#[wasm_bindgen]
impl SpatialEngine {
    /// 設定JSON（省略時はデフォルト）から作成
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<SpatialEngine, JsValue> {
        let settings = match settings_json.as_deref() {
            Some(json) if !json.trim().is_empty() => SpatialSettings::from_json(json).map_err(to_js_error)?,
            _ => SpatialSettings::default(),
        };
        let viewport = Viewport::new(1280.0, 720.0);
        console_log!("Creating SpatialEngine...");
        Ok(Self {
            world: CollisionWorld::new(settings),
            visibility: VisibilityQuery::new(settings.visibility),
            camera: Camera::new(viewport.aspect()),
            viewport,
            highlights: HighlightTracker::new(),
            interactables: Vec::new(),
        })
    }

    // ---- Geometry Registry ----

    /// モデルを登録（不正な入力はログを出して false）
    pub fn register_model(&mut self, id: &str, node: JsValue) -> bool {
        let node = match serde_wasm_bindgen::from_value::<SceneNode>(node) {
            Ok(node) => Some(node),
            Err(err) => {
                log::warn!("invalid scene node for '{}': {}", id, err);
                None
            }
        };
        match self.world.try_register(id, node.as_ref()) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("collider registration skipped: {}", err);
                false
            }
        }
    }

    /// JSON文字列版
    pub fn register_model_json(&mut self, id: &str, json: &str) -> bool {
        let node = SceneNode::from_json(json)
            .inspect_err(|err| log::warn!("invalid scene JSON for '{}': {}", id, err))
            .ok();
        self.world.register(id, node.as_ref());
        self.world.registry().contains(id)
    }

    /// ホストのフラットな頂点配列から登録
    /// `matrix` は列優先の4x4ワールド行列（空なら単位行列）
    pub fn register_mesh_buffers(
        &mut self,
        id: &str,
        positions: Vec<f32>,
        indices: Option<Vec<u32>>,
        matrix: Vec<f32>,
    ) -> Result<bool, JsValue> {
        let node = mesh_node_from_buffers(id, &positions, indices, &matrix)?;
        Ok(match self.world.try_register(id, Some(&node)) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("collider registration skipped: {}", err);
                false
            }
        })
    }

    pub fn unregister_model(&mut self, id: &str) -> bool {
        self.world.unregister(id)
    }

    /// 登録状況（ids, meshCount, triangleCount）
    pub fn debug_info(&self) -> Result<JsValue, JsValue> {
        to_js(&self.world.stats())
    }

    // ---- Primitive obstacles ----

    #[allow(clippy::too_many_arguments)]
    pub fn place_box(&mut self, id: &str, x: f32, y: f32, z: f32, width: f32, height: f32, depth: f32) {
        self.world.place_obstacle(
            id,
            PrimitiveObstacle::cuboid(Vec3::new(x, y, z), Vec3::new(width, height, depth)),
        );
    }

    pub fn place_cylinder(&mut self, id: &str, x: f32, y: f32, z: f32, radius: f32, height: f32) {
        self.world
            .place_obstacle(id, PrimitiveObstacle::cylinder(Vec3::new(x, y, z), radius, height));
    }

    pub fn remove_obstacle(&mut self, id: &str) -> bool {
        self.world.remove_obstacle(id)
    }

    /// ワールドビルダーのJSONから衝突形状を読み込む
    pub fn load_layout(&mut self, json: &str) -> Result<usize, JsValue> {
        let layout = WorldLayout::from_json(json).map_err(to_js_error)?;
        Ok(self.world.load_layout(&layout))
    }

    /// レイアウトが必要とするモデル名（衝突形状を除く）
    pub fn required_models(&self, json: &str) -> Result<Vec<String>, JsValue> {
        let layout = WorldLayout::from_json(json).map_err(to_js_error)?;
        Ok(layout.required_models().into_iter().map(str::to_string).collect())
    }

    /// "world" | "gallery" | "modelViewer"（"model-*" も可）
    pub fn set_scene(&mut self, name: &str) -> Result<(), JsValue> {
        let scene = parse_scene_context(name).ok_or_else(|| JsValue::from_str(&format!("unknown scene '{}'", name)))?;
        self.world.set_scene(scene);
        if !scene.has_physics() {
            self.highlights.clear();
        }
        Ok(())
    }

    // ---- Collision / ground ----

    pub fn would_collide(&self, cx: f32, cy: f32, cz: f32, nx: f32, ny: f32, nz: f32) -> bool {
        self.world
            .would_collide(Vec3::new(cx, cy, cz), Vec3::new(nx, ny, nz))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn would_collide_with_radius(
        &self,
        cx: f32,
        cy: f32,
        cz: f32,
        nx: f32,
        ny: f32,
        nz: f32,
        radius: f32,
    ) -> bool {
        self.world
            .would_collide_with(Vec3::new(cx, cy, cz), Vec3::new(nx, ny, nz), radius)
    }

    pub fn ground_level_at(&self, x: f32, y: f32, z: f32) -> f32 {
        self.world.ground_level_at(Vec3::new(x, y, z))
    }

    /// 軸ごとの移動解決（{ position: [x, y, z], groundLevel }）
    pub fn slide_move(&self, x: f32, y: f32, z: f32, dx: f32, dz: f32) -> Result<JsValue, JsValue> {
        let (position, ground_level) = self
            .world
            .slide_move(Vec3::new(x, y, z), Vec3::new(dx, 0.0, dz));
        to_js(&SlideResult {
            position: position.to_array(),
            ground_level,
        })
    }

    // ---- Camera ----

    /// カメラ位置と注視点を設定
    pub fn set_camera(&mut self, px: f32, py: f32, pz: f32, tx: f32, ty: f32, tz: f32) {
        self.camera.set_position(Vec3::new(px, py, pz));
        self.camera.set_target(Vec3::new(tx, ty, tz));
    }

    /// 垂直画角（度）
    pub fn set_fov(&mut self, degrees: f32) {
        self.camera.fov = degrees.to_radians();
    }

    /// 描画領域リサイズ
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width as f32, height as f32);
        if self.viewport.is_valid() {
            self.camera.set_aspect(self.viewport.aspect());
        }
    }

    // ---- Visibility ----

    /// ノードが画面（scan = true ならスキャン矩形）内に見えるか
    pub fn is_visible_in_window(&mut self, node: JsValue, scan: bool) -> Result<bool, JsValue> {
        let node = parse_node(node)?;
        let target = VisibilityTarget::from_node(&node, Mat4::IDENTITY);
        let window = self.window(scan);
        Ok(self.visibility.is_visible_in_window(&target, &self.camera, &window))
    }

    pub fn is_behind_occlusion_plane(&self, node: JsValue) -> Result<bool, JsValue> {
        let node = parse_node(node)?;
        let target = VisibilityTarget::from_node(&node, Mat4::IDENTITY);
        Ok(self.visibility.is_behind_occlusion_plane(&target, &self.camera))
    }

    /// `{ id: SceneNode }` を受け取り、スキャン矩形内のものでハイライトを更新
    /// 差分 { added, removed } を返す
    pub fn refresh_highlights(&mut self, targets: JsValue) -> Result<JsValue, JsValue> {
        let targets: std::collections::HashMap<String, SceneNode> =
            serde_wasm_bindgen::from_value(targets).map_err(to_js_error)?;
        let window = self.window(true);

        let mut visible = Vec::new();
        for (id, node) in &targets {
            let target = VisibilityTarget::from_node(node, Mat4::IDENTITY);
            if self.visibility.is_visible_in_window(&target, &self.camera, &window) {
                visible.push(id.clone());
            }
        }
        to_js(&self.highlights.apply(visible))
    }

    /// ハイライトを全解除し、解除したidを返す
    pub fn clear_highlights(&mut self) -> Vec<String> {
        self.highlights.clear()
    }

    /// スキャン矩形の [width, height]
    pub fn scan_window_size(&self) -> Vec<f32> {
        let size = VisionWindow::scan(self.viewport).size;
        vec![size.x, size.y]
    }

    // ---- Interaction ----

    /// `[{ owner, category, node }]` でインタラクション候補を置き換える
    pub fn set_interactables(&mut self, list: JsValue) -> Result<usize, JsValue> {
        let inputs: Vec<InteractableInput> = serde_wasm_bindgen::from_value(list).map_err(to_js_error)?;
        self.interactables = inputs
            .into_iter()
            .map(|i| InteractionCandidate::from_node(i.owner, i.category, &i.node, Mat4::IDENTITY))
            .collect();
        Ok(self.interactables.len())
    }

    /// 画面中央の最優先インタラクション対象（無ければ null）
    pub fn query_nearest_interactable(&self) -> Result<JsValue, JsValue> {
        let cutoffs = &self.world.settings().interaction.cutoffs;
        match InteractionRaycaster::query_nearest_interactable(&self.camera, &self.interactables, cutoffs) {
            Some(hit) => to_js(&hit),
            None => Ok(JsValue::NULL),
        }
    }

    /// モデルビューアで開く対象（無ければ null）
    pub fn query_inspectable(&self, scene: JsValue) -> Result<JsValue, JsValue> {
        let scene = parse_node(scene)?;
        let settings = self.world.settings();
        let hit = InteractionRaycaster::query_inspectable(
            &self.camera,
            &scene,
            settings.interaction.inspect_distance,
            settings.collider.max_collider_extent,
        );
        match hit {
            Some(hit) => to_js(&hit),
            None => Ok(JsValue::NULL),
        }
    }
}
