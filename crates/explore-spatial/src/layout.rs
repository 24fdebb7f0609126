//! World-builder layout import
//!
//! The editor saves placed objects as JSON. Collision shapes in that file
//! become primitive obstacles; everything else is a model the host loads and
//! registers on its own.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::primitives::PrimitiveObstacle;

const COLLISION_PREFIX: &str = "collision_";

/// `{ "x": .., "y": .., "z": .. }`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Xyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Xyz {
    fn one() -> Self {
        Self { x: 1.0, y: 1.0, z: 1.0 }
    }
}

impl From<Xyz> for Vec3 {
    fn from(v: Xyz) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacedUserData {
    pub is_collision_shape: bool,
    pub shape_type: Option<String>,
    pub instance_name: Option<String>,
}

/// エディタで配置された1オブジェクト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedObject {
    pub model_name: String,
    /// 数値または文字列
    #[serde(default)]
    pub instance_id: Option<serde_json::Value>,
    #[serde(default)]
    pub position: Xyz,
    #[serde(default)]
    pub rotation: Xyz,
    #[serde(default = "Xyz::one")]
    pub scale: Xyz,
    #[serde(default)]
    pub user_data: PlacedUserData,
}

impl PlacedObject {
    pub fn is_collision_shape(&self) -> bool {
        self.user_data.is_collision_shape || self.model_name.starts_with(COLLISION_PREFIX)
    }

    pub fn is_cylinder(&self) -> bool {
        match self.user_data.shape_type.as_deref() {
            Some(shape) => shape == "cylinder",
            None => self.model_name == "collision_cylinder",
        }
    }

    /// 障害物のid（instanceName、なければモデル名とinstanceId、最後に配列位置）
    pub fn key(&self, index: usize) -> String {
        if let Some(name) = self.user_data.instance_name.as_ref().filter(|n| !n.is_empty()) {
            return name.clone();
        }
        match &self.instance_id {
            Some(serde_json::Value::String(id)) => format!("{}_{}", self.model_name, id),
            Some(serde_json::Value::Number(id)) => format!("{}_{}", self.model_name, id),
            _ => format!("{}_{}", self.model_name, index),
        }
    }

    /// 衝突形状なら障害物に変換（回転は無視）
    pub fn to_obstacle(&self) -> Option<PrimitiveObstacle> {
        if !self.is_collision_shape() {
            return None;
        }
        Some(PrimitiveObstacle::from_placement(
            self.position.into(),
            self.scale.into(),
            self.is_cylinder(),
        ))
    }
}

/// 保存されたワールド
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldLayout {
    pub version: String,
    pub objects: Vec<PlacedObject>,
}

impl WorldLayout {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 衝突形状を (id, 障害物) の組で返す
    pub fn obstacles(&self) -> Vec<(String, PrimitiveObstacle)> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.to_obstacle().map(|obstacle| (o.key(i), obstacle)))
            .collect()
    }

    /// ホストが読み込む必要のあるモデル名
    pub fn required_models(&self) -> BTreeSet<&str> {
        self.objects
            .iter()
            .filter(|o| !o.is_collision_shape())
            .map(|o| o.model_name.as_str())
            .collect()
    }
}
