/// 空間クエリ層のエラー
///
/// クエリ自体はエラーを返さない。登録・設定・レイアウト読み込みのみ
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    #[error("no source object for collider '{0}'")]
    MissingSource(String),

    #[error("collider id must not be empty")]
    EmptyId,

    #[error("collider '{id}' has a non-finite transform")]
    NonFiniteTransform { id: String },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpatialError>;
