use serde::{Deserialize, Serialize};

/// ノード名
/// シーングラフ上の表示名（空文字列は無名ノード）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name {
    value: String,
}

impl Name {
    /// 新しいNameを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self { value: name.into() }
    }

    /// 名前を文字列スライスとして取得
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// 無名ノードかどうか
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// 大文字小文字を区別せず、いずれかの語を含むか判定
    pub fn contains_any(&self, needles: &[&str]) -> bool {
        let lower = self.value.to_lowercase();
        needles.iter().any(|needle| lower.contains(needle))
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
