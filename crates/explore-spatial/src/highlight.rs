use std::collections::BTreeSet;

use serde::Serialize;

/// ハイライト集合の差分
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightDiff {
    /// 新たにハイライトするid
    pub added: Vec<String>,
    /// ハイライトを外すid
    pub removed: Vec<String>,
}

impl HighlightDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// スキャンビジョンで現在ハイライト中のid
#[derive(Debug, Clone, Default)]
pub struct HighlightTracker {
    highlighted: BTreeSet<String>,
}

impl HighlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 可視集合を反映し、差分を返す
    pub fn apply<I, S>(&mut self, visible: I) -> HighlightDiff
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let visible: BTreeSet<String> = visible.into_iter().map(Into::into).collect();
        let diff = HighlightDiff {
            added: visible.difference(&self.highlighted).cloned().collect(),
            removed: self.highlighted.difference(&visible).cloned().collect(),
        };
        self.highlighted = visible;
        diff
    }

    /// 全解除（解除されたidを返す）
    pub fn clear(&mut self) -> Vec<String> {
        std::mem::take(&mut self.highlighted).into_iter().collect()
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.highlighted.contains(id)
    }

    pub fn len(&self) -> usize {
        self.highlighted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlighted.is_empty()
    }
}
