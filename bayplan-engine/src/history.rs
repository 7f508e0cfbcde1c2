//! 布局快照的撤销/重做栈。
//!
//! 存储按时间排列的完整快照与当前索引。在索引不在末尾时压入新快照会丢弃
//! 其后的全部快照（重做分支被销毁）。

use bayplan_core::snapshot::Snapshot;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<Snapshot>,
    index: usize,
    max_depth: Option<usize>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 限制保留的快照数量，超出时淘汰最旧的快照。
    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self {
            max_depth: max_depth.map(|depth| depth.max(1)),
            ..Self::default()
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if !self.entries.is_empty() && self.index + 1 < self.entries.len() {
            let discarded = self.entries.len() - self.index - 1;
            self.entries.truncate(self.index + 1);
            debug!(discarded, "redo branch discarded");
        }
        self.entries.push(snapshot);
        self.index = self.entries.len() - 1;

        if let Some(depth) = self.max_depth {
            if self.entries.len() > depth {
                let evicted = self.entries.len() - depth;
                self.entries.drain(..evicted);
                self.index -= evicted;
            }
        }
        debug!(index = self.index, len = self.entries.len(), "history snapshot pushed");
    }

    /// 跳转到指定索引；越界时忽略并返回 `None`。
    pub fn go_to(&mut self, index: usize) -> Option<&Snapshot> {
        if index >= self.entries.len() {
            return None;
        }
        self.index = index;
        debug!(index, "history moved");
        self.entries.get(index)
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.go_to(self.index - 1)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.go_to(self.index + 1)
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.index > 0
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.index + 1 < self.entries.len()
    }

    /// 当前索引；历史为空时返回 `None`。
    #[inline]
    pub fn index(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.index)
        }
    }

    #[inline]
    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }
}
