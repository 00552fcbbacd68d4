use crate::state::EditState;

/// Linear undo/redo stack of edit-state snapshots.
///
/// Committing while undone prunes the forward branch, so the history is a
/// straight line, never a tree. Depth is unbounded.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<EditState>,
    index: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot after the current index, discarding any redo
    /// entries, and moves the index to the new tail.
    pub fn commit(&mut self, state: EditState) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(state);
        self.index = Some(self.snapshots.len() - 1);
    }

    /// Steps back one snapshot and returns it. No-op at the first entry or
    /// when empty.
    pub fn undo(&mut self) -> Option<&EditState> {
        let i = self.index?;
        if i == 0 {
            return None;
        }
        self.index = Some(i - 1);
        self.snapshots.get(i - 1)
    }

    /// Steps forward one snapshot and returns it. No-op at the tail.
    pub fn redo(&mut self) -> Option<&EditState> {
        let i = self.index?;
        if i + 1 >= self.snapshots.len() {
            return None;
        }
        self.index = Some(i + 1);
        self.snapshots.get(i + 1)
    }

    pub fn current(&self) -> Option<&EditState> {
        self.snapshots.get(self.index?)
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.snapshots.len())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
