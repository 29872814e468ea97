use crate::shape::{renumber, Shape};

/// Linear undo/redo log of full shape-list snapshots.
///
/// Snapshot 0 is always the empty list and the pointer never moves below it.
/// Committing while the pointer is not at the end drops the snapshots after
/// the pointer first.
#[derive(Clone, Debug, PartialEq)]
pub struct History {
    snapshots: Vec<Vec<Shape>>,
    pointer: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            snapshots: vec![Vec::new()],
            pointer: 0,
        }
    }

    /// Append `shapes` (renumbered 1..N) as the new active snapshot and return it.
    pub fn commit(&mut self, mut shapes: Vec<Shape>) -> &[Shape] {
        renumber(&mut shapes);
        self.snapshots.truncate(self.pointer + 1);
        self.snapshots.push(shapes);
        self.pointer = self.snapshots.len() - 1;
        &self.snapshots[self.pointer]
    }

    /// Step back one snapshot. `None` at the initial empty snapshot.
    pub fn undo(&mut self) -> Option<&[Shape]> {
        if !self.can_undo() {
            return None;
        }
        self.pointer -= 1;
        Some(&self.snapshots[self.pointer])
    }

    /// Step forward one snapshot. `None` when already at the newest one.
    pub fn redo(&mut self) -> Option<&[Shape]> {
        if !self.can_redo() {
            return None;
        }
        self.pointer += 1;
        Some(&self.snapshots[self.pointer])
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.snapshots.len()
    }

    pub fn active(&self) -> &[Shape] {
        &self.snapshots[self.pointer]
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}
