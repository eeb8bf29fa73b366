use core_model::CellViewModel;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

pub use core_config::DEFAULT_HISTORY_DEPTH;

/// A full copy of the cell sequence captured for undo/redo.
///
/// The slice is freshly allocated on capture so it never aliases the live
/// sequence; the view-models it points at are immutable and shared. Serialized
/// as an ordered list of view-model records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<[Arc<CellViewModel>]>);

impl Snapshot {
    pub fn capture(cells: &[Arc<CellViewModel>]) -> Self {
        Self(cells.iter().cloned().collect())
    }

    /// Materialize the snapshot as a new live sequence.
    pub fn to_cells(&self) -> Vec<Arc<CellViewModel>> {
        self.0.to_vec()
    }

    pub fn as_slice(&self) -> &[Arc<CellViewModel>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|vm| vm.as_ref()))
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cells = Vec::<CellViewModel>::deserialize(deserializer)?;
        Ok(Self(cells.into_iter().map(Arc::new).collect()))
    }
}

/// Bounded undo/redo stacks of cell-sequence snapshots.
///
/// Policy:
/// * Each stack is bounded by `max_depth`; pushing past it drops the oldest
///   snapshot silently.
/// * New mutations push onto the undo stack but leave the redo stack alone,
///   so undo and redo may alternate across divergent edits.
/// * Each stack is indexed by its own length; the two are not kept in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
    pub fn undo_top(&self) -> Option<&Snapshot> {
        self.undo_stack.last()
    }
    pub fn redo_top(&self) -> Option<&Snapshot> {
        self.redo_stack.last()
    }

    /// Record the sequence as it was before a structural mutation.
    pub fn push_undo(&mut self, cells: &[Arc<CellViewModel>]) {
        push_bounded(&mut self.undo_stack, Snapshot::capture(cells), self.max_depth);
        trace!(target: "state.history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), cells = cells.len(), "push_undo");
    }

    /// Pop the newest undo snapshot, saving `current` onto the redo stack.
    /// Returns the sequence to install, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &[Arc<CellViewModel>]) -> Option<Vec<Arc<CellViewModel>>> {
        let last = self.undo_stack.pop()?;
        push_bounded(&mut self.redo_stack, Snapshot::capture(current), self.max_depth);
        trace!(target: "state.history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        Some(last.to_cells())
    }

    /// Mirror of [`History::undo`] using the redo stack.
    pub fn redo(&mut self, current: &[Arc<CellViewModel>]) -> Option<Vec<Arc<CellViewModel>>> {
        let next = self.redo_stack.pop()?;
        push_bounded(&mut self.undo_stack, Snapshot::capture(current), self.max_depth);
        trace!(target: "state.history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "redo_pop");
        Some(next.to_cells())
    }
}

fn push_bounded(stack: &mut Vec<Snapshot>, snap: Snapshot, max_depth: usize) {
    stack.push(snap);
    if stack.len() > max_depth {
        let overflow = stack.len() - max_depth;
        stack.drain(..overflow);
        trace!(target: "state.history", dropped = overflow, "stack_trimmed");
    }
}
