//! Selection / focus state machine.
//!
//! Per cell: `unselected`, `selected`, or `focused` (which implies selected).
//! Across the whole sequence at most one cell is selected and at most one is
//! focused. Every transition returns `None` when nothing would change, which
//! callers map to "keep the previous state by identity". Unknown ids are
//! always a no-op.

use crate::MainState;
use core_model::{CellId, CellViewModel, CursorPos, mutation};
use std::sync::Arc;
use tracing::trace;

/// Replace the flags of the cell at `idx`, returning whether anything changed.
fn set_flags(
    cells: &mut [Arc<CellViewModel>],
    idx: usize,
    selected: bool,
    focused: bool,
    cursor_pos: Option<CursorPos>,
) -> bool {
    let next = mutation::with_selection(&cells[idx], selected, focused, cursor_pos);
    if next == *cells[idx] {
        false
    } else {
        cells[idx] = Arc::new(next);
        true
    }
}

impl MainState {
    fn finish_selection(
        &self,
        cells: Vec<Arc<CellViewModel>>,
        changed: bool,
        selected: Option<CellId>,
        focused: Option<CellId>,
    ) -> Option<MainState> {
        if !changed && selected == self.selected_cell_id && focused == self.focused_cell_id {
            return None;
        }
        Some(MainState {
            cell_vms: cells,
            selected_cell_id: selected,
            focused_cell_id: focused,
            ..self.clone()
        })
    }

    /// Select `target`. Focus follows only when it was already active on the
    /// previously selected cell; otherwise the target is selected only.
    pub fn select_cell(&self, target: &CellId, cursor_pos: CursorPos) -> Option<MainState> {
        let add = self.index_of(target)?;
        let focus_follows =
            self.focused_cell_id.is_some() && self.focused_cell_id == self.selected_cell_id;

        let mut cells = self.cell_vms.clone();
        let mut changed = false;
        for prev in [&self.selected_cell_id, &self.focused_cell_id]
            .into_iter()
            .flatten()
        {
            if let Some(idx) = self.index_of(prev).filter(|i| *i != add) {
                changed |= set_flags(&mut cells, idx, false, false, None);
            }
        }
        changed |= set_flags(&mut cells, add, true, focus_follows, Some(cursor_pos));
        trace!(target: "state.selection", cell = %target, focus_follows, changed, "select_cell");

        let focused = focus_follows.then(|| target.clone());
        self.finish_selection(cells, changed, Some(target.clone()), focused)
    }

    /// Focus (and select) `target`. The previously focused cell, or the
    /// previously selected one when nothing had focus, is cleared.
    pub fn focus_cell(&self, target: &CellId, cursor_pos: CursorPos) -> Option<MainState> {
        let add = self.index_of(target)?;
        let mut cells = self.cell_vms.clone();
        let mut changed = false;

        let remove = self
            .focused_cell_id
            .as_ref()
            .and_then(|id| self.index_of(id))
            .or_else(|| self.selected_cell_id.as_ref().and_then(|id| self.index_of(id)));
        if let Some(idx) = remove.filter(|i| *i != add) {
            changed |= set_flags(&mut cells, idx, false, false, None);
        }
        changed |= set_flags(&mut cells, add, true, true, Some(cursor_pos));
        trace!(target: "state.selection", cell = %target, changed, "focus_cell");

        self.finish_selection(cells, changed, Some(target.clone()), Some(target.clone()))
    }

    /// Drop focus from the focused cell (or `fallback` when nothing is focused)
    /// and install `code` as its source. Selection is untouched.
    pub fn unfocus_cell(&self, fallback: &CellId, code: &str) -> Option<MainState> {
        let target = self.focused_cell_id.as_ref().unwrap_or(fallback);
        let idx = self.index_of(target)?;
        let current = &self.cell_vms[idx];

        let mut next = if current.cell.data.source().is_some() {
            mutation::with_source(current, code)
        } else {
            (**current).clone()
        };
        next.focused = false;
        trace!(target: "state.selection", cell = %target, code_len = code.len(), "unfocus_cell");

        if next == **current && self.focused_cell_id.is_none() {
            return None;
        }
        let mut cells = self.cell_vms.clone();
        cells[idx] = Arc::new(next);
        Some(MainState {
            cell_vms: cells,
            focused_cell_id: None,
            ..self.clone()
        })
    }

    /// Select the cell after `id` with the cursor left where it was.
    /// No-op for the last cell or an unknown id.
    pub fn select_next_cell(&self, id: &CellId) -> Option<MainState> {
        let idx = self.index_of(id)?;
        let next = self.cell_vms.get(idx + 1)?;
        self.select_cell(&next.cell.id, CursorPos::Current)
    }
}
