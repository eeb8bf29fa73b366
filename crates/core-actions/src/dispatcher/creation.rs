//! Structural changes to the cell sequence: insertion, deletion and the
//! insert-or-update path used by the host's cell lifecycle messages.
//!
//! Every change in cell count records the prior sequence on the undo stack
//! first. The redo stack is left alone.

use super::commit;
use core_events::OutboundMessage;
use core_model::{CellId, CellRecord, CellViewModel, CursorPos, mutation};
use core_state::MainState;
use std::sync::Arc;
use tracing::{debug, trace};

pub(super) fn insert_above(
    prev: &Arc<MainState>,
    anchor: &CellId,
    new_id: CellId,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    match prev.index_of(anchor) {
        Some(idx) => insert_at(prev, idx, new_id, out),
        None => Arc::clone(prev),
    }
}

pub(super) fn insert_below(
    prev: &Arc<MainState>,
    anchor: &CellId,
    new_id: CellId,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    match prev.index_of(anchor) {
        Some(idx) => insert_at(prev, idx + 1, new_id, out),
        None => Arc::clone(prev),
    }
}

/// Insert an empty code cell at `index` and focus it. A `new_id` that is
/// already in use is ignored.
pub(super) fn insert_at(
    prev: &Arc<MainState>,
    index: usize,
    new_id: CellId,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    if prev.index_of(&new_id).is_some() {
        debug!(target: "actions.dispatch", cell = %new_id, "insert_duplicate_id_ignored");
        return Arc::clone(prev);
    }
    let index = index.min(prev.cell_vms.len());
    let cell = CellRecord::code(new_id.clone(), "");

    let mut next = (**prev).clone();
    next.history.push_undo(&prev.cell_vms);
    next.cell_vms.insert(
        index,
        Arc::new(CellViewModel::prepared_with(cell.clone(), &prev.settings, &prev.matcher)),
    );
    out.push(OutboundMessage::InsertCell {
        cell,
        index,
        code: String::new(),
        code_cell_above_id: next.first_code_cell_above(index),
    });
    trace!(target: "actions.dispatch", cell = %new_id, index, "insert_cell");

    let focused = next.focus_cell(&new_id, CursorPos::Top);
    commit(prev, Some(focused.unwrap_or(next)))
}

pub(super) fn delete_cell(
    prev: &Arc<MainState>,
    id: &CellId,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    let Some(idx) = prev.index_of(id) else {
        return Arc::clone(prev);
    };
    out.push(OutboundMessage::DeleteCell);
    out.push(OutboundMessage::RemoveCell { id: id.clone() });

    let mut next = (**prev).clone();
    next.history.push_undo(&prev.cell_vms);
    next.cell_vms.remove(idx);
    if next.selected_cell_id.as_ref() == Some(id) {
        next.selected_cell_id = None;
    }
    if next.focused_cell_id.as_ref() == Some(id) {
        next.focused_cell_id = None;
    }
    Arc::new(next)
}

pub(super) fn delete_all_cells(
    prev: &Arc<MainState>,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    out.push(OutboundMessage::DeleteAllCells);
    let mut next = (**prev).clone();
    next.history.push_undo(&prev.cell_vms);
    next.cell_vms = Vec::new();
    next.selected_cell_id = None;
    next.focused_cell_id = None;
    debug!(target: "actions.dispatch", removed = prev.cell_vms.len(), "delete_all_cells");
    Arc::new(next)
}

/// Apply a host cell record: update the cell with the same id in place, or
/// append it as a freshly prepared view-model.
pub(super) fn update_or_add(prev: &Arc<MainState>, cell: CellRecord) -> Arc<MainState> {
    let count = cell
        .execution_count()
        .map_or(prev.current_execution_count, |c| {
            c.max(prev.current_execution_count)
        });

    match prev.index_of(&cell.id) {
        Some(idx) => {
            let current = &prev.cell_vms[idx];
            let merged = mutation::merged_host_update(current, &cell);
            if merged == **current && count == prev.current_execution_count {
                return Arc::clone(prev);
            }
            let mut next = (**prev).clone();
            next.cell_vms[idx] = Arc::new(merged);
            next.current_execution_count = count;
            Arc::new(next)
        }
        None => {
            trace!(target: "actions.dispatch", cell = %cell.id, "host_cell_added");
            let mut next = (**prev).clone();
            next.history.push_undo(&prev.cell_vms);
            next.cell_vms
                .push(Arc::new(CellViewModel::prepared_with(
                    cell,
                    &prev.settings,
                    &prev.matcher,
                )));
            next.current_execution_count = count;
            Arc::new(next)
        }
    }
}
