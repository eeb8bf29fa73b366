//! Execution ranges, output clearing and cell type changes.
//!
//! All execution entry points reduce to [`execute_range`] over a contiguous
//! span of positions with one replacement source per position.

use super::commit;
use core_events::OutboundMessage;
use core_model::{CellId, CellViewModel, CursorPos, mutation};
use core_state::MainState;
use std::sync::Arc;
use tracing::trace;

/// Current source of the cell at `idx` (empty for message cells).
fn own_source(state: &MainState, idx: usize) -> String {
    state.cell_vms[idx].cell.source_text().unwrap_or_default()
}

/// Stage positions `start..start + codes.len()` for execution.
///
/// A position whose code is non-empty once a leading cell marker is removed
/// takes that code as its source (code cells also drop their outputs and enter
/// `Executing`). One `ReExecuteCell` is queued per position either way, since
/// the host decides what actually runs.
fn execute_range(
    prev: &Arc<MainState>,
    start: usize,
    codes: Vec<String>,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    let matcher = prev.matcher();
    let mut cells = prev.cell_vms.clone();
    let mut staged = 0usize;

    for (offset, code) in codes.into_iter().enumerate() {
        let pos = start + offset;
        let orig = &prev.cell_vms[pos];
        if orig.cell.data.source().is_some() && !matcher.strip_first_marker(&code).is_empty() {
            let next = mutation::staged_for_execution(orig, &code);
            if next != **orig {
                cells[pos] = Arc::new(next);
                staged += 1;
            }
        }
        out.push(OutboundMessage::ReExecuteCell {
            code,
            id: orig.cell.id.clone(),
        });
    }
    trace!(target: "actions.dispatch", start, staged, "execute_range");

    if staged == 0 {
        return Arc::clone(prev);
    }
    Arc::new(MainState {
        cell_vms: cells,
        ..(**prev).clone()
    })
}

/// Every cell before `id`, each with its own source.
pub(super) fn execute_above(
    prev: &Arc<MainState>,
    id: &CellId,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    match prev.index_of(id) {
        Some(idx) if idx > 0 => {
            let codes = (0..idx).map(|i| own_source(prev, i)).collect();
            execute_range(prev, 0, codes, out)
        }
        _ => Arc::clone(prev),
    }
}

pub(super) fn execute_cell(
    prev: &Arc<MainState>,
    id: &CellId,
    code: String,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    match prev.index_of(id) {
        Some(idx) => execute_range(prev, idx, vec![code], out),
        None => Arc::clone(prev),
    }
}

/// `id` with the supplied code, then every following cell with its own source.
pub(super) fn execute_cell_and_below(
    prev: &Arc<MainState>,
    id: &CellId,
    code: String,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    let Some(idx) = prev.index_of(id) else {
        return Arc::clone(prev);
    };
    let codes = std::iter::once(code)
        .chain((idx + 1..prev.cell_vms.len()).map(|i| own_source(prev, i)))
        .collect();
    execute_range(prev, idx, codes, out)
}

pub(super) fn execute_all_cells(
    prev: &Arc<MainState>,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    match prev.cell_vms.first() {
        Some(first) => {
            let id = first.cell.id.clone();
            execute_cell_and_below(prev, &id, own_source(prev, 0), out)
        }
        None => Arc::clone(prev),
    }
}

pub(super) fn execute_selected_cell(
    prev: &Arc<MainState>,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    let Some(id) = prev.selected_cell_id.clone() else {
        return Arc::clone(prev);
    };
    match prev.index_of(&id) {
        Some(idx) => execute_cell(prev, &id, own_source(prev, idx), out),
        None => Arc::clone(prev),
    }
}

/// Drop outputs and execution counts everywhere. No messages.
pub(super) fn clear_all_outputs(prev: &Arc<MainState>) -> Arc<MainState> {
    let mut changed = false;
    let cells: Vec<Arc<CellViewModel>> = prev
        .cell_vms
        .iter()
        .map(|vm| {
            let next = mutation::with_cleared_outputs(vm);
            if next == **vm {
                Arc::clone(vm)
            } else {
                changed = true;
                Arc::new(next)
            }
        })
        .collect();
    if !changed {
        return Arc::clone(prev);
    }
    Arc::new(MainState {
        cell_vms: cells,
        ..(**prev).clone()
    })
}

/// Toggle code <-> markdown for `id`, announce the change to the host and
/// focus the cell. Message cells never change type.
pub(super) fn change_cell_type(
    prev: &Arc<MainState>,
    id: &CellId,
    current_code: &str,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    let Some(idx) = prev.index_of(id) else {
        return Arc::clone(prev);
    };
    let Some(toggled) = mutation::toggled_type(&prev.cell_vms[idx], current_code) else {
        return Arc::clone(prev);
    };

    if toggled.cell.is_code() {
        out.push(OutboundMessage::InsertCell {
            cell: toggled.cell.clone(),
            index: idx,
            code: current_code.to_owned(),
            code_cell_above_id: prev.first_code_cell_above(idx),
        });
    } else {
        out.push(OutboundMessage::RemoveCell { id: id.clone() });
    }
    trace!(target: "actions.dispatch", cell = %id, to_code = toggled.cell.is_code(), "change_cell_type");

    let mut cells = prev.cell_vms.clone();
    cells[idx] = Arc::new(toggled);
    let intermediate = MainState {
        cell_vms: cells,
        ..(**prev).clone()
    };
    let focused = intermediate.focus_cell(id, CursorPos::Current);
    commit(prev, Some(focused.unwrap_or(intermediate)))
}
