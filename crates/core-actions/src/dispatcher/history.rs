//! Undo / redo over the bounded snapshot stacks held in `MainState::history`.
//!
//! Restoring a snapshot installs its view-models verbatim; the selected and
//! focused ids are re-derived from the restored flags rather than forced.

use core_events::OutboundMessage;
use core_model::CellViewModel;
use core_state::{History, MainState};
use std::sync::Arc;
use tracing::debug;

pub(super) fn undo(prev: &Arc<MainState>, out: &mut Vec<OutboundMessage>) -> Arc<MainState> {
    let mut history = prev.history.clone();
    let Some(cells) = history.undo(&prev.cell_vms) else {
        return Arc::clone(prev);
    };
    debug!(target: "actions.dispatch", op = "undo", cells = cells.len(), undo_depth = history.undo_depth(), redo_depth = history.redo_depth(), "history");
    out.push(OutboundMessage::Undo);
    Arc::new(restore(prev, cells, history))
}

pub(super) fn redo(prev: &Arc<MainState>, out: &mut Vec<OutboundMessage>) -> Arc<MainState> {
    let mut history = prev.history.clone();
    let Some(cells) = history.redo(&prev.cell_vms) else {
        return Arc::clone(prev);
    };
    debug!(target: "actions.dispatch", op = "redo", cells = cells.len(), undo_depth = history.undo_depth(), redo_depth = history.redo_depth(), "history");
    out.push(OutboundMessage::Redo);
    Arc::new(restore(prev, cells, history))
}

fn restore(prev: &MainState, cells: Vec<Arc<CellViewModel>>, history: History) -> MainState {
    let mut next = MainState {
        cell_vms: cells,
        history,
        skip_next_scroll: true,
        ..prev.clone()
    };
    next.sync_selection_ids();
    next
}
