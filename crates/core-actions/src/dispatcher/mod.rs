//! Reducer dispatch: `(action, previous state) -> (next state, messages)`.
//!
//! Sub-modules, one per concern:
//! * `effects`   - selection / focus, per-cell toggles, settings, dirty flag
//! * `execution` - execution ranges, output clearing, cell type changes
//! * `history`   - undo / redo
//! * `creation`  - insert / delete / host cell lifecycle
//! * `transfer`  - message-only reducers
//!
//! Every reducer borrows the previous `Arc<MainState>` and returns either a
//! freshly built state or a clone of that same `Arc` when nothing changed.
//! Downstream change detection relies on `Arc::ptr_eq`, so a no-op must never
//! return a structurally equal copy.

use crate::{Action, DispatchError};
use core_events::{InboundMessage, OutboundMessage};
use core_state::MainState;
use std::sync::Arc;
use tracing::debug;

mod creation;
mod effects;
mod execution;
mod history;
mod transfer;

/// Outcome of one dispatch.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: Arc<MainState>,
    /// Outbound messages in emission order.
    pub messages: Vec<OutboundMessage>,
}

impl Transition {
    /// Whether the state differs (by identity) from `prev`.
    pub fn changed(&self, prev: &Arc<MainState>) -> bool {
        !Arc::ptr_eq(&self.state, prev)
    }
}

/// Keep `prev` when a transition reports no change.
pub(crate) fn commit(prev: &Arc<MainState>, next: Option<MainState>) -> Arc<MainState> {
    match next {
        Some(state) => Arc::new(state),
        None => Arc::clone(prev),
    }
}

/// Apply `action` to `prev`.
pub fn dispatch(action: Action, prev: &Arc<MainState>) -> Result<Transition, DispatchError> {
    let kind = action.kind();
    let mut out = Vec::new();

    let state = match action {
        Action::FocusCell {
            cell_id,
            cursor_pos,
        } => commit(prev, prev.focus_cell(&cell_id, cursor_pos)),
        Action::UnfocusCell { cell_id, code } => commit(prev, prev.unfocus_cell(&cell_id, &code)),
        Action::SelectCell {
            cell_id,
            cursor_pos,
        } => commit(prev, prev.select_cell(&cell_id, cursor_pos)),
        Action::SelectNextCell { cell_id } => commit(prev, prev.select_next_cell(&cell_id)),
        Action::ToggleLineNumbers { cell_id } => effects::toggle_line_numbers(prev, &cell_id),
        Action::ToggleOutput { cell_id } => effects::toggle_output(prev, &cell_id),
        Action::ToggleInputBlock { cell_id } => effects::toggle_input_block(prev, &cell_id),
        Action::ExpandAll => effects::set_all_expanded(prev, true),
        Action::CollapseAll => effects::set_all_expanded(prev, false),
        Action::NotebookDirty => effects::set_dirty(prev, true),
        Action::NotebookClean => effects::set_dirty(prev, false),
        Action::UpdateSettings(payload) => effects::update_settings(prev, &payload, &mut out)?,

        Action::ExecuteCell { cell_id, code } => execution::execute_cell(prev, &cell_id, code, &mut out),
        Action::ExecuteAbove { cell_id } => execution::execute_above(prev, &cell_id, &mut out),
        Action::ExecuteCellAndBelow { cell_id, code } => {
            execution::execute_cell_and_below(prev, &cell_id, code, &mut out)
        }
        Action::ExecuteAllCells => execution::execute_all_cells(prev, &mut out),
        Action::ExecuteSelectedCell => execution::execute_selected_cell(prev, &mut out),
        Action::ClearAllOutputs => execution::clear_all_outputs(prev),
        Action::ChangeCellType {
            cell_id,
            current_code,
        } => execution::change_cell_type(prev, &cell_id, &current_code, &mut out),

        Action::Undo => history::undo(prev, &mut out),
        Action::Redo => history::redo(prev, &mut out),

        Action::InsertAbove {
            cell_id,
            new_cell_id,
        } => creation::insert_above(prev, &cell_id, new_cell_id, &mut out),
        Action::InsertBelow {
            cell_id,
            new_cell_id,
        } => creation::insert_below(prev, &cell_id, new_cell_id, &mut out),
        Action::InsertAboveFirst { new_cell_id } => {
            creation::insert_at(prev, 0, new_cell_id, &mut out)
        }
        Action::DeleteCell { cell_id } => creation::delete_cell(prev, &cell_id, &mut out),
        Action::DeleteAllCells => creation::delete_all_cells(prev, &mut out),
        Action::StartCell(cell) | Action::UpdateCell(cell) | Action::FinishCell(cell) => {
            creation::update_or_add(prev, cell)
        }

        Action::Export => transfer::export_cells(prev, &mut out),
        Action::Save => transfer::save(prev, &mut out),
        Action::ShowDataViewer {
            variable_name,
            column_size,
        } => transfer::show_data_viewer(prev, variable_name, column_size, &mut out),
        Action::SendCommand {
            command,
            command_type,
        } => transfer::send_command(prev, command, command_type, &mut out),
        Action::ShowPlot { image_html } => transfer::show_plot(prev, image_html, &mut out),
        Action::OpenLink { uri } => transfer::open_link(prev, uri, &mut out),
        Action::GetAllCells => transfer::get_all_cells(prev, &mut out),
        Action::GotoCell { cell_id } => transfer::goto_cell(prev, &cell_id, &mut out),
        Action::CopyCellCode { cell_id } => transfer::copy_cell_code(prev, &cell_id, &mut out),
        Action::Gather { cell_id } => transfer::gather(prev, &cell_id, &mut out),
        Action::EditCell { cell_id, changes } => {
            transfer::edit_cell(prev, cell_id, changes, &mut out)
        }
    };

    let changed = !Arc::ptr_eq(&state, prev);
    debug!(target: "actions.dispatch", kind, changed, messages = out.len(), cells = state.cell_vms.len(), "dispatched");
    Ok(Transition {
        state,
        messages: out,
    })
}

/// Decode an inbound envelope and dispatch it.
pub fn dispatch_envelope(
    msg: &InboundMessage,
    prev: &Arc<MainState>,
) -> Result<Transition, DispatchError> {
    let action = Action::decode(msg)?;
    dispatch(action, prev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{CellRecord, CursorPos};
    use serde_json::json;

    fn state(ids: &[&str]) -> Arc<MainState> {
        Arc::new(MainState::default().with_cells(ids.iter().map(|id| CellRecord::code(*id, "x"))))
    }

    #[test]
    fn unknown_id_returns_same_arc() {
        let prev = state(&["a", "b"]);
        let t = dispatch(
            Action::SelectCell {
                cell_id: "missing".into(),
                cursor_pos: CursorPos::Top,
            },
            &prev,
        )
        .unwrap();
        assert!(Arc::ptr_eq(&t.state, &prev));
        assert!(t.messages.is_empty());
        assert!(!t.changed(&prev));
    }

    #[test]
    fn envelope_path_decodes_then_reduces() {
        let prev = state(&["a", "b"]);
        let msg = InboundMessage::new("FocusCell", json!({"cellId": "b", "cursorPos": "top"}));
        let t = dispatch_envelope(&msg, &prev).unwrap();
        assert!(t.changed(&prev));
        assert_eq!(t.state.focused_cell_id, Some("b".into()));
        t.state.check_invariants().unwrap();
    }

    #[test]
    fn envelope_with_unknown_kind_fails_before_reducing() {
        let prev = state(&["a"]);
        let msg = InboundMessage::new("Teleport", json!({}));
        assert!(matches!(
            dispatch_envelope(&msg, &prev),
            Err(DispatchError::UnknownActionKind(_))
        ));
    }
}
