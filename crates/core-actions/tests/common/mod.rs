#![allow(dead_code)] // Shared across several integration tests; each test binary uses a subset of helpers.

use core_actions::{Action, Transition, dispatch};
use core_events::OutboundMessage;
use core_model::{CellId, CellRecord, CursorPos};
use core_state::MainState;
use std::sync::Arc;

/// Code cells `c0..c{n-1}` whose sources are `src{i}`.
pub fn code_cells(n: usize) -> Arc<MainState> {
    Arc::new(
        MainState::default()
            .with_cells((0..n).map(|i| CellRecord::code(format!("c{i}"), &format!("src{i}")))),
    )
}

pub fn with_cells(cells: impl IntoIterator<Item = CellRecord>) -> Arc<MainState> {
    Arc::new(MainState::default().with_cells(cells))
}

pub fn id(s: &str) -> CellId {
    CellId::from(s)
}

/// Dispatch and panic on error; tests only feed well-formed actions here.
pub fn apply(state: &Arc<MainState>, action: Action) -> Transition {
    dispatch(action, state).expect("dispatch failed")
}

/// Fold a sequence of actions, collecting every message in order.
pub fn run(state: &Arc<MainState>, actions: impl IntoIterator<Item = Action>) -> Transition {
    let mut current = Arc::clone(state);
    let mut messages = Vec::new();
    for action in actions {
        let t = apply(&current, action);
        current = t.state;
        messages.extend(t.messages);
    }
    Transition {
        state: current,
        messages,
    }
}

pub fn kinds(messages: &[OutboundMessage]) -> Vec<&'static str> {
    messages.iter().map(OutboundMessage::kind).collect()
}

pub fn ids(state: &MainState) -> Vec<String> {
    state
        .cell_vms
        .iter()
        .map(|vm| vm.cell.id.to_string())
        .collect()
}

pub fn select(cell: &str) -> Action {
    Action::SelectCell {
        cell_id: id(cell),
        cursor_pos: CursorPos::Current,
    }
}

pub fn focus(cell: &str) -> Action {
    Action::FocusCell {
        cell_id: id(cell),
        cursor_pos: CursorPos::Current,
    }
}
