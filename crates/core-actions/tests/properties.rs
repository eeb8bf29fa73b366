//! Property-based tests over random action sequences.

mod common;

use common::*;
use core_actions::{Action, dispatch};
use core_model::CursorPos;
use proptest::prelude::*;
use std::sync::Arc;

const IDS: &[&str] = &["c0", "c1", "c2", "c3", "c4", "ghost"];

fn cell_id() -> impl Strategy<Value = String> {
    prop::sample::select(IDS).prop_map(str::to_owned)
}

fn cursor() -> impl Strategy<Value = CursorPos> {
    prop_oneof![
        Just(CursorPos::Top),
        Just(CursorPos::Bottom),
        Just(CursorPos::Current)
    ]
}

fn selection_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (cell_id(), cursor()).prop_map(|(c, p)| Action::SelectCell {
            cell_id: id(&c),
            cursor_pos: p
        }),
        (cell_id(), cursor()).prop_map(|(c, p)| Action::FocusCell {
            cell_id: id(&c),
            cursor_pos: p
        }),
        (cell_id(), "[a-z ]{0,8}").prop_map(|(c, code)| Action::UnfocusCell {
            cell_id: id(&c),
            code
        }),
        cell_id().prop_map(|c| Action::SelectNextCell { cell_id: id(&c) }),
        cell_id().prop_map(|c| Action::ToggleInputBlock { cell_id: id(&c) }),
        Just(Action::CollapseAll),
        Just(Action::ExpandAll),
    ]
}

fn structural_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (cell_id(), "[a-z]{0,6}").prop_map(|(c, code)| Action::ExecuteCellAndBelow {
            cell_id: id(&c),
            code
        }),
        (cell_id(), "[a-z]{0,6}").prop_map(|(c, current_code)| Action::ChangeCellType {
            cell_id: id(&c),
            current_code
        }),
        cell_id().prop_map(|c| Action::DeleteCell { cell_id: id(&c) }),
        (cell_id(), 0u32..1000).prop_map(|(c, n)| Action::InsertBelow {
            cell_id: id(&c),
            new_cell_id: id(&format!("n{n}")),
        }),
        Just(Action::Undo),
        Just(Action::Redo),
        Just(Action::ExecuteSelectedCell),
    ]
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![selection_action(), structural_action()]
}

/// Actions that record the prior sequence on the undo stack.
fn history_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        cell_id().prop_map(|c| Action::DeleteCell { cell_id: id(&c) }),
        Just(Action::DeleteAllCells),
        (cell_id(), 1000u32..2000).prop_map(|(c, n)| Action::InsertAbove {
            cell_id: id(&c),
            new_cell_id: id(&format!("n{n}")),
        }),
        (0u32..1000).prop_map(|n| Action::InsertAboveFirst {
            new_cell_id: id(&format!("first{n}")),
        }),
    ]
}

proptest! {
    // Selection exclusivity and focus => selected hold after every step.
    #[test]
    fn selection_invariants_hold(actions in prop::collection::vec(action(), 0..40)) {
        let mut state = code_cells(5);
        for action in actions {
            state = dispatch(action, &state).unwrap().state;
            prop_assert!(state.check_invariants().is_ok(), "{:?}", state.check_invariants());
        }
    }

    // A transition that reports no change hands back the very same Arc.
    #[test]
    fn unchanged_state_keeps_identity(actions in prop::collection::vec(action(), 0..30)) {
        let mut state = code_cells(5);
        for action in actions {
            let t = dispatch(action, &state).unwrap();
            if *t.state == *state {
                prop_assert!(!t.changed(&state) || t.state.history != state.history);
            }
            state = t.state;
        }
    }

    // Undo after a history-pushing action restores the sequence before it;
    // redo then restores the sequence right after it.
    #[test]
    fn undo_redo_symmetry(prefix in prop::collection::vec(action(), 0..20), last in history_action()) {
        let mut state = code_cells(5);
        for action in prefix {
            state = dispatch(action, &state).unwrap().state;
        }
        let before = Arc::clone(&state);
        let after = dispatch(last, &before).unwrap().state;
        prop_assume!(!Arc::ptr_eq(&after, &before));

        let undone = dispatch(Action::Undo, &after).unwrap().state;
        prop_assert_eq!(&undone.cell_vms, &before.cell_vms);
        let redone = dispatch(Action::Redo, &undone).unwrap().state;
        prop_assert_eq!(&redone.cell_vms, &after.cell_vms);
    }
}
