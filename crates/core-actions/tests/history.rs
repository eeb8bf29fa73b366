mod common;

use common::*;
use core_actions::Action;
use core_state::MainState;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn insert_below(anchor: &str, new_id: &str) -> Action {
    Action::InsertBelow {
        cell_id: id(anchor),
        new_cell_id: id(new_id),
    }
}

#[test]
fn delete_all_on_three_cells() {
    let prev = code_cells(3);
    let t = run(&prev, [focus("c1"), Action::DeleteAllCells]);
    assert!(t.state.cell_vms.is_empty());
    assert_eq!(t.state.selected_cell_id, None);
    assert_eq!(t.state.focused_cell_id, None);
    assert_eq!(kinds(&t.messages), vec!["DeleteAllCells"]);
    let top = t.state.history.undo_top().expect("pre-delete snapshot");
    assert_eq!(top.len(), 3);
}

#[test]
fn undo_restores_sequence_before_last_push_and_redo_reapplies() {
    let prev = code_cells(2);
    let after_insert = apply(&prev, insert_below("c0", "n")).state;
    let after_delete = apply(&after_insert, Action::DeleteCell { cell_id: id("c1") }).state;

    let undone = apply(&after_delete, Action::Undo);
    assert_eq!(kinds(&undone.messages), vec!["Undo"]);
    assert_eq!(undone.state.cell_vms, after_insert.cell_vms);
    assert!(undone.state.skip_next_scroll);
    undone.state.check_invariants().unwrap();

    let redone = apply(&undone.state, Action::Redo);
    assert_eq!(kinds(&redone.messages), vec!["Redo"]);
    assert_eq!(redone.state.cell_vms, after_delete.cell_vms);
    redone.state.check_invariants().unwrap();
}

#[test]
fn undo_and_redo_on_empty_stacks_are_identity() {
    let prev = code_cells(2);
    for action in [Action::Undo, Action::Redo] {
        let t = apply(&prev, action);
        assert!(Arc::ptr_eq(&t.state, &prev));
        assert!(t.messages.is_empty());
    }
}

#[test]
fn undo_derives_selection_from_restored_cells() {
    // focus c1, delete it, undo: c1 comes back focused and selected
    let t = run(
        &code_cells(2),
        [focus("c1"), Action::DeleteCell { cell_id: id("c1") }],
    );
    assert_eq!(t.state.focused_cell_id, None);
    let undone = apply(&t.state, Action::Undo).state;
    assert_eq!(undone.focused_cell_id, Some(id("c1")));
    assert_eq!(undone.selected_cell_id, Some(id("c1")));
    undone.check_invariants().unwrap();
}

#[test]
fn new_mutation_after_undo_keeps_redo_stack() {
    let prev = code_cells(1);
    let t = run(
        &prev,
        [
            insert_below("c0", "a"),
            Action::Undo,
            insert_below("c0", "b"),
        ],
    );
    assert_eq!(t.state.history.redo_depth(), 1);
    assert_eq!(ids(&t.state), vec!["c0", "b"]);

    // redo still reaches the divergent branch
    let redone = apply(&t.state, Action::Redo).state;
    assert_eq!(ids(&redone), vec!["c0", "a"]);
}

#[test]
fn depth_bound_drops_oldest_snapshot() {
    let prev = Arc::new(
        MainState::new(Default::default(), 2).with_cells([core_model::CellRecord::code("c0", "x")]),
    );
    let t = run(
        &prev,
        [
            insert_below("c0", "a"),
            insert_below("c0", "b"),
            insert_below("c0", "c"),
        ],
    );
    assert_eq!(t.state.history.undo_depth(), 2);
    let once = apply(&t.state, Action::Undo).state;
    let twice = apply(&once, Action::Undo).state;
    assert_eq!(ids(&twice), vec!["c0", "a"]);
    let thrice = apply(&twice, Action::Undo);
    assert!(Arc::ptr_eq(&thrice.state, &twice));
}

#[test]
fn host_start_of_unknown_cell_is_undoable() {
    let prev = code_cells(1);
    let t = apply(
        &prev,
        Action::StartCell(core_model::CellRecord::code("h", "print(1)")),
    );
    assert_eq!(ids(&t.state), vec!["c0", "h"]);
    let undone = apply(&t.state, Action::Undo).state;
    assert_eq!(undone.cell_vms, prev.cell_vms);
}
