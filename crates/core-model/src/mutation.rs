//! Pure copy-on-write helpers over view-models.
//!
//! Each helper takes a borrowed view-model and returns a new value; nothing is
//! mutated in place. Helpers that may leave the input untouched return
//! `Option`, with `None` meaning "no change" so callers can keep the original
//! `Arc` and preserve pointer equality.

use crate::{CellData, CellRecord, CellViewModel, CursorPos, extract_input_text};
use core_text::{CellMatcher, collapsed_preview};

/// Apply input-block visibility and expand/collapse state to a code cell.
///
/// Non-code cells are never altered. Collapsing replaces `input_block_text`
/// with the first-line preview; expanding restores the full input text. Cells
/// whose input fits on one line keep their text when only `expanded` differs.
pub fn alter_input_block(
    vm: &CellViewModel,
    matcher: &CellMatcher,
    visible: bool,
    expanded: bool,
) -> Option<CellViewModel> {
    if !vm.cell.is_code() {
        return None;
    }
    if vm.input_block_show == visible && vm.input_block_open == expanded {
        return None;
    }

    let mut next = vm.clone();
    next.input_block_show = visible;

    // Newly shown cells pick up the requested expand state too.
    if next.input_block_open != expanded && next.input_block_collapse_needed && next.input_block_show
    {
        let text = extract_input_text(&next.cell, matcher);
        next.input_block_open = expanded;
        next.input_block_text = if expanded {
            text
        } else {
            collapsed_preview(&text)
        };
    }

    if next == *vm { None } else { Some(next) }
}

/// Replace the cell's source, keeping the input block text in sync.
pub fn with_source(vm: &CellViewModel, code: &str) -> CellViewModel {
    CellViewModel {
        cell: vm.cell.with_source(code),
        input_block_text: code.to_owned(),
        ..vm.clone()
    }
}

/// Stage a cell for re-execution with `code` as its new source.
pub fn staged_for_execution(vm: &CellViewModel, code: &str) -> CellViewModel {
    CellViewModel {
        cell: vm.cell.staged_for_execution(code),
        input_block_text: code.to_owned(),
        ..vm.clone()
    }
}

pub fn with_cleared_outputs(vm: &CellViewModel) -> CellViewModel {
    CellViewModel {
        cell: vm.cell.with_cleared_outputs(),
        ..vm.clone()
    }
}

/// Toggle code <-> markdown. `None` for message cells.
pub fn toggled_type(vm: &CellViewModel, code: &str) -> Option<CellViewModel> {
    let cell = vm.cell.toggled_type(code)?;
    Some(CellViewModel {
        cell,
        input_block_text: code.to_owned(),
        ..vm.clone()
    })
}

/// Merge a host-side update into an existing view-model.
///
/// The host is authoritative for state, outputs and execution count only. The
/// local cell keeps its type and source: the user may have edited or retyped
/// it after submitting. Outputs and count are taken only when both sides are
/// code cells.
pub fn merged_host_update(vm: &CellViewModel, incoming: &CellRecord) -> CellViewModel {
    let mut cell = vm.cell.clone();
    cell.state = incoming.state;
    if let (CellData::Code(local), CellData::Code(host)) = (&mut cell.data, &incoming.data) {
        local.outputs = host.outputs.clone();
        local.execution_count = host.execution_count;
    }
    CellViewModel {
        cell,
        ..vm.clone()
    }
}

/// Copy with selection flags replaced. `focused` forces `selected`.
pub fn with_selection(
    vm: &CellViewModel,
    selected: bool,
    focused: bool,
    cursor_pos: Option<CursorPos>,
) -> CellViewModel {
    CellViewModel {
        selected: selected || focused,
        focused,
        cursor_pos: cursor_pos.unwrap_or(vm.cursor_pos),
        ..vm.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellKind, CellState};
    use pretty_assertions::assert_eq;

    fn code_vm(src: &str) -> CellViewModel {
        CellViewModel::new(CellRecord::code("a", src), &CellMatcher::default(), true)
    }

    #[test]
    fn collapse_truncates_to_first_line() {
        let vm = code_vm("def f():\n    return 1\n    # extra");
        let collapsed = alter_input_block(&vm, &CellMatcher::default(), true, false).unwrap();
        assert!(!collapsed.input_block_open);
        assert_eq!(collapsed.input_block_text, "def f():...");

        let expanded = alter_input_block(&collapsed, &CellMatcher::default(), true, true).unwrap();
        assert!(expanded.input_block_open);
        assert_eq!(expanded.input_block_text, "def f():\n    return 1\n    # extra");
    }

    #[test]
    fn unchanged_request_returns_none() {
        let vm = code_vm("a\nb");
        assert!(alter_input_block(&vm, &CellMatcher::default(), true, true).is_none());
        // single line: collapse is not needed so nothing changes
        let single = code_vm("a");
        assert!(alter_input_block(&single, &CellMatcher::default(), true, false).is_none());
    }

    #[test]
    fn markdown_is_never_altered() {
        let vm = CellViewModel::new(
            CellRecord::markdown("m", "# a\nb"),
            &CellMatcher::default(),
            true,
        );
        assert!(alter_input_block(&vm, &CellMatcher::default(), false, false).is_none());
    }

    #[test]
    fn hiding_keeps_expand_state() {
        let vm = code_vm("a\nb");
        let hidden = alter_input_block(&vm, &CellMatcher::default(), false, false).unwrap();
        assert!(!hidden.input_block_show);
        assert!(hidden.input_block_open);
        assert_eq!(hidden.input_block_text, "a\nb");
    }

    #[test]
    fn host_update_keeps_local_source() {
        let vm = with_source(&code_vm("local"), "edited locally");
        let mut incoming = CellRecord::code("a", "submitted");
        incoming.state = CellState::Finished;
        if let CellData::Code(c) = &mut incoming.data {
            c.execution_count = Some(4);
        }
        let merged = merged_host_update(&vm, &incoming);
        assert_eq!(merged.cell.source_text().as_deref(), Some("edited locally"));
        assert_eq!(merged.cell.execution_count(), Some(4));
    }

    #[test]
    fn host_update_never_changes_cell_type() {
        let md = CellViewModel::new(
            CellRecord::markdown("a", "# retyped"),
            &CellMatcher::default(),
            true,
        );
        let mut incoming = CellRecord::code("a", "x = 1");
        incoming.state = CellState::Error;
        if let CellData::Code(c) = &mut incoming.data {
            c.outputs.push(serde_json::json!({"output_type": "error"}));
        }
        let merged = merged_host_update(&md, &incoming);
        assert_eq!(merged.cell.kind(), CellKind::Markdown);
        assert_eq!(merged.cell.source_text().as_deref(), Some("# retyped"));
        assert_eq!(merged.cell.state, CellState::Error);

        let msg = CellViewModel::new(
            CellRecord::message("m", vec!["restarted".into()]),
            &CellMatcher::default(),
            true,
        );
        let merged = merged_host_update(&msg, &CellRecord::code("m", "y"));
        assert_eq!(merged.cell.data, msg.cell.data);
    }

    #[test]
    fn selection_focus_implies_selected() {
        let vm = with_selection(&code_vm("x"), false, true, Some(CursorPos::Top));
        assert!(vm.selected && vm.focused);
        assert_eq!(vm.cursor_pos, CursorPos::Top);
    }

    #[test]
    fn toggle_updates_input_text() {
        let vm = toggled_type(&code_vm("x"), "# heading").unwrap();
        assert_eq!(vm.cell.kind(), CellKind::Markdown);
        assert_eq!(vm.input_block_text, "# heading");
    }
}
