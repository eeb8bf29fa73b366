//! Message-only reducers: they read the current state to build one outbound
//! message and always hand back the previous state untouched. A missing
//! target cell means no message.

use core_events::OutboundMessage;
use core_model::{CellId, TextChange, extract_input_text};
use core_state::MainState;
use std::sync::Arc;

pub(super) fn export_cells(prev: &Arc<MainState>, out: &mut Vec<OutboundMessage>) -> Arc<MainState> {
    out.push(OutboundMessage::Export(prev.cell_records()));
    Arc::clone(prev)
}

/// Assumes editor contents were already flushed into the cells (that happens
/// on unfocus). The dirty flag is cleared only when the host confirms.
pub(super) fn save(prev: &Arc<MainState>, out: &mut Vec<OutboundMessage>) -> Arc<MainState> {
    out.push(OutboundMessage::SaveAll {
        cells: prev.cell_records(),
    });
    Arc::clone(prev)
}

pub(super) fn show_data_viewer(
    prev: &Arc<MainState>,
    variable_name: String,
    column_size: usize,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    out.push(OutboundMessage::ShowDataViewer {
        variable_name,
        column_size,
    });
    Arc::clone(prev)
}

pub(super) fn send_command(
    prev: &Arc<MainState>,
    command: String,
    command_type: String,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    out.push(OutboundMessage::NativeCommand {
        command,
        source: command_type,
    });
    Arc::clone(prev)
}

pub(super) fn show_plot(
    prev: &Arc<MainState>,
    image_html: String,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    out.push(OutboundMessage::ShowPlot(image_html));
    Arc::clone(prev)
}

pub(super) fn open_link(
    prev: &Arc<MainState>,
    uri: String,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    out.push(OutboundMessage::OpenLink(uri));
    Arc::clone(prev)
}

pub(super) fn get_all_cells(prev: &Arc<MainState>, out: &mut Vec<OutboundMessage>) -> Arc<MainState> {
    out.push(OutboundMessage::ReturnAllCells(prev.cell_records()));
    Arc::clone(prev)
}

/// Code cells only.
pub(super) fn goto_cell(
    prev: &Arc<MainState>,
    id: &CellId,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    if let Some(vm) = prev.cell(id).filter(|vm| vm.cell.is_code()) {
        out.push(OutboundMessage::GotoCodeCell {
            file: vm.cell.file.clone(),
            line: vm.cell.line,
        });
    }
    Arc::clone(prev)
}

/// Falls back to the trailing edit cell when `id` is not in the sequence.
pub(super) fn copy_cell_code(
    prev: &Arc<MainState>,
    id: &CellId,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    if let Some(vm) = prev.cell_or_edit_cell(id) {
        out.push(OutboundMessage::CopyCodeCell {
            source: extract_input_text(&vm.cell, prev.matcher()),
        });
    }
    Arc::clone(prev)
}

pub(super) fn gather(
    prev: &Arc<MainState>,
    id: &CellId,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    if let Some(vm) = prev.cell(id) {
        out.push(OutboundMessage::GatherCodeRequest(vm.cell.clone()));
    }
    Arc::clone(prev)
}

/// Forward editor changes to the host. The edit cell counts as a target.
pub(super) fn edit_cell(
    prev: &Arc<MainState>,
    id: CellId,
    changes: Vec<TextChange>,
    out: &mut Vec<OutboundMessage>,
) -> Arc<MainState> {
    if prev.cell_or_edit_cell(&id).is_some() {
        out.push(OutboundMessage::EditCell { changes, id });
    }
    Arc::clone(prev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::{CellRecord, EDIT_CELL_ID};

    fn state() -> Arc<MainState> {
        let mut located = CellRecord::code("a", "# %%\nimport os");
        located.file = Some("analysis.py".into());
        located.line = Some(12);
        Arc::new(
            MainState::default()
                .with_cells([located, CellRecord::markdown("m", "# notes")])
                .with_edit_cell(),
        )
    }

    #[test]
    fn transfers_never_change_state() {
        let prev = state();
        let mut out = Vec::new();
        let results = [
            export_cells(&prev, &mut out),
            save(&prev, &mut out),
            get_all_cells(&prev, &mut out),
            show_plot(&prev, "<svg/>".into(), &mut out),
            open_link(&prev, "https://example.com".into(), &mut out),
            send_command(&prev, "a".into(), "keyboard".into(), &mut out),
            show_data_viewer(&prev, "df".into(), 10, &mut out),
        ];
        for next in &results {
            assert!(Arc::ptr_eq(next, &prev));
        }
        let kinds: Vec<_> = out.iter().map(OutboundMessage::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "Export",
                "SaveAll",
                "ReturnAllCells",
                "ShowPlot",
                "OpenLink",
                "NativeCommand",
                "ShowDataViewer"
            ]
        );
    }

    #[test]
    fn goto_only_for_code_cells() {
        let prev = state();
        let mut out = Vec::new();
        goto_cell(&prev, &"m".into(), &mut out);
        assert!(out.is_empty());
        goto_cell(&prev, &"a".into(), &mut out);
        assert_eq!(
            out,
            vec![OutboundMessage::GotoCodeCell {
                file: Some("analysis.py".into()),
                line: Some(12)
            }]
        );
    }

    #[test]
    fn copy_strips_marker_and_falls_back_to_edit_cell() {
        let prev = state();
        let mut out = Vec::new();
        copy_cell_code(&prev, &"a".into(), &mut out);
        copy_cell_code(&prev, &EDIT_CELL_ID.into(), &mut out);
        copy_cell_code(&prev, &"missing".into(), &mut out);
        assert_eq!(
            out,
            vec![
                OutboundMessage::CopyCodeCell {
                    source: "import os".into()
                },
                OutboundMessage::CopyCodeCell {
                    source: String::new()
                },
            ]
        );
    }

    #[test]
    fn gather_and_edit_tolerate_missing_cells() {
        let prev = state();
        let mut out = Vec::new();
        gather(&prev, &"missing".into(), &mut out);
        edit_cell(&prev, "missing".into(), Vec::new(), &mut out);
        assert!(out.is_empty());
        gather(&prev, &"a".into(), &mut out);
        edit_cell(&prev, "a".into(), Vec::new(), &mut out);
        let kinds: Vec<_> = out.iter().map(OutboundMessage::kind).collect();
        assert_eq!(kinds, vec!["GatherCodeRequest", "EditCell"]);
    }
}
