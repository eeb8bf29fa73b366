//! Per-cell presentation toggles, bulk collapse/expand, settings and the
//! dirty flag. Selection and focus transitions live on `MainState` itself.

use super::commit;
use crate::DispatchError;
use core_config::{FontSettings, NotebookSettings, compute_editor_options};
use core_events::OutboundMessage;
use core_model::{CellId, CellViewModel, cell_matcher, mutation};
use core_state::MainState;
use std::sync::Arc;
use tracing::{debug, trace};

/// Replace the view-model for `id` with `f(vm)`; `None` from `f` or an
/// unknown id keeps the previous state.
fn replace_cell<F>(prev: &Arc<MainState>, id: &CellId, f: F) -> Arc<MainState>
where
    F: FnOnce(&CellViewModel) -> Option<CellViewModel>,
{
    let next = prev.index_of(id).and_then(|idx| {
        let vm = f(&prev.cell_vms[idx])?;
        let mut cells = prev.cell_vms.clone();
        cells[idx] = Arc::new(vm);
        Some(MainState {
            cell_vms: cells,
            ..(**prev).clone()
        })
    });
    commit(prev, next)
}

pub(super) fn toggle_line_numbers(prev: &Arc<MainState>, id: &CellId) -> Arc<MainState> {
    replace_cell(prev, id, |vm| {
        Some(CellViewModel {
            show_line_numbers: !vm.show_line_numbers,
            ..vm.clone()
        })
    })
}

pub(super) fn toggle_output(prev: &Arc<MainState>, id: &CellId) -> Arc<MainState> {
    replace_cell(prev, id, |vm| {
        Some(CellViewModel {
            hide_output: !vm.hide_output,
            ..vm.clone()
        })
    })
}

/// Flip one code cell between expanded and collapsed, keeping visibility.
pub(super) fn toggle_input_block(prev: &Arc<MainState>, id: &CellId) -> Arc<MainState> {
    let matcher = prev.matcher();
    replace_cell(prev, id, |vm| {
        mutation::alter_input_block(vm, matcher, vm.input_block_show, !vm.input_block_open)
    })
}

/// Expand or collapse every code cell. Visibility follows the current
/// settings. Cells that do not change keep their `Arc`.
pub(super) fn set_all_expanded(prev: &Arc<MainState>, expanded: bool) -> Arc<MainState> {
    let matcher = prev.matcher();
    let visible = prev.settings.show_cell_input_code;
    let mut changed = 0usize;
    let cells: Vec<Arc<CellViewModel>> = prev
        .cell_vms
        .iter()
        .map(|vm| match mutation::alter_input_block(vm, matcher, visible, expanded) {
            Some(next) => {
                changed += 1;
                Arc::new(next)
            }
            None => Arc::clone(vm),
        })
        .collect();
    trace!(target: "actions.dispatch", expanded, changed, "set_all_expanded");
    if changed == 0 {
        return Arc::clone(prev);
    }
    Arc::new(MainState {
        cell_vms: cells,
        ..(**prev).clone()
    })
}

pub(super) fn set_dirty(prev: &Arc<MainState>, dirty: bool) -> Arc<MainState> {
    if prev.dirty == dirty {
        return Arc::clone(prev);
    }
    Arc::new(MainState {
        dirty,
        ..(**prev).clone()
    })
}

/// Install a new settings document. A theme change asks the host for fresh
/// CSS and editor theme data, in that order.
pub(super) fn update_settings(
    prev: &Arc<MainState>,
    payload: &str,
    out: &mut Vec<OutboundMessage>,
) -> Result<Arc<MainState>, DispatchError> {
    let settings = NotebookSettings::from_json(payload)?;
    let editor_options = compute_editor_options(&settings);
    let font = FontSettings::from_settings(&settings, &prev.font);
    let matcher = cell_matcher(&settings);

    let mut theme_name = prev.theme_name.clone();
    let mut known_dark = prev.known_dark;
    if let Some(theme) = settings.theme() {
        if prev.theme_name.as_deref() != Some(theme) {
            known_dark = settings.known_dark();
            theme_name = Some(theme.to_owned());
            debug!(target: "actions.dispatch", theme, known_dark, "theme_changed");
            out.push(OutboundMessage::GetCssRequest { is_dark: known_dark });
            out.push(OutboundMessage::GetMonacoThemeRequest { is_dark: known_dark });
        }
    }

    if settings == *prev.settings
        && editor_options == prev.editor_options
        && font == prev.font
        && theme_name == prev.theme_name
    {
        return Ok(Arc::clone(prev));
    }
    Ok(Arc::new(MainState {
        settings: Arc::new(settings),
        matcher,
        editor_options,
        font,
        theme_name,
        known_dark,
        ..(**prev).clone()
    }))
}
