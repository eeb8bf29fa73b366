//! Reducer-visible application state.
//!
//! `MainState` is treated as an immutable value: transitions clone it (cheap:
//! view-models sit behind `Arc`), change the clone and publish the result,
//! so readers never observe a partially applied transition.
//!
//! Invariants (checked by [`MainState::check_invariants`]):
//! * At most one view-model has `selected = true`, and its id equals
//!   `selected_cell_id` (or both are absent).
//! * At most one has `focused = true`, its id equals `focused_cell_id`, and
//!   the focused cell is also the selected one.
//! * Cell ids are unique within the sequence.
//!
//! Submodules:
//! * `history`   - bounded undo/redo snapshot stacks.
//! * `selection` - the select/focus state machine.

use core_config::{Config, EditorOptions, FontSettings, NotebookSettings, compute_editor_options};
use core_model::{CellId, CellRecord, CellViewModel, cell_matcher};
use core_text::CellMatcher;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

pub mod history;
mod selection;

pub use history::{History, Snapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainState {
    /// Canonical notebook order. Indices are positional, not identity.
    pub cell_vms: Vec<Arc<CellViewModel>>,
    pub selected_cell_id: Option<CellId>,
    pub focused_cell_id: Option<CellId>,
    /// Trailing "new cell" editor (interactive mode only); not part of the sequence.
    pub edit_cell_vm: Option<Arc<CellViewModel>>,
    pub history: History,
    pub dirty: bool,
    pub skip_next_scroll: bool,
    pub current_execution_count: u32,
    pub settings: Arc<NotebookSettings>,
    /// Marker matcher compiled from `settings`; rebuilt whenever they change.
    pub matcher: CellMatcher,
    pub editor_options: EditorOptions,
    pub font: FontSettings,
    pub theme_name: Option<String>,
    pub known_dark: bool,
}

impl Default for MainState {
    fn default() -> Self {
        Self::new(NotebookSettings::default(), history::DEFAULT_HISTORY_DEPTH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{count} cells are selected")]
    MultipleSelected { count: usize },
    #[error("{count} cells are focused")]
    MultipleFocused { count: usize },
    #[error("selected flag on {flagged:?} disagrees with selected_cell_id {recorded:?}")]
    SelectionMismatch {
        flagged: Option<CellId>,
        recorded: Option<CellId>,
    },
    #[error("focused flag on {flagged:?} disagrees with focused_cell_id {recorded:?}")]
    FocusMismatch {
        flagged: Option<CellId>,
        recorded: Option<CellId>,
    },
    #[error("cell {0} is focused but not selected")]
    FocusWithoutSelection(CellId),
    #[error("cell id {0} appears more than once")]
    DuplicateId(CellId),
}

impl MainState {
    pub fn new(settings: NotebookSettings, history_depth: usize) -> Self {
        let editor_options = compute_editor_options(&settings);
        let known_dark = settings.known_dark();
        let theme_name = settings.theme().map(str::to_owned);
        let font = FontSettings::from_settings(&settings, &FontSettings::default());
        let matcher = cell_matcher(&settings);
        Self {
            cell_vms: Vec::new(),
            selected_cell_id: None,
            focused_cell_id: None,
            edit_cell_vm: None,
            history: History::new(history_depth),
            dirty: false,
            skip_next_scroll: false,
            current_execution_count: 0,
            settings: Arc::new(settings),
            matcher,
            editor_options,
            font,
            theme_name,
            known_dark,
        }
    }

    /// Initial state honouring the loaded configuration.
    pub fn from_config(cfg: &Config) -> Self {
        let state = Self::new(cfg.initial_settings(), cfg.effective_history_depth);
        if cfg.edit_cell_enabled() {
            state.with_edit_cell()
        } else {
            state
        }
    }

    /// Builder: install the trailing edit cell.
    pub fn with_edit_cell(mut self) -> Self {
        self.edit_cell_vm = Some(Arc::new(CellViewModel::edit_cell()));
        self
    }

    /// Builder: replace the sequence with prepared view-models for `cells`.
    pub fn with_cells(mut self, cells: impl IntoIterator<Item = CellRecord>) -> Self {
        self.cell_vms = cells
            .into_iter()
            .map(|c| Arc::new(CellViewModel::prepared_with(c, &self.settings, &self.matcher)))
            .collect();
        self
    }

    pub fn matcher(&self) -> &CellMatcher {
        &self.matcher
    }

    /// Position of `id` in the sequence (linear scan).
    pub fn index_of(&self, id: &CellId) -> Option<usize> {
        self.cell_vms.iter().position(|vm| &vm.cell.id == id)
    }

    pub fn cell(&self, id: &CellId) -> Option<&Arc<CellViewModel>> {
        self.cell_vms.iter().find(|vm| &vm.cell.id == id)
    }

    /// Look up `id` in the sequence, falling back to the trailing edit cell.
    pub fn cell_or_edit_cell(&self, id: &CellId) -> Option<&Arc<CellViewModel>> {
        self.cell(id).or_else(|| {
            self.edit_cell_vm
                .as_ref()
                .filter(|vm| &vm.cell.id == id)
        })
    }

    /// Id of the nearest code cell positioned before `index`.
    pub fn first_code_cell_above(&self, index: usize) -> Option<CellId> {
        self.cell_vms[..index.min(self.cell_vms.len())]
            .iter()
            .rev()
            .find(|vm| vm.cell.is_code())
            .map(|vm| vm.cell.id.clone())
    }

    /// Durable cell records in notebook order.
    pub fn cell_records(&self) -> Vec<CellRecord> {
        self.cell_vms.iter().map(|vm| vm.cell.clone()).collect()
    }

    /// Re-derive the selected / focused ids from the view-model flags. Used
    /// after a snapshot is installed wholesale.
    pub fn sync_selection_ids(&mut self) {
        self.selected_cell_id = self
            .cell_vms
            .iter()
            .find(|vm| vm.selected)
            .map(|vm| vm.cell.id.clone());
        self.focused_cell_id = self
            .cell_vms
            .iter()
            .find(|vm| vm.focused)
            .map(|vm| vm.cell.id.clone());
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seen = HashSet::with_capacity(self.cell_vms.len());
        for vm in &self.cell_vms {
            if !seen.insert(&vm.cell.id) {
                return Err(InvariantViolation::DuplicateId(vm.cell.id.clone()));
            }
            if vm.focused && !vm.selected {
                return Err(InvariantViolation::FocusWithoutSelection(vm.cell.id.clone()));
            }
        }

        let selected: Vec<&CellId> = self
            .cell_vms
            .iter()
            .filter(|vm| vm.selected)
            .map(|vm| &vm.cell.id)
            .collect();
        if selected.len() > 1 {
            return Err(InvariantViolation::MultipleSelected {
                count: selected.len(),
            });
        }
        if selected.first().copied() != self.selected_cell_id.as_ref() {
            return Err(InvariantViolation::SelectionMismatch {
                flagged: selected.first().map(|id| (*id).clone()),
                recorded: self.selected_cell_id.clone(),
            });
        }

        let focused: Vec<&CellId> = self
            .cell_vms
            .iter()
            .filter(|vm| vm.focused)
            .map(|vm| &vm.cell.id)
            .collect();
        if focused.len() > 1 {
            return Err(InvariantViolation::MultipleFocused {
                count: focused.len(),
            });
        }
        if focused.first().copied() != self.focused_cell_id.as_ref() {
            return Err(InvariantViolation::FocusMismatch {
                flagged: focused.first().map(|id| (*id).clone()),
                recorded: self.focused_cell_id.clone(),
            });
        }
        Ok(())
    }
}
