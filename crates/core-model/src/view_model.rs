use crate::{CellData, CellId, CellRecord, CellState, CodeCell, CursorPos};
use core_config::NotebookSettings;
use core_text::CellMatcher;
use serde::{Deserialize, Serialize};

/// Id of the always-present trailing edit cell in interactive mode.
pub const EDIT_CELL_ID: &str = "3D3AB152-ADC1-4501-B813-4B83B49B0C10";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellViewModel {
    pub cell: CellRecord,
    pub editable: bool,
    pub selected: bool,
    pub focused: bool,
    pub cursor_pos: CursorPos,
    pub input_block_show: bool,
    pub input_block_open: bool,
    /// Full input text when open, single-line preview when collapsed.
    pub input_block_text: String,
    pub input_block_collapse_needed: bool,
    pub show_line_numbers: bool,
    pub hide_output: bool,
}

impl CellViewModel {
    /// Fresh view-model: visible, expanded, unselected.
    pub fn new(cell: CellRecord, matcher: &CellMatcher, editable: bool) -> Self {
        let text = extract_input_text(&cell, matcher);
        let collapse_needed = cell.is_code() && core_text::line_count(&text) > 1;
        Self {
            cell,
            editable,
            selected: false,
            focused: false,
            cursor_pos: CursorPos::Current,
            input_block_show: true,
            input_block_open: true,
            input_block_text: text,
            input_block_collapse_needed: collapse_needed,
            show_line_numbers: false,
            hide_output: false,
        }
    }

    /// View-model for a cell arriving from the host, with visibility and
    /// collapse state taken from settings.
    pub fn prepared(cell: CellRecord, settings: &NotebookSettings) -> Self {
        Self::prepared_with(cell, settings, &cell_matcher(settings))
    }

    /// As [`CellViewModel::prepared`], reusing an already compiled matcher.
    pub fn prepared_with(
        cell: CellRecord,
        settings: &NotebookSettings,
        matcher: &CellMatcher,
    ) -> Self {
        let vm = Self::new(cell, matcher, true);
        crate::mutation::alter_input_block(
            &vm,
            matcher,
            settings.show_cell_input_code,
            !settings.collapse_cell_input_code_by_default,
        )
        .unwrap_or(vm)
    }

    /// The trailing edit cell used by the interactive window.
    pub fn edit_cell() -> Self {
        let cell = CellRecord {
            id: CellId::from(EDIT_CELL_ID),
            data: CellData::Code(CodeCell::default()),
            state: CellState::Finished,
            file: None,
            line: Some(0),
        };
        Self::new(cell, &CellMatcher::default(), true)
    }

    pub fn id(&self) -> &CellId {
        &self.cell.id
    }
}

/// Marker matcher honouring the host's pattern overrides.
pub fn cell_matcher(settings: &NotebookSettings) -> CellMatcher {
    CellMatcher::new(
        settings.code_regular_expression.as_deref(),
        settings.markdown_regular_expression.as_deref(),
    )
}

/// Text shown in a cell's input block.
///
/// Code cells drop a leading line that is nothing but a cell marker; markdown
/// cells return their source as-is; message cells have no input text.
pub fn extract_input_text(cell: &CellRecord, matcher: &CellMatcher) -> String {
    match &cell.data {
        CellData::Code(c) => {
            let lines = c.source.lines();
            match lines.first() {
                Some(first) if matcher.is_bare_marker(first) => {
                    core_text::concat_multiline(&lines[1..])
                }
                _ => c.source.text(),
            }
        }
        CellData::Markdown(m) => m.source.text(),
        CellData::Messages(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_code_cell_needs_collapse_when_multiline() {
        let m = CellMatcher::default();
        let vm = CellViewModel::new(CellRecord::code("a", "x = 1\ny = 2"), &m, true);
        assert!(vm.input_block_collapse_needed);
        assert_eq!(vm.input_block_text, "x = 1\ny = 2");
        let single = CellViewModel::new(CellRecord::code("b", "x = 1"), &m, true);
        assert!(!single.input_block_collapse_needed);
    }

    #[test]
    fn markdown_input_text_is_its_source() {
        let m = CellMatcher::default();
        let vm = CellViewModel::new(CellRecord::markdown("m", "# Title\nbody"), &m, true);
        assert_eq!(vm.input_block_text, "# Title\nbody");
        assert!(!vm.input_block_collapse_needed);
        let msg = CellViewModel::new(CellRecord::message("x", vec!["hi".into()]), &m, true);
        assert!(msg.input_block_text.is_empty());
    }

    #[test]
    fn extract_drops_bare_leading_marker() {
        let m = CellMatcher::default();
        let cell = CellRecord::code("a", "# %%\nimport os\n");
        assert_eq!(extract_input_text(&cell, &m), "import os\n");
        let titled = CellRecord::code("b", "# %% setup\nimport os\n");
        assert_eq!(extract_input_text(&titled, &m), "# %% setup\nimport os\n");
    }

    #[test]
    fn prepared_applies_collapse_default() {
        let settings = NotebookSettings::default();
        let vm = CellViewModel::prepared(
            CellRecord::code("a", "def f():\n    return 1\n    # extra"),
            &settings,
        );
        assert!(!vm.input_block_open);
        assert_eq!(vm.input_block_text, "def f():...");

        let expanded = NotebookSettings {
            collapse_cell_input_code_by_default: false,
            ..NotebookSettings::default()
        };
        let vm = CellViewModel::prepared(CellRecord::code("a", "a\nb"), &expanded);
        assert!(vm.input_block_open);
        assert_eq!(vm.input_block_text, "a\nb");
    }

    #[test]
    fn prepared_hides_input_when_configured() {
        let hidden = NotebookSettings {
            show_cell_input_code: false,
            ..NotebookSettings::default()
        };
        let vm = CellViewModel::prepared(CellRecord::code("a", "a\nb"), &hidden);
        assert!(!vm.input_block_show);
    }

    #[test]
    fn edit_cell_is_empty_code() {
        let vm = CellViewModel::edit_cell();
        assert_eq!(vm.id().as_str(), EDIT_CELL_ID);
        assert!(vm.cell.is_code());
        assert!(vm.input_block_text.is_empty());
    }
}
