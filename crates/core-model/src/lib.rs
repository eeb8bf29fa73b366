//! Notebook cell model: durable cell records and their per-cell view-models.
//!
//! A `CellViewModel` wraps a `CellRecord` with transient presentation state
//! (selection, focus, collapse, toggles). View-models are immutable once
//! published: every edit produces a new value and callers share them through
//! `Arc` so snapshots taken for undo stay valid.
//!
//! Invariant carried by every view-model: `focused` implies `selected`.

use serde::{Deserialize, Serialize};
use std::fmt;

mod cell;
pub mod mutation;
mod view_model;

pub use cell::{
    CellData, CellKind, CellRecord, CellState, CodeCell, MarkdownCell, MessageCell, Source,
    TextChange, TextRange,
};
pub use view_model::{CellViewModel, EDIT_CELL_ID, cell_matcher, extract_input_text};

/// Stable cell identity (survives edits, moves and type changes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub String);

impl CellId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for CellId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Where the editor cursor lands when a cell gains focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorPos {
    Top,
    Bottom,
    #[default]
    Current,
}
