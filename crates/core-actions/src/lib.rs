//! Notebook actions and the reducer dispatch core.
//!
//! An `Action` is a closed tagged union: one variant per entry point, each
//! carrying its own payload shape. Inbound envelopes (`{"type", "payload"}`)
//! are decoded with [`Action::decode`], which rejects unknown kinds before
//! any payload is inspected. [`dispatcher::dispatch`] then maps
//! `(action, previous state)` to `(next state, outbound messages)`.

use core_events::InboundMessage;
use core_model::{CellId, CellRecord, CursorPos, TextChange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod dispatcher;

pub use dispatcher::{Transition, dispatch, dispatch_envelope};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The producer speaks a protocol version this core does not know.
    #[error("unknown action kind `{0}`")]
    UnknownActionKind(String),
    #[error("malformed payload for `{kind}`: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings payload could not be decoded: {0}")]
    Settings(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum Action {
    // --- selection / focus -------------------------------------------------------------------
    FocusCell {
        cell_id: CellId,
        #[serde(default)]
        cursor_pos: CursorPos,
    },
    UnfocusCell {
        cell_id: CellId,
        code: String,
    },
    SelectCell {
        cell_id: CellId,
        #[serde(default)]
        cursor_pos: CursorPos,
    },
    SelectNextCell {
        cell_id: CellId,
    },
    ToggleLineNumbers {
        cell_id: CellId,
    },
    ToggleOutput {
        cell_id: CellId,
    },
    ToggleInputBlock {
        cell_id: CellId,
    },
    ExpandAll,
    CollapseAll,
    // --- execution ---------------------------------------------------------------------------
    ExecuteCell {
        cell_id: CellId,
        code: String,
    },
    ExecuteAbove {
        cell_id: CellId,
    },
    ExecuteCellAndBelow {
        cell_id: CellId,
        code: String,
    },
    ExecuteAllCells,
    ExecuteSelectedCell,
    ClearAllOutputs,
    ChangeCellType {
        cell_id: CellId,
        current_code: String,
    },
    // --- history -----------------------------------------------------------------------------
    Undo,
    Redo,
    // --- structure ---------------------------------------------------------------------------
    InsertAbove {
        cell_id: CellId,
        new_cell_id: CellId,
    },
    InsertBelow {
        cell_id: CellId,
        new_cell_id: CellId,
    },
    InsertAboveFirst {
        new_cell_id: CellId,
    },
    DeleteCell {
        cell_id: CellId,
    },
    DeleteAllCells,
    StartCell(CellRecord),
    UpdateCell(CellRecord),
    FinishCell(CellRecord),
    NotebookDirty,
    NotebookClean,
    /// JSON settings document as sent by the host.
    UpdateSettings(String),
    // --- transfer (message only) -------------------------------------------------------------
    Export,
    Save,
    ShowDataViewer {
        variable_name: String,
        #[serde(default)]
        column_size: usize,
    },
    SendCommand {
        command: String,
        command_type: String,
    },
    ShowPlot {
        image_html: String,
    },
    OpenLink {
        uri: String,
    },
    GetAllCells,
    GotoCell {
        cell_id: CellId,
    },
    CopyCellCode {
        cell_id: CellId,
    },
    Gather {
        cell_id: CellId,
    },
    EditCell {
        cell_id: CellId,
        changes: Vec<TextChange>,
    },
}

impl Action {
    /// Every action kind this core understands.
    pub const KINDS: &'static [&'static str] = &[
        "FocusCell",
        "UnfocusCell",
        "SelectCell",
        "SelectNextCell",
        "ToggleLineNumbers",
        "ToggleOutput",
        "ToggleInputBlock",
        "ExpandAll",
        "CollapseAll",
        "ExecuteCell",
        "ExecuteAbove",
        "ExecuteCellAndBelow",
        "ExecuteAllCells",
        "ExecuteSelectedCell",
        "ClearAllOutputs",
        "ChangeCellType",
        "Undo",
        "Redo",
        "InsertAbove",
        "InsertBelow",
        "InsertAboveFirst",
        "DeleteCell",
        "DeleteAllCells",
        "StartCell",
        "UpdateCell",
        "FinishCell",
        "NotebookDirty",
        "NotebookClean",
        "UpdateSettings",
        "Export",
        "Save",
        "ShowDataViewer",
        "SendCommand",
        "ShowPlot",
        "OpenLink",
        "GetAllCells",
        "GotoCell",
        "CopyCellCode",
        "Gather",
        "EditCell",
    ];

    /// Kinds whose variant carries no payload. Hosts may send these with a
    /// `null`, missing or empty-object payload.
    pub const UNIT_KINDS: &'static [&'static str] = &[
        "ExpandAll",
        "CollapseAll",
        "ExecuteAllCells",
        "ExecuteSelectedCell",
        "ClearAllOutputs",
        "Undo",
        "Redo",
        "DeleteAllCells",
        "NotebookDirty",
        "NotebookClean",
        "Export",
        "Save",
        "GetAllCells",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            Action::FocusCell { .. } => "FocusCell",
            Action::UnfocusCell { .. } => "UnfocusCell",
            Action::SelectCell { .. } => "SelectCell",
            Action::SelectNextCell { .. } => "SelectNextCell",
            Action::ToggleLineNumbers { .. } => "ToggleLineNumbers",
            Action::ToggleOutput { .. } => "ToggleOutput",
            Action::ToggleInputBlock { .. } => "ToggleInputBlock",
            Action::ExpandAll => "ExpandAll",
            Action::CollapseAll => "CollapseAll",
            Action::ExecuteCell { .. } => "ExecuteCell",
            Action::ExecuteAbove { .. } => "ExecuteAbove",
            Action::ExecuteCellAndBelow { .. } => "ExecuteCellAndBelow",
            Action::ExecuteAllCells => "ExecuteAllCells",
            Action::ExecuteSelectedCell => "ExecuteSelectedCell",
            Action::ClearAllOutputs => "ClearAllOutputs",
            Action::ChangeCellType { .. } => "ChangeCellType",
            Action::Undo => "Undo",
            Action::Redo => "Redo",
            Action::InsertAbove { .. } => "InsertAbove",
            Action::InsertBelow { .. } => "InsertBelow",
            Action::InsertAboveFirst { .. } => "InsertAboveFirst",
            Action::DeleteCell { .. } => "DeleteCell",
            Action::DeleteAllCells => "DeleteAllCells",
            Action::StartCell(_) => "StartCell",
            Action::UpdateCell(_) => "UpdateCell",
            Action::FinishCell(_) => "FinishCell",
            Action::NotebookDirty => "NotebookDirty",
            Action::NotebookClean => "NotebookClean",
            Action::UpdateSettings(_) => "UpdateSettings",
            Action::Export => "Export",
            Action::Save => "Save",
            Action::ShowDataViewer { .. } => "ShowDataViewer",
            Action::SendCommand { .. } => "SendCommand",
            Action::ShowPlot { .. } => "ShowPlot",
            Action::OpenLink { .. } => "OpenLink",
            Action::GetAllCells => "GetAllCells",
            Action::GotoCell { .. } => "GotoCell",
            Action::CopyCellCode { .. } => "CopyCellCode",
            Action::Gather { .. } => "Gather",
            Action::EditCell { .. } => "EditCell",
        }
    }

    /// Decode an inbound envelope into a typed action.
    ///
    /// Unknown kinds fail with [`DispatchError::UnknownActionKind`] before the
    /// payload is looked at; a known kind with an undecodable payload fails
    /// with [`DispatchError::MalformedPayload`].
    pub fn decode(msg: &InboundMessage) -> Result<Action, DispatchError> {
        if !Self::KINDS.contains(&msg.kind.as_str()) {
            return Err(DispatchError::UnknownActionKind(msg.kind.clone()));
        }
        let mut envelope = serde_json::Map::new();
        envelope.insert("type".into(), serde_json::Value::String(msg.kind.clone()));
        let empty_unit = Self::UNIT_KINDS.contains(&msg.kind.as_str())
            && msg.payload.as_object().is_some_and(|o| o.is_empty());
        if !msg.payload.is_null() && !empty_unit {
            envelope.insert("payload".into(), msg.payload.clone());
        }
        serde_json::from_value(serde_json::Value::Object(envelope)).map_err(|source| {
            DispatchError::MalformedPayload {
                kind: msg.kind.clone(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds_table_matches_serialized_tags() {
        let samples = [
            Action::Undo,
            Action::ExecuteAllCells,
            Action::SelectCell {
                cell_id: "a".into(),
                cursor_pos: CursorPos::Top,
            },
            Action::UpdateSettings("{}".into()),
            Action::StartCell(CellRecord::code("a", "x")),
        ];
        for action in samples {
            let v = serde_json::to_value(&action).unwrap();
            assert_eq!(v["type"], action.kind());
            assert!(Action::KINDS.contains(&action.kind()));
        }
    }

    #[test]
    fn decode_struct_payload_with_defaults() {
        let msg = InboundMessage::new("FocusCell", json!({"cellId": "c1"}));
        let action = Action::decode(&msg).unwrap();
        assert_eq!(
            action,
            Action::FocusCell {
                cell_id: "c1".into(),
                cursor_pos: CursorPos::Current
            }
        );
    }

    #[test]
    fn decode_unit_variant_without_payload() {
        let msg = InboundMessage::new("Redo", json!(null));
        assert_eq!(Action::decode(&msg).unwrap(), Action::Redo);
    }

    #[test]
    fn unit_kinds_accept_empty_object_payload() {
        for kind in Action::UNIT_KINDS {
            let msg = InboundMessage::new(*kind, json!({}));
            let action = Action::decode(&msg).unwrap();
            assert_eq!(action.kind(), *kind);
        }
        let msg = InboundMessage::new("Undo", json!({"extra": 1}));
        assert!(matches!(
            Action::decode(&msg),
            Err(DispatchError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn unknown_kind_rejected() {
        let msg = InboundMessage::new("ReticulateSplines", json!({}));
        match Action::decode(&msg) {
            Err(DispatchError::UnknownActionKind(k)) => assert_eq!(k, "ReticulateSplines"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn malformed_payload_rejected() {
        let msg = InboundMessage::new("ExecuteCell", json!({"cellId": 5}));
        assert!(matches!(
            Action::decode(&msg),
            Err(DispatchError::MalformedPayload { .. })
        ));
    }
}
