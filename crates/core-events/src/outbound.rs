//! Outbound protocol messages and the append-only queue that carries them to
//! the transport.
//!
//! Messages are produced by reducers and never consumed by the core. Within
//! one transition they keep emission order; the queue preserves that order
//! across transitions (FIFO). Wire shape: `{"kind": <name>, "payload": ...}`
//! with camelCase payload fields.

use core_model::{CellId, CellRecord, TextChange};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    ReExecuteCell {
        code: String,
        id: CellId,
    },
    InsertCell {
        cell: CellRecord,
        index: usize,
        code: String,
        code_cell_above_id: Option<CellId>,
    },
    RemoveCell {
        id: CellId,
    },
    DeleteCell,
    DeleteAllCells,
    Undo,
    Redo,
    Export(Vec<CellRecord>),
    SaveAll {
        cells: Vec<CellRecord>,
    },
    ShowDataViewer {
        variable_name: String,
        column_size: usize,
    },
    NativeCommand {
        command: String,
        source: String,
    },
    ShowPlot(String),
    OpenLink(String),
    ReturnAllCells(Vec<CellRecord>),
    GotoCodeCell {
        file: Option<String>,
        line: Option<u32>,
    },
    CopyCodeCell {
        source: String,
    },
    GatherCodeRequest(CellRecord),
    EditCell {
        changes: Vec<TextChange>,
        id: CellId,
    },
    GetCssRequest {
        is_dark: bool,
    },
    GetMonacoThemeRequest {
        is_dark: bool,
    },
}

impl OutboundMessage {
    /// Protocol name of this message (matches the serialized `kind`).
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::ReExecuteCell { .. } => "ReExecuteCell",
            OutboundMessage::InsertCell { .. } => "InsertCell",
            OutboundMessage::RemoveCell { .. } => "RemoveCell",
            OutboundMessage::DeleteCell => "DeleteCell",
            OutboundMessage::DeleteAllCells => "DeleteAllCells",
            OutboundMessage::Undo => "Undo",
            OutboundMessage::Redo => "Redo",
            OutboundMessage::Export(_) => "Export",
            OutboundMessage::SaveAll { .. } => "SaveAll",
            OutboundMessage::ShowDataViewer { .. } => "ShowDataViewer",
            OutboundMessage::NativeCommand { .. } => "NativeCommand",
            OutboundMessage::ShowPlot(_) => "ShowPlot",
            OutboundMessage::OpenLink(_) => "OpenLink",
            OutboundMessage::ReturnAllCells(_) => "ReturnAllCells",
            OutboundMessage::GotoCodeCell { .. } => "GotoCodeCell",
            OutboundMessage::CopyCodeCell { .. } => "CopyCodeCell",
            OutboundMessage::GatherCodeRequest(_) => "GatherCodeRequest",
            OutboundMessage::EditCell { .. } => "EditCell",
            OutboundMessage::GetCssRequest { .. } => "GetCssRequest",
            OutboundMessage::GetMonacoThemeRequest { .. } => "GetMonacoThemeRequest",
        }
    }
}

/// Append-only FIFO of outbound messages, drained by a transport the core
/// does not own.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    messages: VecDeque<OutboundMessage>,
    queued: u64,
    drained: u64,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: OutboundMessage) {
        trace!(target: "events.outbound", kind = msg.kind(), depth = self.messages.len() + 1, "queued");
        crate::OUTBOUND_QUEUED.fetch_add(1, Ordering::Relaxed);
        self.queued += 1;
        self.messages.push_back(msg);
    }

    /// Append a transition's messages, preserving their order.
    pub fn extend<I: IntoIterator<Item = OutboundMessage>>(&mut self, msgs: I) {
        for msg in msgs {
            self.push(msg);
        }
    }

    /// Remove and return every queued message, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = OutboundMessage> + '_ {
        let n = self.messages.len() as u64;
        crate::OUTBOUND_DRAINED.fetch_add(n, Ordering::Relaxed);
        self.drained += n;
        self.messages.drain(..)
    }

    /// Messages ever pushed onto this queue.
    pub fn queued_total(&self) -> u64 {
        self.queued
    }

    /// Messages ever handed out by [`OutboundQueue::drain`].
    pub fn drained_total(&self) -> u64 {
        self.drained
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutboundMessage> {
        self.messages.iter()
    }
}
