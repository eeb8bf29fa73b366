//! Durable cell records as exchanged with the host.
//!
//! Cell content is a closed union (`CellData`): code, markdown or message.
//! Every site that needs a code-shaped cell matches on it explicitly; message
//! cells carry no source and never change type.

use crate::CellId;
use serde::{Deserialize, Deserializer, Serialize};

/// Cell source as an ordered list of lines.
///
/// Lines keep their `\n` terminator (all but possibly the last). On the wire a
/// source may arrive either as one string or as a list of lines; it is always
/// sent back as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Source(Vec<String>);

impl Source {
    pub fn from_text(text: &str) -> Self {
        Self(core_text::split_multiline(text))
    }

    pub fn text(&self) -> String {
        core_text::concat_multiline(&self.0)
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|l| l.is_empty())
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Lines(Vec<String>),
        }
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(t) => Source::from_text(&t),
            Wire::Lines(lines) => Source(lines),
        })
    }
}

/// Execution lifecycle of a cell as reported by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    #[default]
    Pending,
    Executing,
    Finished,
    Error,
}

/// Discriminant of [`CellData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Code,
    Markdown,
    Message,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCell {
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub outputs: Vec<serde_json::Value>,
    #[serde(default)]
    pub execution_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownCell {
    #[serde(default)]
    pub source: Source,
}

/// Informational cell produced by the host (e.g. kernel restart notices).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCell {
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum CellData {
    Code(CodeCell),
    Markdown(MarkdownCell),
    Messages(MessageCell),
}

impl CellData {
    pub fn kind(&self) -> CellKind {
        match self {
            CellData::Code(_) => CellKind::Code,
            CellData::Markdown(_) => CellKind::Markdown,
            CellData::Messages(_) => CellKind::Message,
        }
    }

    pub fn source(&self) -> Option<&Source> {
        match self {
            CellData::Code(c) => Some(&c.source),
            CellData::Markdown(m) => Some(&m.source),
            CellData::Messages(_) => None,
        }
    }
}

/// One notebook cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub id: CellId,
    pub data: CellData,
    #[serde(default)]
    pub state: CellState,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
}

impl CellRecord {
    pub fn code(id: impl Into<CellId>, source: &str) -> Self {
        Self {
            id: id.into(),
            data: CellData::Code(CodeCell {
                source: Source::from_text(source),
                ..CodeCell::default()
            }),
            state: CellState::Finished,
            file: None,
            line: None,
        }
    }

    pub fn markdown(id: impl Into<CellId>, source: &str) -> Self {
        Self {
            id: id.into(),
            data: CellData::Markdown(MarkdownCell {
                source: Source::from_text(source),
            }),
            state: CellState::Finished,
            file: None,
            line: None,
        }
    }

    pub fn message(id: impl Into<CellId>, messages: Vec<String>) -> Self {
        Self {
            id: id.into(),
            data: CellData::Messages(MessageCell { messages }),
            state: CellState::Finished,
            file: None,
            line: None,
        }
    }

    pub fn kind(&self) -> CellKind {
        self.data.kind()
    }

    pub fn is_code(&self) -> bool {
        matches!(self.data, CellData::Code(_))
    }

    /// Joined source text; message cells have none.
    pub fn source_text(&self) -> Option<String> {
        self.data.source().map(Source::text)
    }

    /// Copy with the source replaced. Message cells are returned unchanged.
    pub fn with_source(&self, text: &str) -> Self {
        let mut next = self.clone();
        match &mut next.data {
            CellData::Code(c) => c.source = Source::from_text(text),
            CellData::Markdown(m) => m.source = Source::from_text(text),
            CellData::Messages(_) => {}
        }
        next
    }

    /// Copy staged for re-execution: code cells take the new source, drop
    /// outputs and enter `Executing`; markdown cells only take the source.
    pub fn staged_for_execution(&self, text: &str) -> Self {
        let mut next = self.with_source(text);
        if let CellData::Code(c) = &mut next.data {
            c.outputs.clear();
            next.state = CellState::Executing;
        }
        next
    }

    /// Copy with outputs and execution count cleared (code cells only).
    pub fn with_cleared_outputs(&self) -> Self {
        let mut next = self.clone();
        if let CellData::Code(c) = &mut next.data {
            c.outputs.clear();
            c.execution_count = None;
        }
        next
    }

    /// Toggle code <-> markdown, installing `text` as the new source.
    /// Returns `None` for message cells, which never change type.
    pub fn toggled_type(&self, text: &str) -> Option<Self> {
        let source = Source::from_text(text);
        let data = match &self.data {
            CellData::Code(_) => CellData::Markdown(MarkdownCell { source }),
            CellData::Markdown(_) => CellData::Code(CodeCell {
                source,
                ..CodeCell::default()
            }),
            CellData::Messages(_) => return None,
        };
        Some(Self {
            data,
            ..self.clone()
        })
    }

    pub fn execution_count(&self) -> Option<u32> {
        match &self.data {
            CellData::Code(c) => c.execution_count,
            _ => None,
        }
    }
}

/// A single edit forwarded from the embedded editor widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    pub range: TextRange,
    #[serde(default)]
    pub range_offset: usize,
    #[serde(default)]
    pub range_length: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line_number: u32,
    pub start_column: u32,
    pub end_line_number: u32,
    pub end_column: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn source_accepts_string_or_lines() {
        let a: Source = serde_json::from_str(r#""x = 1\ny = 2""#).unwrap();
        let b: Source = serde_json::from_str(r#"["x = 1\n", "y = 2"]"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.text(), "x = 1\ny = 2");
    }

    #[test]
    fn cell_record_wire_shape() {
        let json = r#"{
            "id": "c1",
            "data": { "cell_type": "code", "source": "print(1)", "outputs": [], "execution_count": 3 },
            "state": "finished",
            "file": "nb.py",
            "line": 4
        }"#;
        let cell: CellRecord = serde_json::from_str(json).unwrap();
        assert_eq!(cell.kind(), CellKind::Code);
        assert_eq!(cell.execution_count(), Some(3));
        assert_eq!(cell.line, Some(4));
        let back = serde_json::to_value(&cell).unwrap();
        assert_eq!(back["data"]["cell_type"], "code");
        assert_eq!(back["data"]["source"], serde_json::json!(["print(1)"]));
    }

    #[test]
    fn staged_execution_clears_code_outputs_only() {
        let mut code = CellRecord::code("a", "old");
        if let CellData::Code(c) = &mut code.data {
            c.outputs.push(serde_json::json!({"output_type": "stream"}));
        }
        let staged = code.staged_for_execution("new");
        assert_eq!(staged.state, CellState::Executing);
        assert_eq!(staged.source_text().as_deref(), Some("new"));
        match &staged.data {
            CellData::Code(c) => assert!(c.outputs.is_empty()),
            other => panic!("unexpected: {other:?}"),
        }

        let md = CellRecord::markdown("b", "# title");
        let staged = md.staged_for_execution("# other");
        assert_eq!(staged.state, CellState::Finished);
        assert_eq!(staged.source_text().as_deref(), Some("# other"));
    }

    #[test]
    fn message_cells_resist_type_and_source_changes() {
        let msg = CellRecord::message("m", vec!["restarted".into()]);
        assert!(msg.toggled_type("x").is_none());
        assert_eq!(msg.with_source("x"), msg);
        assert_eq!(msg.source_text(), None);
    }

    #[test]
    fn toggle_round_trip_drops_outputs() {
        let code = CellRecord::code("a", "x");
        let md = code.toggled_type("# x").unwrap();
        assert_eq!(md.kind(), CellKind::Markdown);
        let back = md.toggled_type("y").unwrap();
        assert_eq!(back.kind(), CellKind::Code);
        assert_eq!(back.execution_count(), None);
        assert_eq!(back.id, code.id);
    }
}
