//! Outbound transport: one JSON object per line on an async writer.

use anyhow::Result;
use core_events::OutboundMessage;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Line reported when an inbound envelope could not be applied.
#[derive(Debug, Serialize)]
struct ErrorLine<'a> {
    kind: &'static str,
    payload: ErrorPayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
    message: &'a str,
}

pub struct LineWriter<W> {
    inner: W,
    written: u64,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub async fn write_message(&mut self, msg: &OutboundMessage) -> Result<()> {
        let line = serde_json::to_string(msg)?;
        self.write_line(line).await?;
        trace!(target: "runtime.transport", kind = msg.kind(), seq = self.written, "outbound_written");
        Ok(())
    }

    /// `action` is the inbound kind when known (absent for undecodable lines).
    pub async fn write_error(&mut self, action: Option<&str>, message: &str) -> Result<()> {
        let line = serde_json::to_string(&ErrorLine {
            kind: "Error",
            payload: ErrorPayload { action, message },
        })?;
        self.write_line(line).await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await?;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    async fn write_line(&mut self, mut line: String) -> Result<()> {
        line.push('\n');
        self.inner.write_all(line.as_bytes()).await?;
        self.written += 1;
        Ok(())
    }
}
