//! Newline-delimited JSON envelope source.
//!
//! Reads one envelope per line from any async reader (stdin in the binary)
//! and forwards it as an [`Event`]. Blank lines are skipped; undecodable lines
//! become [`Event::Malformed`] so the loop can report them without stopping.
//! End of input sends [`Event::Shutdown`].

use crate::{CHANNEL_SEND_FAILURES, Event, INBOUND_RECEIVED, INBOUND_REJECTED, InboundMessage};
use std::sync::atomic::Ordering;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct LineEventSource<R> {
    name: &'static str,
    reader: R,
}

impl LineEventSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new("stdin", BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineEventSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(name: &'static str, reader: R) -> Self {
        Self { name, reader }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Move the reader onto its own task. The task ends after sending
    /// `Shutdown` at end of input, or as soon as the loop drops its receiver.
    pub fn spawn(self, tx: Sender<Event>) -> JoinHandle<()> {
        let name = self.name;
        let mut lines = self.reader.lines();
        tokio::spawn(async move {
            let mut forwarded = 0u64;
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!(target: "runtime.events", source = name, forwarded, "end_of_input");
                        // The loop may already be gone; nothing left to do either way.
                        let _ = tx.send(Event::Shutdown).await;
                        break;
                    }
                    Err(e) => {
                        warn!(target: "runtime.events", source = name, forwarded, error = %e, "read_failed");
                        let _ = tx.send(Event::Shutdown).await;
                        break;
                    }
                };
                let Some(event) = decode_line(&line) else {
                    continue;
                };
                if tx.send(event).await.is_err() {
                    CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                    debug!(target: "runtime.events", source = name, forwarded, "loop_gone");
                    break;
                }
                forwarded += 1;
            }
        })
    }
}

/// Map one raw line to an event. `None` for blank lines.
pub fn decode_line(line: &str) -> Option<Event> {
    if line.trim().is_empty() {
        return None;
    }
    Some(match InboundMessage::parse_line(line) {
        Ok(msg) => {
            INBOUND_RECEIVED.fetch_add(1, Ordering::Relaxed);
            Event::Inbound(msg)
        }
        Err(e) => {
            INBOUND_REJECTED.fetch_add(1, Ordering::Relaxed);
            warn!(target: "runtime.events", len = line.len(), error = %e, "inbound_line_undecodable");
            Event::Malformed {
                line: line.to_owned(),
                error: e.to_string(),
            }
        }
    })
}
