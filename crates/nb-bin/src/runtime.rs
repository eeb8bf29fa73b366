//! Serial dispatch loop.
//!
//! Every event is fully reduced and its outbound messages written before the
//! next one is received. Decode and dispatch failures become `Error` lines on
//! the same transport; they never stop the loop.

use crate::store::Store;
use crate::transport::LineWriter;
use anyhow::Result;
use core_events::{
    DispatchObserver, Event, INBOUND_RECEIVED, INBOUND_REJECTED, InboundMessage, NoopObserver,
    OUTBOUND_DRAINED, OutboundMessage,
};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// How long to wait for the reader task after the loop stops. A reader still
/// blocked on the host pipe is left behind.
const READER_JOIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Logs each protocol step on `runtime.events`. Only kinds and error text are
/// recorded, never payloads.
pub struct TraceObserver;

impl DispatchObserver for TraceObserver {
    fn on_inbound(&self, msg: &InboundMessage) {
        trace!(target: "runtime.events", kind = %msg.kind, "inbound");
    }
    fn on_applied(&self, msg: &InboundMessage, changed: bool) {
        debug!(target: "runtime.events", kind = %msg.kind, changed, "applied");
    }
    fn on_rejected(&self, kind: Option<&str>, error: &str) {
        warn!(target: "runtime.events", kind, error, "rejected");
    }
    fn on_outbound(&self, msg: &OutboundMessage) {
        trace!(target: "runtime.events", kind = msg.kind(), "outbound");
    }
}

/// Why [`NotebookRuntime::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// The reader reached end of input and said so.
    EndOfInput,
    /// Every sender went away without a shutdown event.
    ChannelClosed,
}

impl StopCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopCause::EndOfInput => "end_of_input",
            StopCause::ChannelClosed => "channel_closed",
        }
    }
}

pub struct NotebookRuntime<W> {
    store: Store,
    rx: mpsc::Receiver<Event>,
    writer: LineWriter<W>,
    observer: Box<dyn DispatchObserver>,
    reader: Option<JoinHandle<()>>,
    applied: u64,
    rejected: u64,
}

impl<W: AsyncWrite + Unpin> NotebookRuntime<W> {
    pub fn new(store: Store, rx: mpsc::Receiver<Event>, writer: W) -> Self {
        Self {
            store,
            rx,
            writer: LineWriter::new(writer),
            observer: Box::new(NoopObserver),
            reader: None,
            applied: 0,
            rejected: 0,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Task feeding the channel; joined (briefly) once the loop stops.
    pub fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Consume events until end of input or channel close. Only transport
    /// write failures end the loop with an error.
    pub async fn run(&mut self) -> Result<StopCause> {
        let cause = loop {
            match self.rx.recv().await {
                Some(Event::Inbound(msg)) => self.apply(&msg).await?,
                Some(Event::Malformed { line, error }) => {
                    trace!(target: "runtime", len = line.len(), "malformed_line_reported");
                    self.reject(None, &error).await?;
                }
                Some(Event::Shutdown) => break StopCause::EndOfInput,
                None => break StopCause::ChannelClosed,
            }
            self.writer.flush().await?;
        };
        self.rx.close();
        self.join_reader(cause).await;
        self.log_summary(cause);
        Ok(cause)
    }

    async fn apply(&mut self, msg: &InboundMessage) -> Result<()> {
        self.observer.on_inbound(msg);
        match self.store.apply(msg) {
            Ok(changed) => {
                self.applied += 1;
                self.observer.on_applied(msg, changed);
            }
            Err(err) => {
                INBOUND_REJECTED.fetch_add(1, Ordering::Relaxed);
                self.reject(Some(&msg.kind), &err.to_string()).await?;
            }
        }
        for out in self.store.drain_outbound() {
            self.writer.write_message(&out).await?;
            self.observer.on_outbound(&out);
        }
        Ok(())
    }

    async fn reject(&mut self, kind: Option<&str>, error: &str) -> Result<()> {
        self.rejected += 1;
        self.observer.on_rejected(kind, error);
        self.writer.write_error(kind, error).await
    }

    async fn join_reader(&mut self, cause: StopCause) {
        let Some(handle) = self.reader.take() else {
            return;
        };
        match tokio::time::timeout(READER_JOIN_TIMEOUT, handle).await {
            Ok(Ok(())) => trace!(target: "runtime", cause = cause.as_str(), "reader_joined"),
            Ok(Err(err)) => {
                error!(target: "runtime", cause = cause.as_str(), ?err, "reader_task_failed")
            }
            Err(_) => debug!(target: "runtime", cause = cause.as_str(), "reader_left_blocked"),
        }
    }

    fn log_summary(&self, cause: StopCause) {
        let (queued, drained) = self.store.outbound_totals();
        info!(
            target: "runtime",
            cause = cause.as_str(),
            applied = self.applied,
            rejected = self.rejected,
            published = self.store.published(),
            queued,
            drained,
            lines_written = self.writer.written(),
            inbound_total = INBOUND_RECEIVED.load(Ordering::Relaxed),
            drained_total = OUTBOUND_DRAINED.load(Ordering::Relaxed),
            "session_summary"
        );
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}
