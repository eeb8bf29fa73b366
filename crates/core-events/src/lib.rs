//! Event plumbing for the notebook core: inbound envelopes, outbound protocol
//! messages, and the channel that serializes host input into a single
//! dispatch order.

use std::sync::atomic::AtomicU64;

mod inbound;
mod lines;
pub mod outbound;

pub use inbound::InboundMessage;
pub use lines::{LineEventSource, decode_line};
pub use outbound::{OutboundMessage, OutboundQueue};

/// Capacity of the channel between the line reader and the dispatch loop.
///
/// The loop applies one event at a time, so whichever envelope arrives first
/// is fully reduced (outbound messages included) before the next is read. A
/// full channel makes the reader wait, which pushes back on the host pipe
/// instead of dropping envelopes.
pub const EVENT_CHANNEL_CAP: usize = 1024;

// Process-wide counters, reported in the runtime summary on exit.
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static INBOUND_RECEIVED: AtomicU64 = AtomicU64::new(0);
pub static INBOUND_REJECTED: AtomicU64 = AtomicU64::new(0); // undecodable lines / unknown kinds
pub static OUTBOUND_QUEUED: AtomicU64 = AtomicU64::new(0);
pub static OUTBOUND_DRAINED: AtomicU64 = AtomicU64::new(0);

/// Top-level event consumed by the serial dispatch loop.
#[derive(Debug, Clone)]
pub enum Event {
    /// A tagged action envelope from the host.
    Inbound(InboundMessage),
    /// The reader saw a line it could not decode into an envelope.
    Malformed { line: String, error: String },
    /// End of input; nothing follows.
    Shutdown,
}

impl Event {
    /// Action kind for envelopes, a bracketed marker otherwise.
    pub fn label(&self) -> &str {
        match self {
            Event::Inbound(msg) => msg.kind.as_str(),
            Event::Malformed { .. } => "<malformed>",
            Event::Shutdown => "<shutdown>",
        }
    }
}

/// Observes the dispatch loop at its protocol boundaries.
///
/// Called on the loop task between reduction steps; implementations must not
/// block. Every method defaults to doing nothing.
pub trait DispatchObserver: Send + Sync + 'static {
    /// An envelope is about to be reduced.
    fn on_inbound(&self, _msg: &InboundMessage) {}
    /// An envelope was reduced; `changed` is true when a new state was published.
    fn on_applied(&self, _msg: &InboundMessage, _changed: bool) {}
    /// A line or envelope was refused. `kind` is `None` for lines that never
    /// decoded into an envelope.
    fn on_rejected(&self, _kind: Option<&str>, _error: &str) {}
    /// An outbound message was written to the transport.
    fn on_outbound(&self, _msg: &OutboundMessage) {}
}

pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn labels_name_the_action_kind() {
        let ev = Event::Inbound(InboundMessage::new("ExecuteAbove", json!({"cellId": "a"})));
        assert_eq!(ev.label(), "ExecuteAbove");
        let bad = Event::Malformed {
            line: "{".into(),
            error: "EOF".into(),
        };
        assert_eq!(bad.label(), "<malformed>");
        assert_eq!(Event::Shutdown.label(), "<shutdown>");
    }
}
