//! The publish step around the pure dispatch core.
//!
//! `Store` owns the current `Arc<MainState>` and the outbound queue. Each
//! applied envelope is reduced, its messages are queued in emission order, and
//! subscribers hear about the new state only when it changed by identity.

use core_actions::{DispatchError, dispatch_envelope};
use core_events::{InboundMessage, OutboundMessage, OutboundQueue};
use core_state::MainState;
use std::sync::Arc;
use tracing::debug;

/// Receives every published state. Must not block.
pub trait StateSubscriber: Send {
    fn on_state(&mut self, state: &Arc<MainState>);
}

/// Default subscriber: one debug event per published state.
pub struct LogSubscriber;

impl StateSubscriber for LogSubscriber {
    fn on_state(&mut self, state: &Arc<MainState>) {
        debug!(
            target: "runtime.store",
            cells = state.cell_vms.len(),
            selected = state.selected_cell_id.as_ref().map(|id| id.as_str()),
            focused = state.focused_cell_id.as_ref().map(|id| id.as_str()),
            dirty = state.dirty,
            undo_depth = state.history.undo_depth(),
            redo_depth = state.history.redo_depth(),
            "state_published"
        );
    }
}

pub struct Store {
    state: Arc<MainState>,
    subscribers: Vec<Box<dyn StateSubscriber>>,
    outbound: OutboundQueue,
    published: u64,
}

impl Store {
    pub fn new(state: Arc<MainState>) -> Self {
        Self {
            state,
            subscribers: Vec::new(),
            outbound: OutboundQueue::new(),
            published: 0,
        }
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn StateSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn state(&self) -> &Arc<MainState> {
        &self.state
    }

    /// Number of states published so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Reduce one envelope. Returns whether the state changed. On error
    /// neither the state nor the queue is touched.
    pub fn apply(&mut self, msg: &InboundMessage) -> Result<bool, DispatchError> {
        let transition = dispatch_envelope(msg, &self.state)?;
        let changed = transition.changed(&self.state);
        self.outbound.extend(transition.messages);
        if changed {
            self.state = transition.state;
            self.published += 1;
            for sub in &mut self.subscribers {
                sub.on_state(&self.state);
            }
        }
        Ok(changed)
    }

    /// `(queued, drained)` totals of the outbound queue.
    pub fn outbound_totals(&self) -> (u64, u64) {
        (self.outbound.queued_total(), self.outbound.drained_total())
    }

    /// Take every queued outbound message, oldest first.
    pub fn drain_outbound(&mut self) -> Vec<OutboundMessage> {
        self.outbound.drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::CellRecord;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder(Arc<Mutex<Vec<usize>>>);

    impl StateSubscriber for Recorder {
        fn on_state(&mut self, state: &Arc<MainState>) {
            self.0.lock().unwrap().push(state.cell_vms.len());
        }
    }

    fn store() -> (Store, Arc<Mutex<Vec<usize>>>) {
        let state = MainState::default().with_cells([
            CellRecord::code("a", "x"),
            CellRecord::code("b", "y"),
        ]);
        let mut store = Store::new(Arc::new(state));
        let seen = Arc::new(Mutex::new(Vec::new()));
        store.subscribe(Box::new(Recorder(seen.clone())));
        (store, seen)
    }

    #[test]
    fn publishes_only_on_change() {
        let (mut store, seen) = store();
        assert!(!store.apply(&InboundMessage::new("SelectCell", json!({"cellId": "zz"}))).unwrap());
        assert!(store.apply(&InboundMessage::new("DeleteCell", json!({"cellId": "a"}))).unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(store.published(), 1);
    }

    #[test]
    fn message_only_actions_queue_without_publishing() {
        let (mut store, seen) = store();
        let before = Arc::clone(store.state());
        assert!(!store.apply(&InboundMessage::new("Save", json!(null))).unwrap());
        assert!(Arc::ptr_eq(store.state(), &before));
        assert!(seen.lock().unwrap().is_empty());
        let drained = store.drain_outbound();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].kind(), "SaveAll");
        assert!(store.drain_outbound().is_empty());
    }

    #[test]
    fn errors_leave_queue_and_state_alone() {
        let (mut store, _) = store();
        let before = Arc::clone(store.state());
        assert!(store.apply(&InboundMessage::new("Nope", json!(null))).is_err());
        assert!(Arc::ptr_eq(store.state(), &before));
        assert!(store.drain_outbound().is_empty());
    }
}
