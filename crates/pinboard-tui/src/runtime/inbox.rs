//! Inbox channel for async event collection.
//!
//! Every async source (effect handlers, the change-feed watcher) pushes its
//! `UiEvent`s into one shared channel; the event loop drains it once per
//! frame. One inbox for everything means the runtime never tracks
//! per-operation receivers.

use tokio::sync::mpsc;

use crate::events::UiEvent;

/// Sending half of the inbox, handed to spawned handlers.
pub type UiEventSender = mpsc::UnboundedSender<UiEvent>;

/// Runtime-owned inbox.
#[derive(Debug)]
pub struct Inbox {
    tx: UiEventSender,
    rx: mpsc::UnboundedReceiver<UiEvent>,
}

impl Inbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Returns a sender for a handler or watcher task.
    pub fn sender(&self) -> UiEventSender {
        self.tx.clone()
    }

    /// Moves every queued event into `out` without blocking.
    pub fn drain_into(&mut self, out: &mut Vec<UiEvent>) {
        while let Ok(event) = self.rx.try_recv() {
            out.push(event);
        }
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}
