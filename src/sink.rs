//! Output sink: the ordered, single-consumer channel events leave through.
//!
//! The sink can be closed. Once [`OutputSink::close`] has returned, no
//! further event is delivered, even if a task that was already running
//! tries to send one.

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::Event;

/// Receiving half handed to the state reducer.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Sending half used by the effect handler.
pub struct OutputSink {
    tx: mpsc::UnboundedSender<Event>,
    closed: RwLock<bool>,
}

/// Creates a connected sink and receiver.
#[must_use]
pub fn channel() -> (OutputSink, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = OutputSink {
        tx,
        closed: RwLock::new(false),
    };
    (sink, rx)
}

impl OutputSink {
    /// Delivers an event. Returns `false` if the sink is closed or the
    /// receiver is gone.
    pub fn accept(&self, event: Event) -> bool {
        // Held across the send so `close` waits for in-flight deliveries.
        let closed = self.closed.read();
        if *closed {
            debug!(?event, "sink closed, dropping event");
            return false;
        }
        self.tx.send(event).is_ok()
    }

    /// Stops all further deliveries.
    pub fn close(&self) {
        *self.closed.write() = true;
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read() || self.tx.is_closed()
    }
}
