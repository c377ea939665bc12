//! Process-wide hub for exchange-rate refresh notifications.
//!
//! Rate sources call [`RatesHub::notify`] after new rates are stored.
//! Listeners are held weakly: the hub never keeps a listener alive, and a
//! listener that was dropped without detaching is pruned on the next notify.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

/// Receives a callback whenever exchange rates were refreshed.
pub trait RatesListener: Send + Sync {
    fn on_changed(&self);
}

/// Handle returned by [`RatesHub::attach`], used to detach again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fan-out point for rate refresh notifications.
pub struct RatesHub {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Weak<dyn RatesListener>)>>,
}

impl RatesHub {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Registers a listener and returns the id to detach it with.
    pub fn attach(&self, listener: Weak<dyn RatesListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        debug!(listener = id.0, "rates listener attached");
        id
    }

    /// Removes a listener. Returns `false` if it was not attached.
    pub fn detach(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(attached, _)| *attached != id);
        let removed = listeners.len() != before;
        if removed {
            debug!(listener = id.0, "rates listener detached");
        }
        removed
    }

    /// Number of attached listeners that are still alive.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|(_, listener)| listener.strong_count() > 0)
            .count()
    }

    /// Calls [`RatesListener::on_changed`] on every live listener.
    ///
    /// Callbacks run after the listener list is unlocked, so a listener may
    /// attach or detach from inside its callback.
    pub fn notify(&self) {
        let live: Vec<Arc<dyn RatesListener>> = {
            let mut listeners = self.listeners.lock();
            listeners.retain(|(_, listener)| listener.strong_count() > 0);
            listeners
                .iter()
                .filter_map(|(_, listener)| listener.upgrade())
                .collect()
        };

        debug!(listeners = live.len(), "rates changed");
        for listener in live {
            listener.on_changed();
        }
    }
}

impl Default for RatesHub {
    fn default() -> Self {
        Self::new()
    }
}
