//! Task ownership for the effect handler.
//!
//! [`TaskRegistry`] tracks every task a handler starts so `dispose` can
//! abort them together. [`KeyedTasks`] runs one task per key of a changing
//! key set and aborts its tasks when dropped.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::models::CurrencyCode;

/// Spawns tasks on a runtime and aborts all of them on shutdown.
pub(crate) struct TaskRegistry {
    runtime: Handle,
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    handles: Vec<JoinHandle<()>>,
    closed: bool,
}

impl TaskRegistry {
    pub(crate) fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            inner: Mutex::new(RegistryInner {
                handles: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Spawns `fut` and keeps its handle. Finished handles are pruned on
    /// every spawn. Returns `false` without spawning after shutdown.
    pub(crate) fn spawn<F>(&self, fut: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        inner.handles.retain(|h| !h.is_finished());
        inner.handles.push(self.runtime.spawn(fut));
        true
    }

    /// Number of tasks that have not finished yet.
    pub(crate) fn active(&self) -> usize {
        self.inner
            .lock()
            .handles
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    pub(crate) fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        for handle in inner.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One task per currency code, reconciled against the latest code set.
#[derive(Default)]
pub(crate) struct KeyedTasks {
    tasks: HashMap<CurrencyCode, JoinHandle<()>>,
}

impl KeyedTasks {
    /// Aborts tasks whose code left the set and starts `spawn` for codes
    /// that joined it. Codes present before and after keep their entry,
    /// even when the task already ended: a subscription that failed stays
    /// stopped until its code leaves the set and comes back.
    pub(crate) fn reconcile<F>(&mut self, codes: &BTreeSet<CurrencyCode>, mut spawn: F)
    where
        F: FnMut(&CurrencyCode) -> JoinHandle<()>,
    {
        self.tasks.retain(|code, handle| {
            let keep = codes.contains(code);
            if !keep {
                handle.abort();
            }
            keep
        });

        for code in codes {
            if !self.tasks.contains_key(code) {
                self.tasks.insert(code.clone(), spawn(code));
            }
        }
    }

    /// Waits until every task has ended on its own.
    pub(crate) async fn join(&mut self) {
        for handle in self.tasks.values_mut() {
            let _ = handle.await;
        }
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> BTreeSet<CurrencyCode> {
        self.tasks.keys().cloned().collect()
    }
}

impl Drop for KeyedTasks {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn codes(list: &[&str]) -> BTreeSet<CurrencyCode> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn reconcile_keeps_unchanged_keys() {
        let started = Arc::new(AtomicUsize::new(0));
        let mut tasks = KeyedTasks::default();
        let spawn = |_: &CurrencyCode| {
            started.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(std::future::pending::<()>())
        };

        tasks.reconcile(&codes(&["btc", "eth"]), spawn);
        assert_eq!(started.load(Ordering::SeqCst), 2);

        tasks.reconcile(&codes(&["btc", "bch"]), |_| {
            started.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(std::future::pending::<()>())
        });
        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.keys(), codes(&["bch", "btc"]));
    }

    #[tokio::test]
    async fn reconcile_does_not_restart_finished_tasks() {
        let started = Arc::new(AtomicUsize::new(0));
        let mut tasks = KeyedTasks::default();
        let spawn = |_: &CurrencyCode| {
            started.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async {})
        };

        tasks.reconcile(&codes(&["btc"]), spawn);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        tasks.reconcile(&codes(&["btc", "eth"]), spawn);
        assert_eq!(started.load(Ordering::SeqCst), 2);

        // Leaving and rejoining the set starts a fresh task.
        tasks.reconcile(&codes(&["eth"]), spawn);
        tasks.reconcile(&codes(&["btc", "eth"]), spawn);
        assert_eq!(started.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn registry_shutdown_aborts_tasks() {
        let registry = TaskRegistry::new(Handle::current());
        assert!(registry.spawn(std::future::pending()));
        assert!(registry.spawn(std::future::pending()));
        assert_eq!(registry.active(), 2);

        registry.shutdown();
        assert_eq!(registry.active(), 0);
        assert!(!registry.spawn(async {}));
    }

    #[tokio::test]
    async fn finished_tasks_are_pruned() {
        let registry = TaskRegistry::new(Handle::current());
        for _ in 0..10 {
            registry.spawn(async {});
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        registry.spawn(std::future::pending());
        assert_eq!(registry.inner.lock().handles.len(), 1);
    }
}
