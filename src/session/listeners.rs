//! Live-recording observers
//!
//! Each listener is registered under a [`SubscriptionId`] that doubles as its
//! disposer. A listener that fails, by returning an error or by panicking, is
//! logged and skipped; the other listeners and the recorder keep going.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{error, warn};

use super::types::SessionEvent;

/// Callback invoked once per appended event
pub type EventListener = Box<dyn FnMut(&SessionEvent) -> anyhow::Result<()>>;

/// Token returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Registry of event listeners, notified in subscription order
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: BTreeMap<SubscriptionId, EventListener>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) -> anyhow::Result<()> + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Notify every listener of one event
    pub fn notify(&mut self, event: &SessionEvent) {
        for (id, listener) in self.listeners.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        "Listener {:?} failed on event {} ({}): {:#}",
                        id,
                        event.id,
                        event.kind.name(),
                        e
                    );
                }
                Err(_) => {
                    error!(
                        "Listener {:?} panicked on event {} ({})",
                        id,
                        event.id,
                        event.kind.name()
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event(id: &str) -> SessionEvent {
        SessionEvent::new(id, 0, EventKind::SessionStart)
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut registry = ListenerRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let id = registry.subscribe(move |e| {
            sink.borrow_mut().push(e.id.clone());
            Ok(())
        });
        assert_eq!(registry.len(), 1);

        registry.notify(&event("a"));
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.notify(&event("b"));

        assert_eq!(*seen.borrow(), vec!["a".to_string()]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failing_listeners_are_isolated() {
        let mut registry = ListenerRegistry::new();
        let count = Rc::new(RefCell::new(0));

        registry.subscribe(|_| anyhow::bail!("renderer detached"));
        registry.subscribe(|_| panic!("observer bug"));
        let counter = Rc::clone(&count);
        registry.subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        registry.notify(&event("a"));
        registry.notify(&event("b"));

        assert_eq!(*count.borrow(), 2);
        assert_eq!(registry.len(), 3);
    }
}
