//! Synchronous handler registry.
//!
//! Handlers are invoked in registration order on the thread that performed
//! the mutation. Each notification pass snapshots the handler list before
//! calling anything, so a handler that unsubscribes (itself or another
//! handler) only affects later passes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crossbeam_channel::{bounded, Sender, TrySendError};

use super::events::{ChangeEvent, SubscriptionId};
use super::stream::ChangeStream;

type Handler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

struct HandlerEntry {
    id: SubscriptionId,
    event: String,
    handler: Handler,
}

struct StreamEntry {
    id: SubscriptionId,
    tx: Sender<ChangeEvent>,
}

/// Handlers and streams registered on one store.
#[derive(Default)]
pub(crate) struct Listeners {
    handlers: Mutex<Vec<HandlerEntry>>,
    streams: Mutex<Vec<StreamEntry>>,
    dropped_events: AtomicU64,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("handlers", &self.handler_count())
            .field("streams", &self.stream_count())
            .field("dropped_events", &self.dropped_events())
            .finish()
    }
}

impl Listeners {
    pub(crate) fn subscribe<F>(self: &Arc<Self>, event: &str, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push(HandlerEntry {
                id,
                event: event.to_string(),
                handler: Arc::new(handler),
            });
        }
        Subscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    pub(crate) fn watch(self: &Arc<Self>, capacity: usize) -> ChangeStream {
        let id = SubscriptionId::new();
        let (tx, rx) = bounded(capacity.max(1));
        if let Ok(mut streams) = self.streams.lock() {
            streams.push(StreamEntry { id, tx });
        }
        ChangeStream::new(id, rx, Arc::downgrade(self))
    }

    pub(crate) fn remove_handler(&self, id: SubscriptionId) -> bool {
        let Ok(mut handlers) = self.handlers.lock() else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|entry| entry.id != id);
        handlers.len() != before
    }

    pub(crate) fn remove_stream(&self, id: SubscriptionId) {
        if let Ok(mut streams) = self.streams.lock() {
            streams.retain(|entry| entry.id != id);
        }
    }

    /// Deliver `change` to every handler registered for `event`, then to
    /// every open stream.
    pub(crate) fn emit(&self, event: &str, change: &ChangeEvent) {
        let snapshot: Vec<Handler> = match self.handlers.lock() {
            Ok(handlers) => handlers
                .iter()
                .filter(|entry| entry.event == event)
                .map(|entry| Arc::clone(&entry.handler))
                .collect(),
            Err(_) => {
                tracing::warn!("change handlers lock poisoned; skipping notification");
                Vec::new()
            }
        };

        for handler in snapshot {
            handler(change);
        }

        if let Ok(mut streams) = self.streams.lock() {
            streams.retain(|entry| match entry.tx.try_send(change.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    self.dropped_events.fetch_add(1, Ordering::Relaxed);
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
        }
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.handlers.lock().map(|h| h.len()).unwrap_or(0)
    }

    pub(crate) fn stream_count(&self) -> usize {
        self.streams.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub(crate) fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping the handle keeps the handler registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "dropping a Subscription does not unsubscribe; keep it to call unsubscribe()"]
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// The id backing this subscription.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Deregister the handler. Idempotent.
    ///
    /// Returns true if this call removed the handler.
    pub fn unsubscribe(&self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|listeners| listeners.remove_handler(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::events::{ChangeKind, CHANGE_EVENT};
    use std::sync::Mutex as StdMutex;

    fn change(id: &str) -> ChangeEvent {
        ChangeEvent::new("test", ChangeKind::Created, id)
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let listeners = Arc::new(Listeners::default());
        let log = Arc::new(StdMutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            let _sub = listeners.subscribe(CHANGE_EVENT, move |_| log.lock().unwrap().push(name));
        }

        listeners.emit(CHANGE_EVENT, &change("r1"));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_other_event_names_are_not_invoked() {
        let listeners = Arc::new(Listeners::default());
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        let _sub = listeners.subscribe("delete", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        listeners.emit(CHANGE_EVENT, &change("r1"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let listeners = Arc::new(Listeners::default());
        let sub = listeners.subscribe(CHANGE_EVENT, |_| {});

        assert_eq!(listeners.handler_count(), 1);
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert_eq!(listeners.handler_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_pass_keeps_snapshot() {
        let listeners = Arc::new(Listeners::default());
        let log = Arc::new(StdMutex::new(Vec::new()));
        let second: Arc<StdMutex<Option<Subscription>>> = Arc::new(StdMutex::new(None));

        let first = {
            let log = Arc::clone(&log);
            let second = Arc::clone(&second);
            listeners.subscribe(CHANGE_EVENT, move |_| {
                log.lock().unwrap().push("first");
                if let Some(sub) = second.lock().unwrap().as_ref() {
                    sub.unsubscribe();
                }
            })
        };
        let sub2 = {
            let log = Arc::clone(&log);
            listeners.subscribe(CHANGE_EVENT, move |_| log.lock().unwrap().push("second"))
        };
        *second.lock().unwrap() = Some(sub2);

        // "second" was in the snapshot, so it still runs this pass.
        listeners.emit(CHANGE_EVENT, &change("r1"));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);

        listeners.emit(CHANGE_EVENT, &change("r2"));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "first"]);
        first.unsubscribe();
    }

    #[test]
    fn test_full_stream_counts_dropped_events() {
        let listeners = Arc::new(Listeners::default());
        let stream = listeners.watch(1);

        listeners.emit(CHANGE_EVENT, &change("r1"));
        listeners.emit(CHANGE_EVENT, &change("r2"));

        assert_eq!(listeners.dropped_events(), 1);
        assert_eq!(stream.try_recv().map(|e| e.record_id), Some("r1".to_string()));
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_unsubscribe_after_listeners_dropped() {
        let listeners = Arc::new(Listeners::default());
        let sub = listeners.subscribe(CHANGE_EVENT, |_| {});
        drop(listeners);
        assert!(!sub.unsubscribe());
    }
}
