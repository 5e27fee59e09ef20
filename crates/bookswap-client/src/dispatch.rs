//! Handler list for inbound server events.
//!
//! Handlers run in registration order on the connection task. The list is
//! snapshotted under a short lock and called with the lock released, so a
//! handler may subscribe or unsubscribe without deadlocking.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use bookswap_common::{ClientError, ServerEvent};

/// A registered event handler.
pub type Handler = Arc<dyn Fn(&ServerEvent) -> Result<(), ClientError> + Send + Sync>;

#[derive(Default)]
struct HandlerList {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

#[derive(Clone, Default)]
pub(crate) struct Dispatcher {
    inner: Arc<Mutex<HandlerList>>,
}

impl Dispatcher {
    fn lock(&self) -> MutexGuard<'_, HandlerList> {
        // Handlers never run under this lock, so poisoning only follows a
        // panic inside the list bookkeeping itself.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn add<F>(&self, handler: F) -> u64
    where
        F: Fn(&ServerEvent) -> Result<(), ClientError> + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let mut list = self.lock();
        let id = list.next_id;
        list.next_id += 1;
        list.handlers.push((id, handler));
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let mut list = self.lock();
        let before = list.handlers.len();
        list.handlers.retain(|(hid, _)| *hid != id);
        list.handlers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().handlers.len()
    }

    /// Deliver `event` to every handler. Returns how many completed
    /// without error.
    pub(crate) fn dispatch(&self, event: &ServerEvent) -> usize {
        let snapshot: Vec<Handler> = self
            .lock()
            .handlers
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        let mut ok = 0;
        for handler in snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => ok += 1,
                Ok(Err(e)) => warn!(event = event.kind(), error = %e, "Event handler failed"),
                Err(_) => warn!(event = event.kind(), "Event handler panicked"),
            }
        }
        debug!(event = event.kind(), handled = ok, "Dispatched server event");
        ok
    }
}

/// Registration returned by [`ChatClient::subscribe`](crate::ChatClient::subscribe).
///
/// Dropping it leaves the handler registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    id: u64,
    dispatcher: Dispatcher,
}

impl Subscription {
    pub(crate) fn new(id: u64, dispatcher: Dispatcher) -> Self {
        Self { id, dispatcher }
    }

    pub fn unsubscribe(self) {
        self.dispatcher.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookswap_common::SessionId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> ServerEvent {
        ServerEvent::user_left(SessionId::from("user-1-abcde"))
    }

    fn recorder(
        log: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
    ) -> impl Fn(&ServerEvent) -> Result<(), ClientError> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_| {
            log.lock().unwrap().push(name);
            Ok(())
        }
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let dispatcher = Dispatcher::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.add(recorder(&log, "first"));
        dispatcher.add(recorder(&log, "second"));
        dispatcher.add(recorder(&log, "third"));

        assert_eq!(dispatcher.dispatch(&sample()), 3);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn failing_handler_does_not_stop_others() {
        let dispatcher = Dispatcher::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        dispatcher.add(|_| Err(ClientError::Handler("boom".into())));
        dispatcher.add(recorder(&log, "after-error"));
        dispatcher.add(|_| panic!("handler panic"));
        dispatcher.add(recorder(&log, "after-panic"));

        assert_eq!(dispatcher.dispatch(&sample()), 2);
        assert_eq!(*log.lock().unwrap(), vec!["after-error", "after-panic"]);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let dispatcher = Dispatcher::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let id = dispatcher.add(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let sub = Subscription::new(id, dispatcher.clone());

        dispatcher.dispatch(&sample());
        sub.unsubscribe();
        dispatcher.dispatch(&sample());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.len(), 0);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let dispatcher = Dispatcher::default();
        dispatcher.add(|_| Ok(()));
        assert!(!dispatcher.remove(42));
        assert_eq!(dispatcher.len(), 1);
    }

    #[test]
    fn handler_may_subscribe_during_dispatch() {
        let dispatcher = Dispatcher::default();
        let inner = dispatcher.clone();
        dispatcher.add(move |_| {
            inner.add(|_| Ok(()));
            Ok(())
        });

        // The new handler joins for the next event, not this one.
        assert_eq!(dispatcher.dispatch(&sample()), 1);
        assert_eq!(dispatcher.len(), 2);
    }
}
